use thiserror::Error;

/// A line typed at the prompt that could not be turned into a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a slide number: {0}")]
    BadSlide(String),

    #[error("Not a number: {0}")]
    BadNumber(String),

    #[error("Unknown theme setting: {0}")]
    UnknownSetting(String),

    #[error("Unknown transition: {0}")]
    UnknownTransition(String),

    #[error(transparent)]
    Deck(#[from] deckforge_shared::DeckError),
}
