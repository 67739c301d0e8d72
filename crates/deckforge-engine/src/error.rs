use deckforge_store::StoreError;
use thiserror::Error;

/// Rejected slide edits. None of these mutate the deck.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("A deck must keep at least one slide")]
    LastSlide,

    #[error("Slide index {index} out of range (deck has {len} slides)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Cannot replace the deck with zero slides")]
    EmptyDeck,
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Slide generation is not configured")]
    NotConfigured,

    #[error("Generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Generation service answered {0}")]
    Status(reqwest::StatusCode),

    #[error("Generation returned no slides")]
    Empty,

    #[error("Malformed generation response: {0}")]
    Malformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresentError {
    #[error("Cannot present an empty deck")]
    EmptyDeck,

    #[error("Presentation engine failed to start: {0}")]
    Init(String),
}

/// Top-level error for [`DeckEngine`](crate::DeckEngine) operations.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Present(#[from] PresentError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No notice with id {0}")]
    UnknownNotice(u64),
}

pub type Result<T> = std::result::Result<T, EngineError>;
