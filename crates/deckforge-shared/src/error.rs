use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid layout id: {0}")]
    InvalidLayout(String),

    #[error("Invalid deck id: {0}")]
    InvalidDeckId(String),
}
