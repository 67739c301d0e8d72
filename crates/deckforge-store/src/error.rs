use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Could not determine application data directory")]
    NoDataDir,

    #[error("Could not create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Migration v{version:03} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// The deck could not be encoded for storage.
    #[error("Could not encode deck: {0}")]
    Encode(#[from] serde_json::Error),

    /// A stored blob no longer decodes as a deck.
    #[error("Stored deck {deck_id} is corrupt: {source}")]
    CorruptBlob {
        deck_id: String,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
