//! Data model and constants shared by every deckforge crate.

pub mod constants;
pub mod error;
pub mod protocol;
pub mod types;

pub use error::DeckError;
pub use types::{DeckId, DesignSettings, LayoutId, RichText, SlideRecord, TransitionKind};
