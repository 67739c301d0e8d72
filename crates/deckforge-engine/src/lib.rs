//! # deckforge-engine
//!
//! Slide-deck editing engine: an ordered slide collection with pluggable
//! layouts, linear undo/redo, theme settings, debounced autosave to the
//! local store and an Edit/Present switch around an external renderer.
//!
//! [`DeckEngine`] is the entry point; the individual stores are public so UI
//! layers can also drive an [`EditSession`] directly.

pub mod config;
pub mod design;
pub mod engine;
pub mod events;
pub mod generation;
pub mod history;
pub mod layout;
pub mod notices;
pub mod persistence;
pub mod presentation;
pub mod slides;
pub mod state;

mod error;

pub use config::EngineConfig;
pub use engine::DeckEngine;
pub use error::{EditError, EngineError, GenerationError, PresentError, Result};
pub use events::{EngineEvent, EventBus};
pub use notices::{Notice, NoticeKind, RetryAction};
pub use presentation::{PresentOutcome, PresentationMode};
pub use slides::{DeckState, SlideEdit};
pub use state::{EditSession, SharedSession};
