//! # deckforge-store
//!
//! Local persisted storage for decks, backed by SQLite.
//!
//! The store is a small key/value table.  Deck blobs are written as JSON text
//! under `deck:{id}` next to a marker recording which deck was written last.
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection`.

pub mod database;
pub mod decks;
pub mod kv;
pub mod migrations;
pub mod models;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
