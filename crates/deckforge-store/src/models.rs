//! Persisted blob structs.
//!
//! Every struct derives `Serialize` and `Deserialize`; the JSON shape uses
//! camelCase keys so a blob written by the web editor restores unchanged.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use deckforge_shared::{DeckId, DesignSettings, SlideRecord};

/// Serialized snapshot of one deck: slides, theme, notes and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDeckBlob {
    pub slides: Vec<SlideRecord>,
    pub design_settings: DesignSettings,
    /// Speaker notes keyed by slide position.
    #[serde(default)]
    pub slide_notes: BTreeMap<usize, String>,
    pub metadata: DeckMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeckMetadata {
    pub total_slides: usize,
    pub current_slide: usize,
    pub last_modified: DateTime<Utc>,
    pub version: String,
}

/// One row of [`Database::list_decks`](crate::Database::list_decks).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckSummary {
    pub deck_id: DeckId,
    pub updated_at: DateTime<Utc>,
}
