//! Deck blob CRUD on top of the key/value table.
//!
//! Writing a blob also moves the active-deck marker to that deck, in the same
//! transaction, so the marker always names the deck whose blob was written
//! last.

use deckforge_shared::constants::{ACTIVE_DECK_KEY, DECK_KEY_PREFIX};
use deckforge_shared::DeckId;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{DeckSummary, PersistedDeckBlob};

fn deck_key(deck_id: &DeckId) -> String {
    format!("{DECK_KEY_PREFIX}{deck_id}")
}

impl Database {
    pub fn save_deck_blob(&self, deck_id: &DeckId, blob: &PersistedDeckBlob) -> Result<()> {
        let json = serde_json::to_string(blob)?;
        let now = chrono::Utc::now().to_rfc3339();

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![deck_key(deck_id), json, now],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![ACTIVE_DECK_KEY, deck_id.as_str(), now],
        )?;
        tx.commit()?;

        tracing::debug!(
            deck = %deck_id,
            slides = blob.slides.len(),
            bytes = json.len(),
            "deck blob written"
        );
        Ok(())
    }

    /// Read the stored blob for `deck_id`, regardless of the active marker.
    pub fn load_deck_blob(&self, deck_id: &DeckId) -> Result<Option<PersistedDeckBlob>> {
        match self.get_value(&deck_key(deck_id))? {
            Some(json) => serde_json::from_str(&json).map(Some).map_err(|source| {
                StoreError::CorruptBlob {
                    deck_id: deck_id.to_string(),
                    source,
                }
            }),
            None => Ok(None),
        }
    }

    /// The deck whose blob was written most recently, if any.
    pub fn active_deck(&self) -> Result<Option<DeckId>> {
        Ok(self
            .get_value(ACTIVE_DECK_KEY)?
            .and_then(|raw| DeckId::parse(&raw).ok()))
    }

    pub fn list_decks(&self) -> Result<Vec<DeckSummary>> {
        let decks = self
            .keys_with_prefix(DECK_KEY_PREFIX)?
            .into_iter()
            .filter_map(|(key, updated_at)| {
                let id = key.strip_prefix(DECK_KEY_PREFIX)?;
                DeckId::parse(id)
                    .ok()
                    .map(|deck_id| DeckSummary { deck_id, updated_at })
            })
            .collect();
        Ok(decks)
    }

    // Clears the active marker too when it pointed at this deck
    pub fn delete_deck(&self, deck_id: &DeckId) -> Result<bool> {
        let removed = self.delete_value(&deck_key(deck_id))?;
        if self.active_deck()?.as_ref() == Some(deck_id) {
            self.delete_value(ACTIVE_DECK_KEY)?;
        }
        Ok(removed)
    }
}
