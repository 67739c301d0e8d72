//! Linear undo/redo log of deck snapshots.
//!
//! Recording while the cursor is not at the end discards every entry after
//! the cursor first. Entries are owned copies and are never mutated after
//! being recorded; `undo`/`redo` hand out clones.

use deckforge_shared::constants::DEFAULT_HISTORY_LIMIT;

use crate::slides::DeckState;

#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: Vec<DeckState>,
    cursor: usize,
    limit: usize,
}

impl HistoryManager {
    pub fn new(initial: DeckState) -> Self {
        Self::with_limit(initial, DEFAULT_HISTORY_LIMIT)
    }

    /// `limit` is clamped to at least 1.
    pub fn with_limit(initial: DeckState, limit: usize) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Drop all entries and start over from `initial`.
    pub fn reset(&mut self, initial: DeckState) {
        self.entries.clear();
        self.entries.push(initial);
        self.cursor = 0;
    }

    pub fn record(&mut self, snapshot: DeckState) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);

        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.cursor = self.entries.len() - 1;
    }

    pub fn undo(&mut self) -> Option<DeckState> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn redo(&mut self) -> Option<DeckState> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&DeckState> {
        self.entries.get(self.cursor)
    }
}
