//! The edit session for one open deck.
//!
//! [`EditSession`] ties the slide store, history, theme, speaker notes and
//! notices together and publishes every change on the [`EventBus`]. Each
//! successful slide mutation records exactly one history snapshot; navigation,
//! theme and note changes never do.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use deckforge_shared::constants::{BLOB_VERSION, DEFAULT_HISTORY_LIMIT};
use deckforge_shared::{DeckId, DesignSettings, SlideRecord};
use deckforge_store::{DeckMetadata, PersistedDeckBlob};
use tracing::{debug, info};

use crate::design::DesignSettingsStore;
use crate::error::EditError;
use crate::events::{EngineEvent, EventBus};
use crate::history::HistoryManager;
use crate::layout::{Composition, FieldBinding, LayoutRegistry, RenderMode};
use crate::notices::{NoticeBoard, NoticeKind};
use crate::slides::{DeckState, SlideEdit, SlideKey, SlideStore};

/// The session as shared between the facade and background tasks.
pub type SharedSession = Arc<Mutex<EditSession>>;

/// Lock the shared session. A panic while holding the lock leaves the
/// session in a consistent state (every mutation is a single call), so a
/// poisoned lock is recovered rather than propagated.
pub fn lock_session(session: &SharedSession) -> MutexGuard<'_, EditSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read-only view handed to exporters.
#[derive(Debug, Clone, Copy)]
pub struct ExportSource<'a> {
    pub slides: &'a [SlideRecord],
    pub design_settings: &'a DesignSettings,
}

pub struct EditSession {
    deck_id: DeckId,
    slides: SlideStore,
    history: HistoryManager,
    design: DesignSettingsStore,
    /// Keyed by slide identity so undo/redo of structural edits keeps every
    /// note on its slide. Notes of deleted slides stay until the deck is
    /// replaced, so undoing the delete brings them back.
    notes: BTreeMap<SlideKey, String>,
    layouts: Arc<LayoutRegistry>,
    notices: NoticeBoard,
    bus: EventBus,
}

impl EditSession {
    /// A session holding one default slide and default theme.
    pub fn new(deck_id: DeckId, bus: EventBus) -> Self {
        Self::with_options(deck_id, bus, Arc::new(LayoutRegistry::builtin()), DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_options(
        deck_id: DeckId,
        bus: EventBus,
        layouts: Arc<LayoutRegistry>,
        history_limit: usize,
    ) -> Self {
        let slides = SlideStore::new();
        let history = HistoryManager::with_limit(slides.snapshot(), history_limit);
        bus.emit(EngineEvent::DeckOpened {
            deck_id: deck_id.clone(),
        });
        Self {
            deck_id,
            slides,
            history,
            design: DesignSettingsStore::default(),
            notes: BTreeMap::new(),
            layouts,
            notices: NoticeBoard::new(bus.clone()),
            bus,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn deck_id(&self) -> &DeckId {
        &self.deck_id
    }

    pub fn slides(&self) -> &[SlideRecord] {
        self.slides.slides()
    }

    pub fn current_index(&self) -> usize {
        self.slides.current_index()
    }

    pub fn deck_state(&self) -> DeckState {
        self.slides.snapshot()
    }

    pub fn design(&self) -> &DesignSettings {
        self.design.settings()
    }

    /// Notes of the current slides by position.
    pub fn notes(&self) -> BTreeMap<usize, String> {
        self.slides
            .keys()
            .iter()
            .enumerate()
            .filter_map(|(i, key)| self.notes.get(key).map(|n| (i, n.clone())))
            .collect()
    }

    pub fn note(&self, index: usize) -> Option<&str> {
        let key = self.slides.key_at(index)?;
        self.notes.get(&key).map(String::as_str)
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn export_source(&self) -> ExportSource<'_> {
        ExportSource {
            slides: self.slides.slides(),
            design_settings: self.design.settings(),
        }
    }

    // -- slide mutations ----------------------------------------------------

    pub fn replace_all(&mut self, new_slides: Vec<SlideRecord>) -> Result<(), EditError> {
        let count = new_slides.len();
        if let Err(e) = self.slides.replace_all(new_slides) {
            self.reject(&e);
            return Err(e);
        }
        self.notes.clear();
        info!(deck = %self.deck_id, slides = count, "deck replaced");
        self.commit();
        Ok(())
    }

    /// Out-of-range indices are ignored and return `false`.
    pub fn update_field(&mut self, index: usize, edit: SlideEdit) -> bool {
        if !self.slides.update_field(index, edit) {
            return false;
        }
        self.commit();
        true
    }

    /// Feed edited HTML from a rendered region back into its slide field.
    pub fn apply_region_edit(&mut self, binding: FieldBinding, html: impl Into<String>) -> bool {
        self.update_field(binding.slide_index, SlideEdit::text(binding.field, html))
    }

    pub fn add_slide(&mut self) -> usize {
        let index = self.slides.add_slide();
        debug!(deck = %self.deck_id, index, "slide added");
        self.commit();
        index
    }

    pub fn delete_slide(&mut self, index: usize) -> Result<(), EditError> {
        match self.slides.delete_slide(index) {
            Ok(_) => {
                debug!(deck = %self.deck_id, index, remaining = self.slides.len(), "slide deleted");
                self.commit();
                Ok(())
            }
            Err(e) => {
                self.reject(&e);
                Err(e)
            }
        }
    }

    pub fn duplicate_slide(&mut self, index: usize) -> Result<usize, EditError> {
        match self.slides.duplicate_slide(index) {
            Ok(new_index) => {
                self.commit();
                Ok(new_index)
            }
            Err(e) => {
                self.reject(&e);
                Err(e)
            }
        }
    }

    /// Navigation only, no history snapshot.
    pub fn set_current_slide(&mut self, index: usize) -> bool {
        if !self.slides.set_current_slide(index) {
            return false;
        }
        self.bus.emit(EngineEvent::CurrentSlideChanged {
            deck_id: self.deck_id.clone(),
            index,
        });
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(state) => {
                self.adopt(state);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(state) => {
                self.adopt(state);
                true
            }
            None => false,
        }
    }

    // -- theme and notes ----------------------------------------------------

    /// Apply theme setters. Theme changes are not part of undo history.
    pub fn edit_design(&mut self, f: impl FnOnce(&mut DesignSettingsStore)) {
        f(&mut self.design);
        self.bus.emit(EngineEvent::DesignChanged {
            deck_id: self.deck_id.clone(),
        });
    }

    /// Set the speaker note for a slide; empty text removes it.
    ///
    /// Returns `false` only for a missing slide. Nothing is published when
    /// the note already had this value.
    pub fn set_note(&mut self, index: usize, text: impl Into<String>) -> bool {
        let Some(key) = self.slides.key_at(index) else {
            return false;
        };
        let text = text.into();
        let changed = if text.trim().is_empty() {
            self.notes.remove(&key).is_some()
        } else if self.notes.get(&key) == Some(&text) {
            false
        } else {
            self.notes.insert(key, text);
            true
        };
        if !changed {
            return true;
        }
        self.bus.emit(EngineEvent::NotesChanged {
            deck_id: self.deck_id.clone(),
        });
        true
    }

    // -- rendering ----------------------------------------------------------

    pub fn render(&self, index: usize, mode: RenderMode) -> Option<Composition> {
        let slide = self.slides.get(index)?;
        Some(self.layouts.render(slide, index, self.design.settings(), mode))
    }

    pub fn render_current(&self, mode: RenderMode) -> Option<Composition> {
        self.render(self.slides.current_index(), mode)
    }

    // -- persistence --------------------------------------------------------

    /// Serializable copy of the live state.
    pub fn to_blob(&self) -> PersistedDeckBlob {
        let slides = self.slides.slides().to_vec();
        let slide_notes = self.notes();
        PersistedDeckBlob {
            metadata: DeckMetadata {
                total_slides: slides.len(),
                current_slide: self.slides.current_index(),
                last_modified: Utc::now(),
                version: BLOB_VERSION.to_string(),
            },
            slides,
            design_settings: self.design.settings().clone(),
            slide_notes,
        }
    }

    /// Adopt a previously saved blob and restart history from it.
    ///
    /// Returns `false` when the blob has no slides; the session is unchanged.
    pub fn restore_blob(&mut self, blob: PersistedDeckBlob) -> bool {
        if blob.slides.is_empty() {
            return false;
        }
        self.slides = SlideStore::from_state(DeckState::new(
            blob.slides,
            blob.metadata.current_slide,
        ));
        let len = self.slides.len();
        self.design.replace(blob.design_settings);
        let slides = &self.slides;
        self.notes = blob
            .slide_notes
            .into_iter()
            .filter_map(|(i, note)| slides.key_at(i).map(|key| (key, note)))
            .collect();
        self.history.reset(self.slides.snapshot());

        info!(deck = %self.deck_id, slides = len, "deck restored from store");
        self.bus.emit(EngineEvent::DeckOpened {
            deck_id: self.deck_id.clone(),
        });
        true
    }

    // -- internals ----------------------------------------------------------

    fn commit(&mut self) {
        self.history.record(self.slides.snapshot());
        self.bus.emit(EngineEvent::DeckChanged {
            deck_id: self.deck_id.clone(),
            slides: self.slides.len(),
        });
        self.emit_history();
    }

    fn adopt(&mut self, state: DeckState) {
        self.slides.restore(state);
        self.bus.emit(EngineEvent::DeckChanged {
            deck_id: self.deck_id.clone(),
            slides: self.slides.len(),
        });
        self.emit_history();
    }

    fn emit_history(&self) {
        self.bus.emit(EngineEvent::HistoryMoved {
            deck_id: self.deck_id.clone(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn reject(&mut self, error: &EditError) {
        match error {
            EditError::LastSlide | EditError::EmptyDeck => {
                self.notices
                    .raise(NoticeKind::Validation, error.to_string(), None);
            }
            EditError::IndexOutOfRange { .. } => {
                debug!(deck = %self.deck_id, %error, "edit ignored");
            }
        }
    }
}
