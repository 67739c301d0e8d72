//! The ordered slide collection and the active-slide cursor.

use deckforge_shared::{LayoutId, RichText, SlideRecord, TransitionKind};

use crate::error::EditError;
use crate::layout::SlideField;

/// Identity of a slide within one session. Survives reordering, and undo
/// brings back a deleted slide with its old key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlideKey(u64);

/// Slides plus the index being viewed. This is what history snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckState {
    pub slides: Vec<SlideRecord>,
    pub current_slide_index: usize,
    /// One per slide. A state whose keys do not line up with its slides
    /// gets fresh keys when adopted.
    pub keys: Vec<SlideKey>,
}

impl DeckState {
    /// A state without keys yet, e.g. read from the store.
    pub fn new(slides: Vec<SlideRecord>, current_slide_index: usize) -> Self {
        Self {
            slides,
            current_slide_index,
            keys: Vec::new(),
        }
    }

    pub fn single_default() -> Self {
        Self::new(vec![SlideRecord::default()], 0)
    }
}

/// One field update on one slide.
#[derive(Debug, Clone, PartialEq)]
pub enum SlideEdit {
    Title(RichText),
    Content(RichText),
    SecondaryContent(RichText),
    Layout(LayoutId),
    Background(Option<String>),
    Transition(Option<TransitionKind>),
    FontFamily(Option<String>),
}

impl SlideEdit {
    pub fn text(field: SlideField, html: impl Into<RichText>) -> Self {
        let html = html.into();
        match field {
            SlideField::Title => SlideEdit::Title(html),
            SlideField::Content => SlideEdit::Content(html),
            SlideField::SecondaryContent => SlideEdit::SecondaryContent(html),
        }
    }

    fn apply(self, slide: &mut SlideRecord) {
        match self {
            SlideEdit::Title(v) => slide.title = v,
            SlideEdit::Content(v) => slide.content = v,
            SlideEdit::SecondaryContent(v) => slide.secondary_content = v,
            SlideEdit::Layout(v) => slide.layout = v,
            SlideEdit::Background(v) => slide.background = v,
            SlideEdit::Transition(v) => slide.transition = v,
            SlideEdit::FontFamily(v) => slide.font_family = v,
        }
    }
}

/// Owns the slide records. `current` is always a valid index and the deck
/// never drops below one slide.
#[derive(Debug, Clone)]
pub struct SlideStore {
    slides: Vec<SlideRecord>,
    keys: Vec<SlideKey>,
    current: usize,
    next_key: u64,
}

impl SlideStore {
    /// A deck holding one default slide.
    pub fn new() -> Self {
        Self::from_state(DeckState::single_default())
    }

    /// Adopt a state, clamping the cursor. An empty state becomes one default slide.
    pub fn from_state(state: DeckState) -> Self {
        let mut store = Self {
            slides: Vec::new(),
            keys: Vec::new(),
            current: 0,
            next_key: 0,
        };
        store.restore(state);
        store
    }

    pub fn slides(&self) -> &[SlideRecord] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_slide(&self) -> Option<&SlideRecord> {
        self.slides.get(self.current)
    }

    pub fn get(&self, index: usize) -> Option<&SlideRecord> {
        self.slides.get(index)
    }

    pub fn keys(&self) -> &[SlideKey] {
        &self.keys
    }

    pub fn key_at(&self, index: usize) -> Option<SlideKey> {
        self.keys.get(index).copied()
    }

    fn mint_key(&mut self) -> SlideKey {
        let key = SlideKey(self.next_key);
        self.next_key += 1;
        key
    }

    /// Owned copy for history; never shares storage with the live slides.
    pub fn snapshot(&self) -> DeckState {
        DeckState {
            slides: self.slides.clone(),
            current_slide_index: self.current,
            keys: self.keys.clone(),
        }
    }

    /// Replace the whole state with `state` (undo/redo/restore).
    pub fn restore(&mut self, state: DeckState) {
        let DeckState {
            mut slides,
            current_slide_index,
            keys,
        } = state;
        if slides.is_empty() {
            tracing::warn!("refusing to adopt an empty deck state, seeding a default slide");
            slides.push(SlideRecord::default());
        }

        let keys = if keys.len() == slides.len() {
            if let Some(max) = keys.iter().max() {
                self.next_key = self.next_key.max(max.0 + 1);
            }
            keys
        } else {
            (0..slides.len()).map(|_| self.mint_key()).collect()
        };

        self.current = current_slide_index.min(slides.len() - 1);
        self.slides = slides;
        self.keys = keys;
    }

    pub fn replace_all(&mut self, new_slides: Vec<SlideRecord>) -> Result<(), EditError> {
        if new_slides.is_empty() {
            return Err(EditError::EmptyDeck);
        }
        self.keys = (0..new_slides.len()).map(|_| self.mint_key()).collect();
        self.slides = new_slides;
        self.current = 0;
        Ok(())
    }

    /// Returns `false` (and changes nothing) when `index` is out of range.
    pub fn update_field(&mut self, index: usize, edit: SlideEdit) -> bool {
        match self.slides.get_mut(index) {
            Some(slide) => {
                edit.apply(slide);
                true
            }
            None => {
                tracing::debug!(index, len = self.slides.len(), "update for missing slide ignored");
                false
            }
        }
    }

    /// Append a default slide and move to it. Returns its index.
    pub fn add_slide(&mut self) -> usize {
        let key = self.mint_key();
        self.slides.push(SlideRecord::default());
        self.keys.push(key);
        self.current = self.slides.len() - 1;
        self.current
    }

    pub fn delete_slide(&mut self, index: usize) -> Result<SlideRecord, EditError> {
        let len = self.slides.len();
        if index >= len {
            return Err(EditError::IndexOutOfRange { index, len });
        }
        if len <= 1 {
            return Err(EditError::LastSlide);
        }

        let removed = self.slides.remove(index);
        self.keys.remove(index);
        // keep the same slide in view when an earlier one goes away
        if index < self.current {
            self.current -= 1;
        }
        self.current = self.current.min(self.slides.len() - 1);
        Ok(removed)
    }

    /// Insert a copy right after `index`. The cursor stays where it was.
    pub fn duplicate_slide(&mut self, index: usize) -> Result<usize, EditError> {
        let copy = self
            .slides
            .get(index)
            .cloned()
            .ok_or(EditError::IndexOutOfRange {
                index,
                len: self.slides.len(),
            })?;
        let key = self.mint_key();
        self.slides.insert(index + 1, copy);
        self.keys.insert(index + 1, key);
        Ok(index + 1)
    }

    /// Navigation only. Returns `false` for an out-of-range index.
    pub fn set_current_slide(&mut self, index: usize) -> bool {
        if index < self.slides.len() {
            self.current = index;
            true
        } else {
            false
        }
    }
}

impl Default for SlideStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(titles: &[&str]) -> SlideStore {
        let mut store = SlideStore::new();
        store
            .replace_all(titles.iter().map(|t| SlideRecord::new(*t, "")).collect())
            .unwrap();
        store
    }

    fn titles(store: &SlideStore) -> Vec<&str> {
        store.slides().iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn add_add_delete_keeps_relative_order() {
        let mut store = SlideStore::new();
        let original = store.slides()[0].clone();

        store.add_slide();
        store.update_field(1, SlideEdit::Title("first added".into()));
        store.add_slide();
        store.update_field(2, SlideEdit::Title("second added".into()));
        assert_eq!(store.len(), 3);
        assert_eq!(store.current_index(), 2);

        store.delete_slide(1).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.slides()[0], original);
        assert_eq!(store.slides()[1].title, "second added");
        assert_eq!(store.current_index(), 1);
    }

    #[test]
    fn last_slide_cannot_be_deleted() {
        let mut store = SlideStore::new();
        assert_eq!(store.delete_slide(0), Err(EditError::LastSlide));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn deleting_active_last_slide_clamps() {
        let mut store = titled(&["a", "b", "c"]);
        store.set_current_slide(2);
        store.delete_slide(2).unwrap();
        assert_eq!(store.current_index(), 1);
        assert_eq!(titles(&store), vec!["a", "b"]);
    }

    #[test]
    fn deleting_before_active_keeps_view() {
        let mut store = titled(&["a", "b", "c"]);
        store.set_current_slide(2);
        store.delete_slide(0).unwrap();
        assert_eq!(store.current_slide().unwrap().title, "c");
    }

    #[test]
    fn delete_out_of_range_is_rejected() {
        let mut store = titled(&["a", "b"]);
        assert_eq!(
            store.delete_slide(5),
            Err(EditError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn duplicate_inserts_after_and_keeps_cursor() {
        let mut store = titled(&["a", "b"]);
        store.set_current_slide(0);
        assert_eq!(store.duplicate_slide(0), Ok(1));
        assert_eq!(titles(&store), vec!["a", "a", "b"]);
        assert_eq!(store.current_index(), 0);
        assert!(store.duplicate_slide(9).is_err());
    }

    #[test]
    fn duplicate_before_active_leaves_index_alone() {
        let mut store = titled(&["a", "b", "c"]);
        store.set_current_slide(2);
        assert_eq!(store.duplicate_slide(0), Ok(1));
        assert_eq!(titles(&store), vec!["a", "a", "b", "c"]);
        assert_eq!(store.current_index(), 2);
    }

    #[test]
    fn update_out_of_range_is_noop() {
        let mut store = titled(&["a"]);
        assert!(!store.update_field(3, SlideEdit::Title("x".into())));
        assert_eq!(titles(&store), vec!["a"]);
    }

    #[test]
    fn replace_all_rejects_empty() {
        let mut store = titled(&["a", "b"]);
        store.set_current_slide(1);
        assert_eq!(store.replace_all(Vec::new()), Err(EditError::EmptyDeck));
        assert_eq!(titles(&store), vec!["a", "b"]);

        store.replace_all(vec![SlideRecord::new("z", "")]).unwrap();
        assert_eq!(store.current_index(), 0);
    }

    #[test]
    fn navigation_is_bounds_checked() {
        let mut store = titled(&["a", "b"]);
        assert!(store.set_current_slide(1));
        assert!(!store.set_current_slide(2));
        assert_eq!(store.current_index(), 1);
    }

    #[test]
    fn restore_clamps_cursor() {
        let mut store = SlideStore::new();
        store.restore(DeckState::new(vec![SlideRecord::default(); 2], 7));
        assert_eq!(store.current_index(), 1);
        assert_eq!(store.keys().len(), 2);

        store.restore(DeckState::new(Vec::new(), 0));
        assert_eq!(store.len(), 1);
        assert_eq!(store.keys().len(), 1);
    }

    #[test]
    fn keys_follow_slides_and_survive_snapshots() {
        let mut store = titled(&["a", "b", "c"]);
        let b = store.key_at(1).unwrap();
        let before = store.snapshot();

        store.delete_slide(0).unwrap();
        assert_eq!(store.key_at(0), Some(b));
        store.duplicate_slide(0).unwrap();
        assert_ne!(store.key_at(1), Some(b));

        store.restore(before.clone());
        assert_eq!(store.key_at(1), Some(b));
        assert_eq!(store.snapshot(), before);

        // keys minted after a restore never collide with restored ones
        store.add_slide();
        let mut keys = store.keys().to_vec();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), store.len());
    }

    #[test]
    fn cursor_stays_in_range_under_mixed_edits() {
        let mut store = SlideStore::new();
        let ops = [0u8, 0, 1, 2, 0, 1, 1, 1, 3, 0, 2, 1, 1, 1, 1];
        for (step, op) in ops.iter().enumerate() {
            match op {
                0 => {
                    store.add_slide();
                }
                1 => {
                    let _ = store.delete_slide(store.current_index());
                }
                2 => {
                    let _ = store.duplicate_slide(step % store.len());
                }
                _ => {
                    store.set_current_slide(0);
                }
            }
            assert!(store.len() >= 1);
            assert!(store.current_index() < store.len());
            assert_eq!(store.keys().len(), store.len());
        }
    }
}
