//! Observer channel for UI and persistence layers.
//!
//! Every state change in an [`EditSession`](crate::EditSession) is published as
//! an [`EngineEvent`] on a broadcast channel; observers call
//! [`EventBus::subscribe`] and react on their own schedule.

use deckforge_shared::DeckId;
use tokio::sync::broadcast;

use crate::notices::Notice;
use crate::presentation::PresentationMode;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A session was opened (or re-seeded) for this deck.
    DeckOpened { deck_id: DeckId },
    /// The slide array changed and a history snapshot was recorded.
    DeckChanged { deck_id: DeckId, slides: usize },
    /// Navigation only; no history snapshot.
    CurrentSlideChanged { deck_id: DeckId, index: usize },
    DesignChanged { deck_id: DeckId },
    NotesChanged { deck_id: DeckId },
    HistoryMoved { deck_id: DeckId, can_undo: bool, can_redo: bool },
    ModeChanged { mode: PresentationMode },
    Saved { deck_id: DeckId },
    NoticeRaised(Notice),
    NoticeDismissed { id: u64 },
}

impl EngineEvent {
    pub fn deck_id(&self) -> Option<&DeckId> {
        match self {
            EngineEvent::DeckOpened { deck_id }
            | EngineEvent::DeckChanged { deck_id, .. }
            | EngineEvent::CurrentSlideChanged { deck_id, .. }
            | EngineEvent::DesignChanged { deck_id }
            | EngineEvent::NotesChanged { deck_id }
            | EngineEvent::HistoryMoved { deck_id, .. }
            | EngineEvent::Saved { deck_id } => Some(deck_id),
            EngineEvent::ModeChanged { .. }
            | EngineEvent::NoticeRaised(_)
            | EngineEvent::NoticeDismissed { .. } => None,
        }
    }

    /// Whether this event means the persisted blob is now stale.
    pub fn dirties_deck(&self) -> bool {
        matches!(
            self,
            EngineEvent::DeckChanged { .. }
                | EngineEvent::CurrentSlideChanged { .. }
                | EngineEvent::DesignChanged { .. }
                | EngineEvent::NotesChanged { .. }
                | EngineEvent::HistoryMoved { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: EngineEvent) {
        // No subscribers is a normal state (headless use, tests).
        if self.tx.send(event).is_err() {
            tracing::trace!("event dropped, no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let deck_id = DeckId::parse("d").unwrap();

        bus.emit(EngineEvent::DeckOpened { deck_id: deck_id.clone() });
        bus.emit(EngineEvent::DeckChanged { deck_id: deck_id.clone(), slides: 2 });

        assert_eq!(rx.recv().await.unwrap(), EngineEvent::DeckOpened { deck_id: deck_id.clone() });
        assert_eq!(rx.recv().await.unwrap(), EngineEvent::DeckChanged { deck_id, slides: 2 });
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        EventBus::new().emit(EngineEvent::NoticeDismissed { id: 1 });
    }
}
