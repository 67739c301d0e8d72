//! Autosave and restore of decks in the local store.
//!
//! [`PersistenceAdapter`] is the synchronous save/load boundary. The debounced
//! writer spawned by [`spawn_autosave`] listens to session events, restarts a
//! quiet-period timer on every change and, when the timer fires, reads the
//! *current* session state and writes it.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use deckforge_shared::DeckId;
use deckforge_store::{Database, PersistedDeckBlob, StoreError};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::events::EngineEvent;
use crate::notices::NoticeKind;
use crate::state::{lock_session, SharedSession};

#[derive(Clone)]
pub struct PersistenceAdapter {
    db: Arc<Mutex<Database>>,
}

impl PersistenceAdapter {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Run `f` against the underlying database.
    pub fn with_db<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        let guard = self.db.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Write `blob` for `deck_id` and mark it as the active deck.
    pub fn save(&self, deck_id: &DeckId, blob: &PersistedDeckBlob) -> Result<(), StoreError> {
        self.with_db(|db| db.save_deck_blob(deck_id, blob))
    }

    /// Load the blob for `deck_id`, only if it is the deck written last.
    ///
    /// Store and decode failures are logged and treated as "nothing saved".
    pub fn load(&self, deck_id: &DeckId) -> Option<PersistedDeckBlob> {
        let result = self.with_db(|db| -> Result<Option<PersistedDeckBlob>, StoreError> {
            match db.active_deck()? {
                Some(active) if &active == deck_id => db.load_deck_blob(deck_id),
                Some(active) => {
                    debug!(requested = %deck_id, active = %active, "cached deck belongs to another deck");
                    Ok(None)
                }
                None => Ok(None),
            }
        });

        match result {
            Ok(blob) => blob,
            Err(e) => {
                error!(deck = %deck_id, error = %e, "failed to restore deck, starting fresh");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Debounced autosave
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum AutosaveCommand {
    /// Write any pending change now. Replies whether a write happened.
    Flush(oneshot::Sender<bool>),
    /// Write any pending change for the current deck, then stop.
    Shutdown(oneshot::Sender<()>),
}

pub struct AutosaveHandle {
    cmd_tx: mpsc::Sender<AutosaveCommand>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    pub async fn flush(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(AutosaveCommand::Flush(tx)).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    pub async fn shutdown(self) {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(AutosaveCommand::Shutdown(tx)).await.is_ok() {
            let _ = rx.await;
        }
        if let Err(e) = self.task.await {
            warn!(error = %e, "autosave task ended abnormally");
        }
    }
}

/// Spawn the autosave task. `events` must be subscribed to the session's bus.
pub fn spawn_autosave(
    session: SharedSession,
    adapter: PersistenceAdapter,
    events: broadcast::Receiver<EngineEvent>,
    quiet: Duration,
) -> AutosaveHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let task = tokio::spawn(autosave_loop(session, adapter, events, cmd_rx, quiet));
    AutosaveHandle { cmd_tx, task }
}

async fn autosave_loop(
    session: SharedSession,
    adapter: PersistenceAdapter,
    mut events: broadcast::Receiver<EngineEvent>,
    mut cmd_rx: mpsc::Receiver<AutosaveCommand>,
    quiet: Duration,
) {
    let mut pending: Option<DeckId> = None;
    let timer = tokio::time::sleep(quiet);
    tokio::pin!(timer);

    debug!(quiet_ms = quiet.as_millis() as u64, "autosave started");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if track_event(event, &mut pending) {
                        timer.as_mut().reset(Instant::now() + quiet);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Missed events; assume the live deck changed.
                    warn!(skipped, "autosave lagged behind session events");
                    pending = Some(lock_session(&session).deck_id().clone());
                    timer.as_mut().reset(Instant::now() + quiet);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    write_pending(&session, &adapter, pending.take());
                    break;
                }
            },

            () = &mut timer, if pending.is_some() => {
                write_pending(&session, &adapter, pending.take());
            }

            cmd = cmd_rx.recv() => {
                // Pick up changes published just before the command.
                while let Ok(event) = events.try_recv() {
                    track_event(event, &mut pending);
                }
                match cmd {
                    Some(AutosaveCommand::Flush(reply)) => {
                        let wrote = write_pending(&session, &adapter, pending.take());
                        let _ = reply.send(wrote);
                    }
                    Some(AutosaveCommand::Shutdown(reply)) => {
                        write_pending(&session, &adapter, pending.take());
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        write_pending(&session, &adapter, pending.take());
                        break;
                    }
                }
            }
        }
    }

    debug!("autosave stopped");
}

/// Update the pending deck for one event. Returns `true` when the quiet
/// period has to restart.
fn track_event(event: EngineEvent, pending: &mut Option<DeckId>) -> bool {
    if let EngineEvent::DeckOpened { deck_id } = &event {
        if pending.as_ref().is_some_and(|p| p != deck_id) {
            info!(deck = %deck_id, "deck switched, discarding pending save");
            *pending = None;
        }
        return false;
    }
    if !event.dirties_deck() {
        return false;
    }
    match event.deck_id() {
        Some(deck_id) => {
            *pending = Some(deck_id.clone());
            true
        }
        None => false,
    }
}

/// Serialize the live session and write it, unless the session has moved on
/// to a different deck since the change was scheduled.
fn write_pending(
    session: &SharedSession,
    adapter: &PersistenceAdapter,
    pending: Option<DeckId>,
) -> bool {
    let Some(deck_id) = pending else {
        return false;
    };

    let blob = {
        let guard = lock_session(session);
        if guard.deck_id() != &deck_id {
            info!(
                scheduled = %deck_id,
                current = %guard.deck_id(),
                "dropping save scheduled for a closed deck"
            );
            return false;
        }
        guard.to_blob()
    };

    match adapter.save(&deck_id, &blob) {
        Ok(()) => {
            debug!(deck = %deck_id, slides = blob.slides.len(), "autosaved");
            lock_session(session).bus().emit(EngineEvent::Saved { deck_id });
            true
        }
        Err(e) => {
            error!(deck = %deck_id, error = %e, "autosave failed");
            lock_session(session).notices_mut().raise(
                NoticeKind::Persistence,
                format!("Could not save your changes: {e}"),
                None,
            );
            false
        }
    }
}
