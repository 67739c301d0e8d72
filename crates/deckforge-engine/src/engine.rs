//! [`DeckEngine`]: one open deck plus its background collaborators.
//!
//! Synchronous edits go through [`DeckEngine::edit`]; the three asynchronous
//! operations (generation, presentation start, autosave) never hold the
//! session lock across an `.await`, and their failures end up as notices
//! rather than errors in the edit path.

use std::sync::{Arc, Mutex, PoisonError};

use deckforge_shared::protocol::PitchDescription;
use deckforge_shared::DeckId;
use deckforge_store::Database;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, GenerationError, PresentError, Result};
use crate::events::{EngineEvent, EventBus};
use crate::generation::{DisabledGeneration, HttpGenerationClient, SlideGenerationClient};
use crate::layout::LayoutRegistry;
use crate::notices::{Notice, NoticeKind, RetryAction};
use crate::persistence::{spawn_autosave, AutosaveHandle, PersistenceAdapter};
use crate::presentation::{EngineFactory, PresentOutcome, PresentationController, PresentationMode};
use crate::state::{lock_session, EditSession, SharedSession};

pub struct DeckEngine {
    config: EngineConfig,
    session: SharedSession,
    layouts: Arc<LayoutRegistry>,
    persistence: PersistenceAdapter,
    presentation: PresentationController,
    generator: Arc<dyn SlideGenerationClient>,
    autosave: Option<AutosaveHandle>,
    bus: EventBus,
    last_pitch: Mutex<Option<PitchDescription>>,
}

impl DeckEngine {
    /// Open `deck_id`, restoring its autosaved state when the store holds it.
    ///
    /// Must be called from within a tokio runtime (spawns the autosave task).
    pub fn start(
        config: EngineConfig,
        persistence: PersistenceAdapter,
        factory: Arc<dyn EngineFactory>,
        generator: Arc<dyn SlideGenerationClient>,
        deck_id: DeckId,
    ) -> Self {
        let bus = EventBus::new();
        let layouts = Arc::new(LayoutRegistry::builtin());
        let session = Arc::new(Mutex::new(fresh_session(
            &config,
            &bus,
            &layouts,
            &persistence,
            deck_id,
        )));

        let autosave = spawn_autosave(
            session.clone(),
            persistence.clone(),
            bus.subscribe(),
            config.autosave_quiet,
        );
        let presentation = PresentationController::new(factory, bus.clone());

        Self {
            config,
            session,
            layouts,
            persistence,
            presentation,
            generator,
            autosave: Some(autosave),
            bus,
            last_pitch: Mutex::new(None),
        }
    }

    /// Build every collaborator from `config`: the store at the configured
    /// path and an HTTP generation client when a URL is set.
    ///
    /// Without a `deck_id` the last active deck is resumed, or a new one
    /// is started when the store is empty.
    pub fn from_config(
        config: EngineConfig,
        factory: Arc<dyn EngineFactory>,
        deck_id: Option<DeckId>,
    ) -> Result<Self> {
        let db = match &config.db_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        let deck_id = match deck_id {
            Some(id) => id,
            None => db.active_deck()?.unwrap_or_default(),
        };
        let generator: Arc<dyn SlideGenerationClient> = match &config.generation_url {
            Some(url) => Arc::new(HttpGenerationClient::new(url, config.generation_timeout)?),
            None => Arc::new(DisabledGeneration),
        };
        Ok(Self::start(
            config,
            PersistenceAdapter::new(db),
            factory,
            generator,
            deck_id,
        ))
    }

    pub fn deck_id(&self) -> DeckId {
        lock_session(&self.session).deck_id().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    pub fn persistence(&self) -> &PersistenceAdapter {
        &self.persistence
    }

    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    /// Run a synchronous mutation against the live session.
    pub fn edit<R>(&self, f: impl FnOnce(&mut EditSession) -> R) -> R {
        f(&mut lock_session(&self.session))
    }

    /// Read from the live session.
    pub fn read<R>(&self, f: impl FnOnce(&EditSession) -> R) -> R {
        f(&lock_session(&self.session))
    }

    pub fn mode(&self) -> PresentationMode {
        self.presentation.mode()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.read(|s| s.notices().active().to_vec())
    }

    pub fn dismiss(&self, notice_id: u64) -> bool {
        self.edit(|s| s.notices_mut().dismiss(notice_id).is_some())
    }

    /// Switch to another deck. Pending changes of the current deck are
    /// written first and any running presentation is stopped.
    pub async fn open(&self, deck_id: DeckId) {
        if self.deck_id() == deck_id {
            return;
        }
        self.presentation.teardown();
        self.save_now().await;

        let next = fresh_session(
            &self.config,
            &self.bus,
            &self.layouts,
            &self.persistence,
            deck_id,
        );
        *lock_session(&self.session) = next;
    }

    /// Ask the generation service for a new deck and swap it in.
    ///
    /// Returns the number of generated slides. On failure the deck is left
    /// untouched and a notice with a retry action is raised.
    pub async fn generate(&self, pitch: PitchDescription) -> Result<usize> {
        *self.last_pitch.lock().unwrap_or_else(PoisonError::into_inner) = Some(pitch.clone());
        let deck_id = self.deck_id();

        let slides = match self.generator.generate(&pitch).await {
            Ok(slides) if slides.is_empty() => Err(GenerationError::Empty),
            other => other,
        };

        let mut session = lock_session(&self.session);
        let slides = match slides {
            Ok(slides) => slides,
            Err(e) => {
                let retry = (!matches!(e, GenerationError::NotConfigured))
                    .then_some(RetryAction::Generate);
                session.notices_mut().raise(
                    NoticeKind::Generation,
                    format!("Slide generation failed: {e}"),
                    retry,
                );
                return Err(e.into());
            }
        };

        if session.deck_id() != &deck_id {
            warn!(
                requested = %deck_id,
                current = %session.deck_id(),
                "deck changed during generation, result discarded"
            );
            return Ok(0);
        }

        let count = slides.len();
        session.replace_all(slides)?;
        Ok(count)
    }

    /// Enter present mode with the current slides and theme.
    pub async fn present(&self) -> Result<PresentOutcome> {
        let (slides, design) = self.read(|s| (s.slides().to_vec(), s.design().clone()));

        let result = self
            .presentation
            .enter_present(slides, design, self.config.present_dimensions)
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let (kind, retry) = match e {
                    PresentError::EmptyDeck => (NoticeKind::Validation, None),
                    PresentError::Init(_) => (NoticeKind::Presentation, Some(RetryAction::Present)),
                };
                self.edit(|s| s.notices_mut().raise(kind, e.to_string(), retry));
                Err(e.into())
            }
        }
    }

    pub fn exit_present(&self) -> bool {
        self.presentation.exit_present()
    }

    /// Dismiss a notice and re-run its retry action, if it has one.
    pub async fn retry(&self, notice_id: u64) -> Result<()> {
        let notice = self
            .edit(|s| s.notices_mut().dismiss(notice_id))
            .ok_or(EngineError::UnknownNotice(notice_id))?;

        match notice.retry {
            Some(RetryAction::Present) => self.present().await.map(|_| ()),
            Some(RetryAction::Generate) => {
                let pitch = self
                    .last_pitch
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                match pitch {
                    Some(pitch) => self.generate(pitch).await.map(|_| ()),
                    None => Err(GenerationError::NotConfigured.into()),
                }
            }
            None => Ok(()),
        }
    }

    /// Write pending changes immediately. Returns whether anything was written.
    pub async fn save_now(&self) -> bool {
        match &self.autosave {
            Some(autosave) => autosave.flush().await,
            None => false,
        }
    }

    /// Close the deck view: stop any presentation and let a pending save finish.
    pub async fn close(mut self) {
        self.presentation.teardown();
        if let Some(autosave) = self.autosave.take() {
            autosave.shutdown().await;
        }
        info!(deck = %self.deck_id(), "deck closed");
    }
}

fn fresh_session(
    config: &EngineConfig,
    bus: &EventBus,
    layouts: &Arc<LayoutRegistry>,
    persistence: &PersistenceAdapter,
    deck_id: DeckId,
) -> EditSession {
    let mut session = EditSession::with_options(
        deck_id.clone(),
        bus.clone(),
        layouts.clone(),
        config.history_limit,
    );
    match persistence.load(&deck_id) {
        Some(blob) => {
            if !session.restore_blob(blob) {
                warn!(deck = %deck_id, "saved deck had no slides, starting fresh");
            }
        }
        None => info!(deck = %deck_id, "no saved state, starting with one slide"),
    }
    session
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use deckforge_shared::SlideRecord;
    use futures::future::BoxFuture;

    use super::*;
    use crate::presentation::{EngineInitError, PresentationEngine, PresentationHandoff};
    use crate::slides::SlideEdit;

    struct StubEngine {
        fail: bool,
    }

    impl PresentationEngine for StubEngine {
        fn initialize(&mut self) -> BoxFuture<'_, std::result::Result<(), EngineInitError>> {
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err("no display".into())
                } else {
                    Ok(())
                }
            })
        }

        fn destroy(&mut self) {}
    }

    #[derive(Default)]
    struct StubFactory {
        fail_next: AtomicBool,
        handed_slides: AtomicUsize,
    }

    impl EngineFactory for StubFactory {
        fn create(&self, handoff: PresentationHandoff) -> Box<dyn PresentationEngine> {
            self.handed_slides.store(handoff.slides.len(), Ordering::SeqCst);
            Box::new(StubEngine {
                fail: self.fail_next.swap(false, Ordering::SeqCst),
            })
        }
    }

    struct CannedGenerator {
        response: Mutex<Option<std::result::Result<Vec<SlideRecord>, GenerationError>>>,
    }

    impl SlideGenerationClient for CannedGenerator {
        fn generate<'a>(
            &'a self,
            _pitch: &'a PitchDescription,
        ) -> BoxFuture<'a, std::result::Result<Vec<SlideRecord>, GenerationError>> {
            let response = self
                .response
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(GenerationError::Empty));
            Box::pin(async move { response })
        }
    }

    fn engine_with(
        persistence: PersistenceAdapter,
        generated: std::result::Result<Vec<SlideRecord>, GenerationError>,
    ) -> (DeckEngine, Arc<StubFactory>) {
        let factory = Arc::new(StubFactory::default());
        let generator = Arc::new(CannedGenerator {
            response: Mutex::new(Some(generated)),
        });
        let config = EngineConfig {
            autosave_quiet: Duration::from_millis(50),
            ..Default::default()
        };
        let engine = DeckEngine::start(
            config,
            persistence,
            factory.clone(),
            generator,
            DeckId::parse("pitch-1").unwrap(),
        );
        (engine, factory)
    }

    fn memory_store() -> PersistenceAdapter {
        PersistenceAdapter::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn empty_generation_keeps_existing_slides() {
        let (engine, _) = engine_with(memory_store(), Ok(Vec::new()));
        engine.edit(|s| {
            s.add_slide();
        });
        let before = engine.read(|s| s.slides().to_vec());
        let history_before = engine.read(|s| s.history().len());

        let result = engine.generate(PitchDescription::default()).await;
        assert!(matches!(result, Err(EngineError::Generation(GenerationError::Empty))));
        assert_eq!(engine.read(|s| s.slides().to_vec()), before);
        assert_eq!(engine.read(|s| s.history().len()), history_before);

        let notice = engine.notices().pop().unwrap();
        assert_eq!(notice.kind, NoticeKind::Generation);
        assert_eq!(notice.retry, Some(RetryAction::Generate));
        engine.close().await;
    }

    #[tokio::test]
    async fn generation_replaces_deck_and_is_undoable() {
        let generated = vec![
            SlideRecord::new("<h1>Problem</h1>", "<p>p</p>"),
            SlideRecord::new("<h1>Solution</h1>", "<p>s</p>"),
        ];
        let (engine, _) = engine_with(memory_store(), Ok(generated));

        assert_eq!(engine.generate(PitchDescription::default()).await.unwrap(), 2);
        assert_eq!(engine.read(|s| s.slides()[1].title.clone()), "<h1>Solution</h1>");
        assert_eq!(engine.read(|s| s.current_index()), 0);

        assert!(engine.edit(|s| s.undo()));
        assert_eq!(engine.read(|s| s.slides().len()), 1);
        engine.close().await;
    }

    #[tokio::test]
    async fn present_failure_raises_retryable_notice() {
        let (engine, factory) = engine_with(memory_store(), Ok(Vec::new()));
        factory.fail_next.store(true, Ordering::SeqCst);

        assert!(engine.present().await.is_err());
        assert_eq!(engine.mode(), PresentationMode::Edit);

        let notice = engine.notices().pop().unwrap();
        assert_eq!(notice.retry, Some(RetryAction::Present));

        engine.retry(notice.id).await.unwrap();
        assert_eq!(engine.mode(), PresentationMode::Present);
        assert!(engine.notices().is_empty());

        assert!(engine.exit_present());
        assert!(matches!(engine.retry(notice.id).await, Err(EngineError::UnknownNotice(_))));
        engine.close().await;
    }

    #[tokio::test]
    async fn present_hands_over_live_slides() {
        let (engine, factory) = engine_with(memory_store(), Ok(Vec::new()));
        engine.edit(|s| {
            s.add_slide();
            s.add_slide();
        });
        assert_eq!(engine.present().await.unwrap(), PresentOutcome::Started);
        assert_eq!(factory.handed_slides.load(Ordering::SeqCst), 3);
        engine.close().await;
    }

    #[tokio::test]
    async fn reopening_restores_autosaved_deck() {
        let store = memory_store();
        let (engine, _) = engine_with(store.clone(), Ok(Vec::new()));
        engine.edit(|s| {
            s.add_slide();
            s.update_field(1, SlideEdit::Title("<h2>Team</h2>".into()));
            s.set_note(1, "founders");
        });
        assert!(engine.save_now().await);
        engine.close().await;

        let (reopened, _) = engine_with(store.clone(), Ok(Vec::new()));
        assert_eq!(reopened.read(|s| s.slides()[1].title.clone()), "<h2>Team</h2>");
        assert_eq!(reopened.read(|s| s.note(1).map(str::to_string)), Some("founders".into()));

        // Opening another deck must not bleed the cached slides across.
        reopened.open(DeckId::parse("pitch-2").unwrap()).await;
        assert_eq!(reopened.deck_id().as_str(), "pitch-2");
        assert_eq!(reopened.read(|s| s.slides().len()), 1);
        reopened.close().await;
    }

    #[tokio::test]
    async fn open_flushes_pending_changes_of_previous_deck() {
        let store = memory_store();
        let (engine, _) = engine_with(store.clone(), Ok(Vec::new()));
        engine.edit(|s| {
            s.add_slide();
        });

        engine.open(DeckId::parse("other").unwrap()).await;
        let saved = store
            .with_db(|db| db.load_deck_blob(&DeckId::parse("pitch-1").unwrap()))
            .unwrap()
            .unwrap();
        assert_eq!(saved.slides.len(), 2);
        engine.close().await;
    }

    #[tokio::test]
    async fn from_config_resumes_the_active_deck() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            db_path: Some(dir.path().join("decks.db")),
            ..Default::default()
        };
        let factory = Arc::new(StubFactory::default());

        let engine = DeckEngine::from_config(
            config.clone(),
            factory.clone(),
            Some(DeckId::parse("resume-me").unwrap()),
        )
        .unwrap();
        engine.edit(|s| {
            s.add_slide();
        });
        assert!(engine.save_now().await);
        engine.close().await;

        let resumed = DeckEngine::from_config(config, factory, None).unwrap();
        assert_eq!(resumed.deck_id().as_str(), "resume-me");
        assert_eq!(resumed.read(|s| s.slides().len()), 2);
        resumed.close().await;
    }
}
