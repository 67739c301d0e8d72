//! Edit/Present mode switch around an external presentation engine.
//!
//! At most one engine instance is alive at a time. A second present request
//! while one is initializing is ignored, and leaving present mode during
//! initialization abandons it: the late engine is destroyed as soon as its
//! `initialize` resolves, and only then can a new presentation start.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use deckforge_shared::constants::{DEFAULT_PRESENT_HEIGHT, DEFAULT_PRESENT_WIDTH};
use deckforge_shared::{DesignSettings, SlideRecord};
use futures::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::PresentError;
use crate::events::{EngineEvent, EventBus};

pub type EngineInitError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationMode {
    Edit,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerDimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for ContainerDimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_PRESENT_WIDTH,
            height: DEFAULT_PRESENT_HEIGHT,
        }
    }
}

/// Everything the rendering engine gets when present mode starts.
#[derive(Debug, Clone)]
pub struct PresentationHandoff {
    pub slides: Vec<SlideRecord>,
    pub design_settings: DesignSettings,
    pub dimensions: ContainerDimensions,
}

/// One live instance of the external rendering engine.
pub trait PresentationEngine: Send {
    fn initialize(&mut self) -> BoxFuture<'_, Result<(), EngineInitError>>;

    /// Must be idempotent and must not panic.
    fn destroy(&mut self);
}

pub trait EngineFactory: Send + Sync {
    fn create(&self, handoff: PresentationHandoff) -> Box<dyn PresentationEngine>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The engine initialized and present mode is live.
    Started,
    /// A presentation was already starting, running or still winding down
    /// after an abandoned start; nothing was done.
    AlreadyActive,
    /// Present mode was left while initializing; the engine was discarded.
    Abandoned,
}

enum Phase {
    Edit,
    Initializing {
        ticket: u64,
    },
    /// Left present mode while `initialize` was still running.
    Abandoning {
        ticket: u64,
    },
    Presenting {
        ticket: u64,
        engine: Box<dyn PresentationEngine>,
    },
}

struct Inner {
    phase: Phase,
    next_ticket: u64,
}

pub struct PresentationController {
    factory: Arc<dyn EngineFactory>,
    inner: Arc<Mutex<Inner>>,
    bus: EventBus,
}

impl PresentationController {
    pub fn new(factory: Arc<dyn EngineFactory>, bus: EventBus) -> Self {
        Self {
            factory,
            inner: Arc::new(Mutex::new(Inner {
                phase: Phase::Edit,
                next_ticket: 1,
            })),
            bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> PresentationMode {
        match self.lock().phase {
            Phase::Presenting { .. } => PresentationMode::Present,
            Phase::Edit | Phase::Initializing { .. } | Phase::Abandoning { .. } => {
                PresentationMode::Edit
            }
        }
    }

    pub fn is_initializing(&self) -> bool {
        matches!(self.lock().phase, Phase::Initializing { .. })
    }

    /// An abandoned engine is still inside `initialize`.
    pub fn is_abandoning(&self) -> bool {
        matches!(self.lock().phase, Phase::Abandoning { .. })
    }

    pub async fn enter_present(
        &self,
        slides: Vec<SlideRecord>,
        design_settings: DesignSettings,
        dimensions: ContainerDimensions,
    ) -> Result<PresentOutcome, PresentError> {
        if slides.is_empty() {
            return Err(PresentError::EmptyDeck);
        }

        let ticket = {
            let mut lock = self.lock();
            let inner = &mut *lock;
            match inner.phase {
                Phase::Edit => {
                    let ticket = inner.next_ticket;
                    inner.next_ticket += 1;
                    inner.phase = Phase::Initializing { ticket };
                    ticket
                }
                Phase::Abandoning { ticket } => {
                    debug!(ticket, "present requested while an abandoned start is pending");
                    return Ok(PresentOutcome::AlreadyActive);
                }
                Phase::Initializing { .. } | Phase::Presenting { .. } => {
                    debug!("present requested while already active, ignoring");
                    return Ok(PresentOutcome::AlreadyActive);
                }
            }
        };

        // Resets the phase if this future is dropped mid-initialization.
        let mut guard = InitGuard {
            inner: &self.inner,
            ticket,
            armed: true,
        };

        info!(
            ticket,
            slides = slides.len(),
            width = dimensions.width,
            height = dimensions.height,
            "starting presentation engine"
        );
        let mut engine = self.factory.create(PresentationHandoff {
            slides,
            design_settings,
            dimensions,
        });
        let result = engine.initialize().await;
        guard.armed = false;

        let mut inner = self.lock();
        let still_wanted = matches!(inner.phase, Phase::Initializing { ticket: t } if t == ticket);

        match result {
            Ok(()) if still_wanted => {
                inner.phase = Phase::Presenting { ticket, engine };
                drop(inner);
                info!(ticket, "presentation started");
                self.bus.emit(EngineEvent::ModeChanged {
                    mode: PresentationMode::Present,
                });
                Ok(PresentOutcome::Started)
            }
            Err(e) if still_wanted => {
                engine.destroy();
                inner.phase = Phase::Edit;
                drop(inner);
                warn!(ticket, error = %e, "presentation engine failed to initialize");
                Err(PresentError::Init(e.to_string()))
            }
            _ => {
                // Destroy before releasing the phase so a new start cannot overlap.
                engine.destroy();
                if matches!(inner.phase, Phase::Abandoning { ticket: t } if t == ticket) {
                    inner.phase = Phase::Edit;
                }
                drop(inner);
                info!(ticket, "presentation abandoned during initialization");
                Ok(PresentOutcome::Abandoned)
            }
        }
    }

    /// Leave present mode. Safe to call in any state; returns `true` if a
    /// presentation was running or starting.
    pub fn exit_present(&self) -> bool {
        let previous = {
            let mut inner = self.lock();
            let next = match inner.phase {
                Phase::Initializing { ticket } | Phase::Abandoning { ticket } => {
                    Phase::Abandoning { ticket }
                }
                Phase::Edit | Phase::Presenting { .. } => Phase::Edit,
            };
            std::mem::replace(&mut inner.phase, next)
        };

        match previous {
            Phase::Presenting { ticket, mut engine } => {
                engine.destroy();
                info!(ticket, "presentation stopped");
                self.bus.emit(EngineEvent::ModeChanged {
                    mode: PresentationMode::Edit,
                });
                true
            }
            Phase::Initializing { ticket } => {
                info!(ticket, "presentation cancelled while initializing");
                true
            }
            Phase::Abandoning { .. } | Phase::Edit => false,
        }
    }

    /// The deck view is going away.
    pub fn teardown(&self) {
        if self.exit_present() {
            debug!("presentation torn down with the view");
        }
    }
}

impl Drop for PresentationController {
    fn drop(&mut self) {
        self.teardown();
    }
}

struct InitGuard<'a> {
    inner: &'a Mutex<Inner>,
    ticket: u64,
    armed: bool,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = match inner.phase {
            Phase::Initializing { ticket } | Phase::Abandoning { ticket } => ticket == self.ticket,
            Phase::Edit | Phase::Presenting { .. } => false,
        };
        if stale {
            inner.phase = Phase::Edit;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use super::*;

    #[derive(Default)]
    struct Counters {
        created: AtomicUsize,
        live: AtomicUsize,
        max_live: AtomicUsize,
        destroyed: AtomicUsize,
    }

    struct FakeEngine {
        counters: Arc<Counters>,
        gate: Option<Arc<Notify>>,
        fail: bool,
        destroyed: bool,
    }

    impl PresentationEngine for FakeEngine {
        fn initialize(&mut self) -> BoxFuture<'_, Result<(), EngineInitError>> {
            Box::pin(async move {
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
                if self.fail {
                    Err("renderer not ready".into())
                } else {
                    Ok(())
                }
            })
        }

        fn destroy(&mut self) {
            if !self.destroyed {
                self.destroyed = true;
                self.counters.live.fetch_sub(1, Ordering::SeqCst);
                self.counters.destroyed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    struct FakeFactory {
        counters: Arc<Counters>,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    impl EngineFactory for FakeFactory {
        fn create(&self, _handoff: PresentationHandoff) -> Box<dyn PresentationEngine> {
            self.counters.created.fetch_add(1, Ordering::SeqCst);
            let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.counters.max_live.fetch_max(live, Ordering::SeqCst);
            Box::new(FakeEngine {
                counters: self.counters.clone(),
                gate: self.gate.clone(),
                fail: self.fail,
                destroyed: false,
            })
        }
    }

    fn controller(gate: Option<Arc<Notify>>, fail: bool) -> (Arc<PresentationController>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let factory = Arc::new(FakeFactory {
            counters: counters.clone(),
            gate,
            fail,
        });
        (Arc::new(PresentationController::new(factory, EventBus::new())), counters)
    }

    fn slides() -> Vec<SlideRecord> {
        vec![SlideRecord::default()]
    }

    #[tokio::test]
    async fn empty_deck_is_refused() {
        let (ctl, counters) = controller(None, false);
        let result = ctl
            .enter_present(Vec::new(), DesignSettings::default(), ContainerDimensions::default())
            .await;
        assert_eq!(result, Err(PresentError::EmptyDeck));
        assert_eq!(ctl.mode(), PresentationMode::Edit);
        assert_eq!(counters.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn enter_and_exit() {
        let (ctl, counters) = controller(None, false);
        let outcome = ctl
            .enter_present(slides(), DesignSettings::default(), ContainerDimensions::default())
            .await;
        assert_eq!(outcome, Ok(PresentOutcome::Started));
        assert_eq!(ctl.mode(), PresentationMode::Present);

        assert!(ctl.exit_present());
        assert_eq!(ctl.mode(), PresentationMode::Edit);
        assert_eq!(counters.live.load(Ordering::SeqCst), 0);
        assert!(!ctl.exit_present());
    }

    #[tokio::test]
    async fn init_failure_returns_to_edit() {
        let (ctl, counters) = controller(None, true);
        let result = ctl
            .enter_present(slides(), DesignSettings::default(), ContainerDimensions::default())
            .await;
        assert!(matches!(result, Err(PresentError::Init(msg)) if msg.contains("not ready")));
        assert_eq!(ctl.mode(), PresentationMode::Edit);
        assert!(!ctl.is_initializing());
        assert_eq!(counters.destroyed.load(Ordering::SeqCst), 1);
        // Still safe to exit after a failed start.
        assert!(!ctl.exit_present());
    }

    #[tokio::test]
    async fn second_request_while_initializing_is_ignored() {
        let gate = Arc::new(Notify::new());
        let (ctl, counters) = controller(Some(gate.clone()), false);

        let first = tokio::spawn({
            let ctl = ctl.clone();
            async move {
                ctl.enter_present(slides(), DesignSettings::default(), ContainerDimensions::default())
                    .await
            }
        });
        while !ctl.is_initializing() {
            tokio::task::yield_now().await;
        }

        let second = ctl
            .enter_present(slides(), DesignSettings::default(), ContainerDimensions::default())
            .await;
        assert_eq!(second, Ok(PresentOutcome::AlreadyActive));

        gate.notify_one();
        assert_eq!(first.await.unwrap(), Ok(PresentOutcome::Started));
        assert_eq!(counters.created.load(Ordering::SeqCst), 1);
        assert_eq!(counters.max_live.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exit_during_init_discards_late_engine() {
        let gate = Arc::new(Notify::new());
        let (ctl, counters) = controller(Some(gate.clone()), false);

        let pending = tokio::spawn({
            let ctl = ctl.clone();
            async move {
                ctl.enter_present(slides(), DesignSettings::default(), ContainerDimensions::default())
                    .await
            }
        });
        while !ctl.is_initializing() {
            tokio::task::yield_now().await;
        }

        ctl.teardown();
        gate.notify_one();

        assert_eq!(pending.await.unwrap(), Ok(PresentOutcome::Abandoned));
        assert_eq!(ctl.mode(), PresentationMode::Edit);
        assert_eq!(counters.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn restart_waits_for_abandoned_engine() {
        let gate = Arc::new(Notify::new());
        let (ctl, counters) = controller(Some(gate.clone()), false);

        let abandoned = tokio::spawn({
            let ctl = ctl.clone();
            async move {
                ctl.enter_present(slides(), DesignSettings::default(), ContainerDimensions::default())
                    .await
            }
        });
        while !ctl.is_initializing() {
            tokio::task::yield_now().await;
        }
        assert!(ctl.exit_present());
        assert!(ctl.is_abandoning());
        assert!(!ctl.exit_present());

        let early = ctl
            .enter_present(slides(), DesignSettings::default(), ContainerDimensions::default())
            .await;
        assert_eq!(early, Ok(PresentOutcome::AlreadyActive));
        assert_eq!(counters.created.load(Ordering::SeqCst), 1);

        gate.notify_one();
        assert_eq!(abandoned.await.unwrap(), Ok(PresentOutcome::Abandoned));
        assert!(!ctl.is_abandoning());
        assert_eq!(counters.live.load(Ordering::SeqCst), 0);

        let restarted = tokio::spawn({
            let ctl = ctl.clone();
            async move {
                ctl.enter_present(slides(), DesignSettings::default(), ContainerDimensions::default())
                    .await
            }
        });
        while !ctl.is_initializing() {
            tokio::task::yield_now().await;
        }
        gate.notify_one();
        assert_eq!(restarted.await.unwrap(), Ok(PresentOutcome::Started));
        assert_eq!(ctl.mode(), PresentationMode::Present);
        assert_eq!(counters.max_live.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropped_request_does_not_wedge_controller() {
        let gate = Arc::new(Notify::new());
        let (ctl, _counters) = controller(Some(gate), false);

        let attempt = ctl.enter_present(slides(), DesignSettings::default(), ContainerDimensions::default());
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(10), attempt).await;
        assert!(timed_out.is_err());
        assert!(!ctl.is_initializing());
    }
}
