//! User-facing error state, observed separately from the deck itself.

use serde::Serialize;

use crate::events::{EngineEvent, EventBus};

/// Oldest notices are dropped beyond this.
const MAX_NOTICES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Validation,
    Generation,
    Presentation,
    Persistence,
}

/// The action a notice's "retry" button re-runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryAction {
    Present,
    Generate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    pub retry: Option<RetryAction>,
}

/// Dismissible notices, newest last.
#[derive(Debug)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
    next_id: u64,
    bus: EventBus,
}

impl NoticeBoard {
    pub fn new(bus: EventBus) -> Self {
        Self {
            notices: Vec::new(),
            next_id: 1,
            bus,
        }
    }

    /// Add a notice and return its id. A notice identical in kind and
    /// message to one still active is not repeated; the existing id is
    /// returned instead.
    pub fn raise(
        &mut self,
        kind: NoticeKind,
        message: impl Into<String>,
        retry: Option<RetryAction>,
    ) -> u64 {
        let message = message.into();
        if let Some(existing) = self
            .notices
            .iter()
            .find(|n| n.kind == kind && n.message == message)
        {
            tracing::debug!(id = existing.id, "notice already active");
            return existing.id;
        }

        let id = self.next_id;
        self.next_id += 1;

        let notice = Notice {
            id,
            kind,
            message,
            retry,
        };
        tracing::warn!(id, kind = ?notice.kind, message = %notice.message, "notice raised");

        if self.notices.len() >= MAX_NOTICES {
            let dropped = self.notices.remove(0);
            self.bus.emit(EngineEvent::NoticeDismissed { id: dropped.id });
        }
        self.notices.push(notice.clone());
        self.bus.emit(EngineEvent::NoticeRaised(notice));
        id
    }

    pub fn dismiss(&mut self, id: u64) -> Option<Notice> {
        let pos = self.notices.iter().position(|n| n.id == id)?;
        let notice = self.notices.remove(pos);
        self.bus.emit(EngineEvent::NoticeDismissed { id });
        Some(notice)
    }

    pub fn get(&self, id: u64) -> Option<&Notice> {
        self.notices.iter().find(|n| n.id == id)
    }

    pub fn active(&self) -> &[Notice] {
        &self.notices
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.last()
    }
}
