//! Background task bookkeeping.
//!
//! Each background activity (upload, thumbnail fetch, poller) occupies one
//! slot in a [`TaskArena`], identified by a fresh [`TaskId`]. Tasks report
//! through an [`EventSink`] stamped with that id. An event whose id no
//! longer owns its slot is stale and gets dropped, which is how results
//! from a cancelled or replaced task are ignored.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::state::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TaskKind {
    Upload,
    Thumbnails,
    Poller,
}

impl TaskKind {
    const COUNT: usize = 3;

    fn slot(self) -> usize {
        match self {
            Self::Upload => 0,
            Self::Thumbnails => 1,
            Self::Poller => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TaskId(u64);

#[derive(Debug)]
pub(crate) enum Report {
    Event(SessionEvent),
    /// Sent once, when the last clone of a sink is dropped.
    Exited,
}

#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) kind: TaskKind,
    pub(crate) id: TaskId,
    pub(crate) report: Report,
}

struct SinkInner {
    tx: mpsc::UnboundedSender<Envelope>,
    kind: TaskKind,
    id: TaskId,
}

impl Drop for SinkInner {
    fn drop(&mut self) {
        let _ = self.tx.send(Envelope {
            kind: self.kind,
            id: self.id,
            report: Report::Exited,
        });
    }
}

/// Where a background task sends its events.
#[derive(Clone)]
pub(crate) struct EventSink {
    inner: Arc<SinkInner>,
}

impl EventSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Envelope>, kind: TaskKind, id: TaskId) -> Self {
        Self {
            inner: Arc::new(SinkInner { tx, kind, id }),
        }
    }

    /// Returns false once the receiving side is gone.
    pub(crate) fn send(&self, event: SessionEvent) -> bool {
        self.inner
            .tx
            .send(Envelope {
                kind: self.inner.kind,
                id: self.inner.id,
                report: Report::Event(event),
            })
            .is_ok()
    }
}

/// Cancellation handle for one running task.
#[derive(Debug)]
pub(crate) struct TaskHandle {
    id: TaskId,
    cancel: CancellationToken,
}

impl TaskHandle {
    /// Idempotent.
    pub(crate) fn stop(&self) {
        self.cancel.cancel();
    }
}

/// One slot per [`TaskKind`]; registering a kind replaces and cancels the
/// previous occupant.
#[derive(Debug, Default)]
pub(crate) struct TaskArena {
    slots: [Option<TaskHandle>; TaskKind::COUNT],
    next_id: u64,
}

impl TaskArena {
    /// Claims the slot for `kind`, stopping whatever held it.
    pub(crate) fn register(&mut self, kind: TaskKind) -> (TaskId, CancellationToken) {
        self.stop(kind);

        self.next_id += 1;
        let id = TaskId(self.next_id);
        let cancel = CancellationToken::new();
        self.slots[kind.slot()] = Some(TaskHandle {
            id,
            cancel: cancel.clone(),
        });
        (id, cancel)
    }

    /// Stops and clears the slot. Returns whether a task was running.
    pub(crate) fn stop(&mut self, kind: TaskKind) -> bool {
        match self.slots[kind.slot()].take() {
            Some(handle) => {
                trace!(kind = ?kind, id = handle.id.0, "stopping task");
                handle.stop();
                true
            }
            None => false,
        }
    }

    pub(crate) fn stop_all(&mut self) {
        for kind in [TaskKind::Upload, TaskKind::Thumbnails, TaskKind::Poller] {
            self.stop(kind);
        }
    }

    /// Clears the slot if `id` still owns it.
    pub(crate) fn release(&mut self, kind: TaskKind, id: TaskId) {
        let slot = &mut self.slots[kind.slot()];
        if slot.as_ref().is_some_and(|h| h.id == id) {
            *slot = None;
        }
    }

    pub(crate) fn is_current(&self, kind: TaskKind, id: TaskId) -> bool {
        self.slots[kind.slot()].as_ref().is_some_and(|h| h.id == id)
    }

    pub(crate) fn is_active(&self, kind: TaskKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl Drop for TaskArena {
    fn drop(&mut self) {
        self.stop_all();
    }
}
