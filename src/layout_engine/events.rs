//! Deferred follow-up work emitted by engine operations.
//!
//! The engine runs entirely on the host's event thread and never owns a
//! timer. Any operation that needs a later step returns it here; the glue
//! schedules the delay and feeds the fired task back into
//! [`TilingOrchestrator::run_task`]. Reorder tasks carry a generation so a
//! stale timer from an ended session is inert, which is all the cancellation
//! this model needs.
//!
//! [`TilingOrchestrator::run_task`]: crate::layout_engine::TilingOrchestrator::run_task

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sys::screen::{MonitorId, WorkspaceId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredTask {
    /// Re-pack a workspace after letting host geometry settle.
    Retile {
        workspace: WorkspaceId,
        monitor: MonitorId,
    },
    /// One cadence step of the interactive reorder session.
    ReorderTick { generation: u64 },
    /// Safety backstop for a reorder session whose drag-end was lost.
    ReorderTimeout { generation: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deferred {
    pub delay: Duration,
    pub task: DeferredTask,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResponse {
    pub deferred: Vec<Deferred>,
}

impl EventResponse {
    pub fn none() -> Self { Self::default() }

    pub fn after(delay: Duration, task: DeferredTask) -> Self {
        Self {
            deferred: vec![Deferred { delay, task }],
        }
    }

    pub fn push(&mut self, delay: Duration, task: DeferredTask) {
        self.deferred.push(Deferred { delay, task });
    }

    pub fn merge(&mut self, other: EventResponse) { self.deferred.extend(other.deferred); }

    pub fn is_empty(&self) -> bool { self.deferred.is_empty() }
}
