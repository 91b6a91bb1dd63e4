//! Interactive mosaic reordering during a drag.
//!
//! While a mosaic window is held, the session polls the cursor on a fixed
//! cadence and keeps a provisional swap against the nearest slot, so the
//! other windows preview where a drop would land. The swap only becomes
//! durable at drag end; a lost drag end is caught by a timeout that rolls
//! the preview back. Every timer lives in the glue; ticks and the timeout
//! come back in as deferred tasks carrying the session generation, so a
//! task from an ended session is simply ignored.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::layout_engine::events::{DeferredTask, EventResponse};
use crate::layout_engine::zones::Zone;
use crate::sys::screen::{MonitorId, WorkspaceId};
use crate::sys::window_server::{Animator, WindowId, WindowServer};

use super::orchestrator::TilingOrchestrator;

#[derive(Clone, Copy, Debug)]
pub(crate) struct ReorderSession {
    pub window: WindowId,
    pub workspace: WorkspaceId,
    pub monitor: MonitorId,
    pub generation: u64,
    pub started: Instant,
}

impl TilingOrchestrator {
    /// Begins a reorder session for a held mosaic window. Starting over an
    /// edge-tiled window is a no-op; tiles move by zone drop, not by
    /// reordering.
    pub fn start_drag(
        &mut self,
        window: WindowId,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> EventResponse {
        if self.edge.is_edge_tiled(window) {
            return EventResponse::none();
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        debug!(?window, generation, "reorder session started");
        self.reorder = Some(ReorderSession {
            window,
            workspace,
            monitor,
            generation,
            started: Instant::now(),
        });
        self.pending_swap = None;

        let mut response =
            EventResponse::after(self.settings.reorder_tick(), DeferredTask::ReorderTick {
                generation,
            });
        response.push(self.settings.reorder_timeout(), DeferredTask::ReorderTimeout {
            generation,
        });
        response
    }

    /// One cadence step: refresh the provisional swap from the cursor
    /// position and re-emit the next tick.
    pub fn on_reorder_tick(
        &mut self,
        host: &mut dyn WindowServer,
        animator: &mut dyn Animator,
        generation: u64,
    ) -> EventResponse {
        let Some(session) = self.reorder else { return EventResponse::none() };
        if session.generation != generation {
            trace!(generation, "stale reorder tick ignored");
            return EventResponse::none();
        }
        let ReorderSession { window, workspace, monitor, .. } = session;

        let cursor = host.pointer_position();
        let hovered = self.edge.detect_zone(host, cursor, workspace, monitor);

        if hovered != Zone::None {
            // Hovering an edge zone means a drop would tile, not reorder:
            // the preview packs as if the window already left the mosaic.
            self.pending_swap = None;
            self.tile_workspace_windows(
                host, animator, workspace, monitor, Some(window), true, Some(window),
            );
        } else {
            let nearest = self
                .edge
                .mosaic_windows(host, workspace, monitor)
                .into_iter()
                .min_by(|a, b| {
                    let da = a.frame.mid().dist2(cursor);
                    let db = b.frame.mid().dist2(cursor);
                    da.total_cmp(&db)
                })
                .map(|info| info.id);
            // The dragged window winning means the cursor is still over
            // its own slot; that is not a swap.
            self.pending_swap = match nearest {
                Some(n) if n != window => Some((window, n)),
                _ => None,
            };

            let fit = self.tile_workspace_windows(
                host, animator, workspace, monitor, Some(window), true, None,
            );
            if !fit && self.pending_swap.take().is_some() {
                // The provisional arrangement does not fit; roll the
                // preview back rather than migrating anything mid-drag.
                trace!(?window, "provisional swap overflows, rolling back");
                self.tile_workspace_windows(
                    host, animator, workspace, monitor, Some(window), true, None,
                );
            }
        }

        EventResponse::after(self.settings.reorder_tick(), DeferredTask::ReorderTick {
            generation,
        })
    }

    /// Drag end: the provisional swap becomes durable and the workspace is
    /// packed one final time. Returns whether a swap was committed.
    pub fn stop_drag(&mut self, host: &mut dyn WindowServer, animator: &mut dyn Animator) -> bool {
        let Some(session) = self.reorder.take() else { return false };
        let committed = match self.pending_swap.take() {
            Some((a, b)) => {
                self.swaps.commit(session.workspace, a, b);
                true
            }
            None => false,
        };
        debug!(window = ?session.window, committed, "reorder session ended");
        self.tile_workspace_windows(
            host,
            animator,
            session.workspace,
            session.monitor,
            Some(session.window),
            false,
            None,
        );
        committed
    }

    /// Backstop for a lost drag end: abandon the preview without committing.
    pub fn on_reorder_timeout(
        &mut self,
        host: &mut dyn WindowServer,
        animator: &mut dyn Animator,
        generation: u64,
    ) -> EventResponse {
        let Some(session) = self.reorder else { return EventResponse::none() };
        if session.generation != generation {
            return EventResponse::none();
        }
        warn!(
            window = ?session.window,
            elapsed_ms = session.started.elapsed().as_millis() as u64,
            "reorder session timed out, rolling back"
        );
        self.reorder = None;
        self.pending_swap = None;
        self.tile_workspace_windows(
            host,
            animator,
            session.workspace,
            session.monitor,
            None,
            false,
            None,
        );
        EventResponse::none()
    }
}
