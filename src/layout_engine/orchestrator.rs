//! The orchestrator: one retained object combining the mosaic packer and
//! the edge tiling engine into a full per-workspace layout pass.
//!
//! Edge tiles claim their space first; the mosaic fills what is left. The
//! orchestrator owns the committed reorder swaps and any live reorder
//! session, and it is the single entry point the event glue drives.

use tracing::{debug, trace};

use crate::common::config::Settings;
use crate::layout_engine::edge_tiling::EdgeTilingEngine;
use crate::layout_engine::events::{DeferredTask, EventResponse};
use crate::layout_engine::mosaic::{self, WindowDescriptor};
use crate::layout_engine::reorder::ReorderSession;
use crate::layout_engine::zones::{self, Zone};
use crate::model::swaps::{self, WorkspaceSwaps};
use crate::model::tile_state::WindowState;
use crate::sys::geometry::{Point, Rect};
use crate::sys::screen::{MonitorId, WorkspaceId};
use crate::sys::window_server::{Animator, WindowId, WindowServer};

pub struct TilingOrchestrator {
    pub(crate) settings: Settings,
    pub(crate) edge: EdgeTilingEngine,
    pub(crate) swaps: WorkspaceSwaps,
    /// Provisional swap held by a live reorder session; replayed after the
    /// committed list so the preview reflects where a drop would land.
    pub(crate) pending_swap: Option<(WindowId, WindowId)>,
    pub(crate) reorder: Option<ReorderSession>,
    pub(crate) next_generation: u64,
}

impl TilingOrchestrator {
    pub fn new(settings: Settings) -> Self {
        Self {
            edge: EdgeTilingEngine::new(settings.clone()),
            settings,
            swaps: WorkspaceSwaps::default(),
            pending_swap: None,
            reorder: None,
            next_generation: 0,
        }
    }

    /// Full layout pass for one workspace/monitor pair. Returns whether
    /// every mosaic window was placed.
    ///
    /// `reference` names the window that triggered the pass (a new or
    /// focused window); on overflow it is the one migrated to a fresh
    /// workspace. `keep_oversized` suppresses that migration, which the
    /// reorder session uses so a provisional arrangement can fail softly.
    /// `exclude` drops one window from the pass entirely, for a dragged
    /// window currently hovering an edge zone.
    pub fn tile_workspace_windows(
        &mut self,
        host: &mut dyn WindowServer,
        animator: &mut dyn Animator,
        workspace: WorkspaceId,
        monitor: MonitorId,
        reference: Option<WindowId>,
        keep_oversized: bool,
        exclude: Option<WindowId>,
    ) -> bool {
        let area = host.work_area(workspace, monitor);
        let occupancy = self.edge.occupancy(host, workspace, monitor);

        let infos: Vec<_> = self
            .edge
            .mosaic_windows(host, workspace, monitor)
            .into_iter()
            .filter(|info| Some(info.id) != exclude)
            .collect();
        if infos.is_empty() {
            return true;
        }

        // Both sides tiled leaves no mosaic space at all; the mosaic set
        // moves out wholesale rather than packing into a zero-width strip.
        if occupancy.both_sides_occupied() {
            let target = host.create_workspace();
            debug!(?target, windows = infos.len(), "no mosaic space left, migrating");
            for info in &infos {
                host.move_to_workspace(info.id, target);
            }
            // The committed ordering left with the windows.
            self.swaps.clear_workspace(workspace);
            host.activate_workspace(target);
            return false;
        }

        let remaining = zones::remaining_space(area, &occupancy);
        let mut descriptors: Vec<WindowDescriptor> = infos
            .iter()
            .enumerate()
            .map(|(index, info)| WindowDescriptor::new(info.id, info.frame, index))
            .collect();
        self.swaps.apply_all(workspace, &mut descriptors);
        if let Some((a, b)) = self.pending_swap {
            swaps::apply_swap(&mut descriptors, a, b);
        }

        let mut layout = mosaic::pack(&descriptors, remaining, self.settings.spacing);
        // A maximized or fullscreen window anywhere on the monitor, tiled
        // or not, cannot share it with the mosaic. Exempt only the case
        // where the maximized window is the sole thing being packed.
        let maximized_conflict = host
            .windows_on(workspace, monitor)
            .into_iter()
            .filter_map(|id| host.window_info(id))
            .filter(|info| info.is_maximized || info.is_fullscreen)
            .any(|max| descriptors.iter().any(|d| d.id != max.id));
        let overflow = layout.overflow || maximized_conflict;

        if overflow && !keep_oversized {
            if let Some(moved) = reference.filter(|r| descriptors.iter().any(|d| d.id == *r)) {
                let target = host.create_workspace();
                debug!(?moved, ?target, "mosaic overflow, migrating reference window");
                host.move_to_workspace(moved, target);
                host.activate_workspace(target);
                descriptors.retain(|d| d.id != moved);
                layout = mosaic::pack(&descriptors, remaining, self.settings.spacing);
                self.realize(host, animator, &layout.placements);
                return false;
            }
        }

        trace!(
            workspace = workspace.get(),
            windows = descriptors.len(),
            rows = layout.levels.len(),
            overflow,
            "mosaic pass"
        );
        self.realize(host, animator, &layout.placements);
        !overflow
    }

    fn realize(
        &mut self,
        host: &mut dyn WindowServer,
        animator: &mut dyn Animator,
        placements: &[(WindowId, Rect)],
    ) {
        let dragged = self.reorder.as_ref().map(|s| s.window);
        let moves: Vec<(WindowId, Rect)> = placements
            .iter()
            .filter(|(id, _)| Some(*id) != dragged)
            .copied()
            .collect();
        // Mid-drag previews apply immediately; animating them would fight
        // the tick cadence.
        if self.settings.animate && dragged.is_none() {
            animator.animate(&moves);
        } else {
            for (id, rect) in moves {
                host.set_frame(id, rect);
            }
        }
    }

    /// Whether `window` would fit the workspace's mosaic without overflow.
    /// Purely predictive: no geometry is touched.
    pub fn can_fit_window(
        &self,
        host: &dyn WindowServer,
        window: WindowId,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> bool {
        let Some(info) = host.window_info(window) else { return false };
        // A fullscreen window covers the workspace alone by definition.
        if info.is_fullscreen {
            return true;
        }

        let area = host.work_area(workspace, monitor);
        let occupancy = self.edge.occupancy(host, workspace, monitor);
        if occupancy.both_sides_occupied() {
            return false;
        }
        // Any other maximized or fullscreen window on the monitor blocks
        // the fit, whether it sits in the mosaic or in a tile.
        let blocked = host
            .windows_on(workspace, monitor)
            .into_iter()
            .filter(|id| *id != window)
            .filter_map(|id| host.window_info(id))
            .any(|other| other.is_maximized || other.is_fullscreen);
        if blocked {
            return false;
        }
        let residents = self.edge.mosaic_windows(host, workspace, monitor);

        // An unmapped candidate has no usable frame yet; pack a minimum
        // tile in its stead.
        let candidate_frame = if info.frame.is_degenerate() {
            Rect::new(0.0, 0.0, self.settings.min_tile_width, self.settings.min_tile_height)
        } else {
            info.frame
        };

        let mut descriptors: Vec<WindowDescriptor> = residents
            .iter()
            .filter(|r| r.id != window)
            .enumerate()
            .map(|(index, r)| WindowDescriptor::new(r.id, r.frame, index))
            .collect();
        descriptors.push(WindowDescriptor::new(window, candidate_frame, descriptors.len()));

        let remaining = zones::remaining_space(area, &occupancy);
        !mosaic::pack(&descriptors, remaining, self.settings.spacing).overflow
    }

    /// Entry point for fired deferred tasks.
    pub fn run_task(
        &mut self,
        host: &mut dyn WindowServer,
        animator: &mut dyn Animator,
        task: DeferredTask,
    ) -> EventResponse {
        match task {
            DeferredTask::Retile { workspace, monitor } => {
                self.tile_workspace_windows(host, animator, workspace, monitor, None, false, None);
                EventResponse::none()
            }
            DeferredTask::ReorderTick { generation } => {
                self.on_reorder_tick(host, animator, generation)
            }
            DeferredTask::ReorderTimeout { generation } => {
                self.on_reorder_timeout(host, animator, generation)
            }
        }
    }

    pub fn apply_tile(
        &mut self,
        host: &mut dyn WindowServer,
        window: WindowId,
        zone: Zone,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Option<EventResponse> {
        self.edge.apply_tile(host, window, zone, workspace, monitor, false)
    }

    pub fn remove_tile(
        &mut self,
        host: &mut dyn WindowServer,
        window: WindowId,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Option<EventResponse> {
        self.edge.remove_tile(host, window, workspace, monitor)
    }

    pub fn on_window_frame_changed(
        &mut self,
        host: &mut dyn WindowServer,
        window: WindowId,
        new_frame: Rect,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> bool {
        self.edge.on_window_frame_changed(host, window, new_frame, workspace, monitor)
    }

    pub fn is_edge_tiled(&self, id: WindowId) -> bool { self.edge.is_edge_tiled(id) }

    pub fn zone_of(&self, id: WindowId) -> Zone { self.edge.zone_of(id) }

    pub fn window_state(&self, id: WindowId) -> Option<&WindowState> {
        self.edge.window_state(id)
    }

    /// Zone a drop at `cursor` would target.
    pub fn detect_zone(
        &self,
        host: &dyn WindowServer,
        cursor: Point,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Zone {
        self.edge.detect_zone(host, cursor, workspace, monitor)
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    /// Forgets a destroyed window everywhere. Ends a reorder session that
    /// was dragging it.
    pub fn remove_window(&mut self, id: WindowId) {
        if self.reorder.as_ref().is_some_and(|s| s.window == id) {
            self.reorder = None;
            self.pending_swap = None;
        }
        if self
            .pending_swap
            .is_some_and(|(a, b)| a == id || b == id)
        {
            self.pending_swap = None;
        }
        self.edge.remove_window(id);
    }

    /// Shutdown: drop every piece of retained state and detach from the
    /// host.
    pub fn clear_all(&mut self, host: &mut dyn WindowServer) {
        self.edge.clear_all(host);
        self.swaps.clear();
        self.pending_swap = None;
        self.reorder = None;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::sys::geometry::Point;
    use crate::sys::window_server::testing::{FakeAnimator, FakeWindowServer};

    const AREA: Rect = Rect {
        origin: Point { x: 0.0, y: 0.0 },
        size: crate::sys::geometry::Size {
            width: 1000.0,
            height: 600.0,
        },
    };

    fn setup() -> (FakeWindowServer, FakeAnimator, TilingOrchestrator) {
        let mut settings = Settings::default();
        settings.animate = false;
        (
            FakeWindowServer::new(AREA),
            FakeAnimator::default(),
            TilingOrchestrator::new(settings),
        )
    }

    fn ws() -> WorkspaceId { FakeWindowServer::workspace() }

    fn mon() -> MonitorId { FakeWindowServer::monitor() }

    fn retile(
        orch: &mut TilingOrchestrator,
        host: &mut FakeWindowServer,
        animator: &mut FakeAnimator,
    ) -> bool {
        orch.tile_workspace_windows(host, animator, ws(), mon(), None, false, None)
    }

    #[test]
    fn mosaic_centers_in_the_full_area_without_tiles() {
        let (mut host, mut anim, mut orch) = setup();
        let a = host.add_window(Rect::new(0.0, 0.0, 300.0, 300.0));
        let b = host.add_window(Rect::new(500.0, 100.0, 300.0, 300.0));

        assert!(retile(&mut orch, &mut host, &mut anim));
        // 300 + 8 + 300 = 608 wide, centered in 1000x600.
        assert_eq!(host.window(a).frame, Rect::new(196.0, 150.0, 300.0, 300.0));
        assert_eq!(host.window(b).frame, Rect::new(504.0, 150.0, 300.0, 300.0));
    }

    #[test]
    fn mosaic_packs_into_space_left_by_an_edge_tile() {
        let (mut host, mut anim, mut orch) = setup();
        let tiled = host.add_window(Rect::new(0.0, 0.0, 600.0, 500.0));
        let floating = host.add_window(Rect::new(0.0, 0.0, 300.0, 200.0));

        orch.apply_tile(&mut host, tiled, Zone::LeftFull, ws(), mon()).unwrap();
        assert!(retile(&mut orch, &mut host, &mut anim));

        // Remaining strip is x 600..1000; the mosaic centers inside it and
        // the tile itself is untouched.
        assert_eq!(host.window(floating).frame, Rect::new(650.0, 200.0, 300.0, 200.0));
        assert_eq!(host.window(tiled).frame, Rect::new(0.0, 0.0, 600.0, 600.0));
    }

    #[test]
    fn committed_swaps_change_packing_order() {
        let (mut host, mut anim, mut orch) = setup();
        let a = host.add_window(Rect::new(0.0, 0.0, 300.0, 300.0));
        let b = host.add_window(Rect::new(0.0, 0.0, 300.0, 300.0));

        assert!(retile(&mut orch, &mut host, &mut anim));
        let first_slot = host.window(a).frame;
        let second_slot = host.window(b).frame;

        orch.swaps.commit(ws(), a, b);
        assert!(retile(&mut orch, &mut host, &mut anim));
        assert_eq!(host.window(a).frame, second_slot);
        assert_eq!(host.window(b).frame, first_slot);
    }

    #[test]
    fn overflow_migrates_the_reference_window() {
        let (mut host, mut anim, mut orch) = setup();
        let a = host.add_window(Rect::new(0.0, 0.0, 600.0, 550.0));
        let b = host.add_window(Rect::new(0.0, 0.0, 600.0, 550.0));

        let fit = orch.tile_workspace_windows(
            &mut host, &mut anim, ws(), mon(), Some(b), false, None,
        );
        // The two cannot share one row or stack; the reference leaves.
        assert!(!fit);
        let target = *host.created_workspaces.first().unwrap();
        assert_eq!(host.window(b).workspace, target);
        assert_eq!(host.active_workspace, target);
        // The survivor still gets packed.
        assert_eq!(host.window(a).frame, Rect::new(200.0, 25.0, 600.0, 550.0));
    }

    #[test]
    fn keep_oversized_suppresses_migration() {
        let (mut host, mut anim, mut orch) = setup();
        let a = host.add_window(Rect::new(0.0, 0.0, 600.0, 550.0));
        let b = host.add_window(Rect::new(0.0, 0.0, 600.0, 550.0));

        let fit = orch.tile_workspace_windows(
            &mut host, &mut anim, ws(), mon(), Some(b), true, None,
        );
        assert!(!fit);
        assert!(host.created_workspaces.is_empty());
        assert_eq!(host.window(a).workspace, ws());
        assert_eq!(host.window(b).workspace, ws());
    }

    #[test]
    fn fully_tiled_workspace_evicts_the_mosaic() {
        let (mut host, mut anim, mut orch) = setup();
        let left = host.add_window(Rect::new(0.0, 0.0, 500.0, 500.0));
        let right = host.add_window(Rect::new(0.0, 0.0, 500.0, 400.0));
        orch.edge.apply_tile(&mut host, left, Zone::LeftFull, ws(), mon(), true).unwrap();
        orch.edge.apply_tile(&mut host, right, Zone::RightFull, ws(), mon(), true).unwrap();
        let floater = host.add_window(Rect::new(100.0, 100.0, 300.0, 200.0));

        orch.swaps.commit(ws(), floater, left);
        assert!(!retile(&mut orch, &mut host, &mut anim));
        let target = *host.created_workspaces.first().unwrap();
        assert_eq!(host.window(floater).workspace, target);
        assert_eq!(host.active_workspace, target);
        // The evicted workspace's ordering went with its windows.
        assert!(orch.swaps.committed(ws()).is_empty());
    }

    #[test]
    fn maximized_window_conflicts_with_the_mosaic() {
        let (mut host, mut anim, mut orch) = setup();
        let a = host.add_window(Rect::new(0.0, 0.0, 300.0, 300.0));
        let big = host.add_window(Rect::new(0.0, 0.0, 400.0, 300.0));
        host.window_mut(big).is_maximized = true;
        host.maximize(big);

        let fit = orch.tile_workspace_windows(
            &mut host, &mut anim, ws(), mon(), Some(big), false, None,
        );
        assert!(!fit);
        let target = *host.created_workspaces.first().unwrap();
        assert_eq!(host.window(big).workspace, target);
        assert_eq!(host.window(a).workspace, ws());
    }

    #[test]
    fn fullscreen_tile_blocks_fit_and_forces_overflow() {
        let (mut host, mut anim, mut orch) = setup();
        let full = host.add_window(Rect::new(0.0, 0.0, 600.0, 500.0));
        orch.apply_tile(&mut host, full, Zone::Fullscreen, ws(), mon()).unwrap();
        assert!(host.window(full).is_maximized);

        // The tiled window leaves the mosaic set, but it still owns the
        // whole monitor; nothing else fits next to it.
        let candidate = host.add_window(Rect::new(0.0, 0.0, 300.0, 200.0));
        assert!(!orch.can_fit_window(&host, candidate, ws(), mon()));

        let fit = orch.tile_workspace_windows(
            &mut host, &mut anim, ws(), mon(), Some(candidate), false, None,
        );
        assert!(!fit);
        let target = *host.created_workspaces.first().unwrap();
        assert_eq!(host.window(candidate).workspace, target);
        assert_eq!(host.window(full).workspace, ws());
    }

    #[test]
    fn sole_maximized_window_packs_fine() {
        let (mut host, mut anim, mut orch) = setup();
        let big = host.add_window(Rect::new(0.0, 0.0, 400.0, 300.0));
        host.maximize(big);

        assert!(retile(&mut orch, &mut host, &mut anim));
        assert!(host.created_workspaces.is_empty());
        assert_eq!(host.window(big).frame, AREA);
    }

    #[test]
    fn animated_pass_batches_instead_of_moving() {
        let (mut host, _, _) = setup();
        let mut orch = TilingOrchestrator::new(Settings::default());
        let mut anim = FakeAnimator::default();
        let a = host.add_window(Rect::new(0.0, 0.0, 300.0, 300.0));

        assert!(retile(&mut orch, &mut host, &mut anim));
        // Geometry goes to the animator, not the host.
        assert_eq!(host.window(a).frame, Rect::new(0.0, 0.0, 300.0, 300.0));
        assert_eq!(anim.batches.len(), 1);
        assert_eq!(anim.batches[0], vec![(a, Rect::new(350.0, 150.0, 300.0, 300.0))]);
    }

    #[test]
    fn can_fit_respects_remaining_space() {
        let (mut host, _, mut orch) = setup();
        let tiled = host.add_window(Rect::new(0.0, 0.0, 600.0, 500.0));
        orch.edge.apply_tile(&mut host, tiled, Zone::LeftFull, ws(), mon(), true).unwrap();

        let small = host.add_window(Rect::new(0.0, 0.0, 300.0, 200.0));
        assert!(orch.can_fit_window(&host, small, ws(), mon()));

        let wide = host.add_window(Rect::new(0.0, 0.0, 700.0, 200.0));
        assert!(!orch.can_fit_window(&host, wide, ws(), mon()));
    }

    #[test]
    fn run_task_retile_repacks() {
        let (mut host, mut anim, mut orch) = setup();
        let a = host.add_window(Rect::new(0.0, 0.0, 300.0, 300.0));

        let response = orch.run_task(
            &mut host,
            &mut anim,
            DeferredTask::Retile { workspace: ws(), monitor: mon() },
        );
        assert!(response.is_empty());
        assert_eq!(host.window(a).frame, Rect::new(350.0, 150.0, 300.0, 300.0));
    }
}
