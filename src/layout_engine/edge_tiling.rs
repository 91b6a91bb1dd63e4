//! Edge tiling: pinning windows to the seven screen zones and keeping the
//! resulting pairs geometrically consistent.
//!
//! Per window the state machine is `untiled -> tiled(zone) -> tiled(zone')
//! -> untiled`; fullscreen is reached the same way and treated as a
//! maximize. The engine owns all tiling state and never calls back into the
//! orchestrator; follow-up work flows out as deferred tasks.

use tracing::{debug, trace, warn};

use crate::common::collections::HashMap;
use crate::common::config::Settings;
use crate::layout_engine::events::{DeferredTask, EventResponse};
use crate::layout_engine::zones::{self, Side, VerticalHalf, Zone, ZoneOccupancy};
use crate::model::tile_state::{AutoTileDeps, TileStates, WindowState};
use crate::sys::geometry::{Point, Rect, Round};
use crate::sys::screen::{MonitorId, WorkspaceId};
use crate::sys::window_server::{WindowId, WindowInfo, WindowServer};

pub struct EdgeTilingEngine {
    settings: Settings,
    states: TileStates,
    deps: AutoTileDeps,
    /// Frames this engine itself wrote and has not yet seen acknowledged.
    /// A frame-changed event matching an entry is our own write echoing
    /// back, not a user resize, and must not trigger rebalancing.
    expected_frames: HashMap<WindowId, Rect>,
}

impl EdgeTilingEngine {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            states: TileStates::default(),
            deps: AutoTileDeps::default(),
            expected_frames: HashMap::default(),
        }
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn is_edge_tiled(&self, id: WindowId) -> bool { self.states.is_edge_tiled(id) }

    pub fn zone_of(&self, id: WindowId) -> Zone { self.states.zone_of(id) }

    pub fn window_state(&self, id: WindowId) -> Option<&WindowState> { self.states.get(id) }

    pub fn auto_tile_master_of(&self, id: WindowId) -> Option<WindowId> {
        self.deps.master_of(id)
    }

    /// Current edge occupancy for a workspace/monitor pair.
    pub fn occupancy(
        &self,
        host: &dyn WindowServer,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> ZoneOccupancy {
        self.occupancy_excluding(host, workspace, monitor, None)
    }

    /// Occupancy with one window left out, used while that window is being
    /// re-tiled so its old zone does not constrain its new rectangle.
    pub fn occupancy_excluding(
        &self,
        host: &dyn WindowServer,
        workspace: WorkspaceId,
        monitor: MonitorId,
        exclude: Option<WindowId>,
    ) -> ZoneOccupancy {
        let mut occupancy = ZoneOccupancy::default();
        for id in host.windows_on(workspace, monitor) {
            if Some(id) == exclude {
                continue;
            }
            let zone = self.states.zone_of(id);
            if !zone.is_edge() {
                continue;
            }
            if let Some(frame) = host.frame(id) {
                occupancy.insert(zone, id, frame);
            }
        }
        occupancy
    }

    /// Manageable windows under mosaic management (zone `None`).
    pub fn mosaic_windows(
        &self,
        host: &dyn WindowServer,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Vec<WindowInfo> {
        host.windows_on(workspace, monitor)
            .into_iter()
            .filter_map(|id| host.window_info(id))
            .filter(|info| info.is_manageable() && self.states.zone_of(info.id) == Zone::None)
            .collect()
    }

    /// Zone a drop at `cursor` would target, given current occupancy.
    pub fn detect_zone(
        &self,
        host: &dyn WindowServer,
        cursor: Point,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Zone {
        let area = host.work_area(workspace, monitor);
        let occupancy = self.occupancy(host, workspace, monitor);
        zones::detect_zone(cursor, area, &occupancy, self.settings.edge_zone_threshold)
    }

    fn set_frame_expected(&mut self, host: &mut dyn WindowServer, id: WindowId, frame: Rect) {
        let frame = frame.round();
        self.expected_frames.insert(id, frame);
        host.set_frame(id, frame);
    }

    /// Pins `window` to `zone`. Returns `None` when the request is rejected
    /// (unknown window, non-normal window, resize disallowed, degenerate
    /// geometry); the window is left untouched in that case.
    pub fn apply_tile(
        &mut self,
        host: &mut dyn WindowServer,
        window: WindowId,
        zone: Zone,
        workspace: WorkspaceId,
        monitor: MonitorId,
        skip_overflow_check: bool,
    ) -> Option<EventResponse> {
        if zone == Zone::None {
            return None;
        }
        let info = host.window_info(window)?;
        if !info.is_normal {
            trace!(?window, "refusing to tile non-normal window");
            return None;
        }
        if zone != Zone::Fullscreen && !info.can_resize {
            trace!(?window, "refusing to tile window that disallows resize");
            return None;
        }

        self.states.save_geometry(window, info.frame);
        // Tiling by hand dissolves any auto-snap relationship this window
        // was holding.
        self.deps.clear_dependent(window);

        if zone == Zone::Fullscreen {
            debug!(?window, "tiling to fullscreen (maximize)");
            host.maximize(window);
            self.states.set_zone(window, Zone::Fullscreen);
            return Some(EventResponse::after(
                self.settings.retile_settle(),
                DeferredTask::Retile { workspace, monitor },
            ));
        }

        let area = host.work_area(workspace, monitor);
        let occupancy = self.occupancy_excluding(host, workspace, monitor, Some(window));

        // A zone holds one window; an existing occupant goes back to mosaic.
        if let Some(previous) = occupancy.occupant(zone) {
            if previous != window {
                debug!(?previous, ?zone, "evicting previous zone occupant to mosaic");
                self.untile(host, previous);
            }
        }

        let converted = zone.is_quarter()
            && self.convert_full_to_quarter(host, window, zone, area, &occupancy);
        if !converted {
            let rect = zones::zone_rect(zone, area, &occupancy, info.frame)?;
            self.set_frame_expected(host, window, rect);
            if zone.is_full_side() {
                self.fix_full_pair_overlap(host, zone, rect, area, &occupancy);
            }
        }

        host.subscribe_frame_changes(window);
        self.states.set_zone(window, zone);
        debug!(?window, ?zone, "edge tile applied");

        let mut response = EventResponse::after(
            self.settings.retile_settle(),
            DeferredTask::Retile { workspace, monitor },
        );
        if !skip_overflow_check && zone.is_full_side() {
            response.merge(self.handle_mosaic_overflow(host, window, zone, workspace, monitor));
        }
        Some(response)
    }

    /// Placing a quarter on a side whose full zone is already occupied
    /// splits the side: the sitting tenant takes the other vertical half and
    /// both keep the existing width.
    fn convert_full_to_quarter(
        &mut self,
        host: &mut dyn WindowServer,
        window: WindowId,
        zone: Zone,
        area: Rect,
        occupancy: &ZoneOccupancy,
    ) -> bool {
        let side = match zone.side() {
            Some(side) => side,
            None => return false,
        };
        let Some((sibling, sibling_frame)) = occupancy.full_occupant(side) else {
            return false;
        };

        let half_height = area.height() / 2.0;
        let width = sibling_frame.width();
        let x = match side {
            Side::Left => area.left(),
            Side::Right => area.right() - width,
        };
        let my_half = zone.vertical_half().unwrap();
        let sibling_zone = Zone::quarter(side, my_half.opposite());

        let y_for = |half: VerticalHalf| match half {
            VerticalHalf::Top => area.top(),
            VerticalHalf::Bottom => area.bottom() - half_height,
        };

        debug!(
            ?window,
            ?sibling,
            ?zone,
            "converting full-side occupant to quarter pair"
        );
        self.set_frame_expected(
            host,
            sibling,
            Rect::new(x, y_for(my_half.opposite()), width, half_height),
        );
        self.states.set_zone(sibling, sibling_zone);
        self.set_frame_expected(host, window, Rect::new(x, y_for(my_half), width, half_height));
        true
    }

    /// After placing a full tile, shrink an opposite full occupant that now
    /// overlaps it so the pair exactly tiles the work area.
    fn fix_full_pair_overlap(
        &mut self,
        host: &mut dyn WindowServer,
        zone: Zone,
        rect: Rect,
        area: Rect,
        occupancy: &ZoneOccupancy,
    ) {
        let side = zone.side().unwrap();
        let Some((opposite, opposite_frame)) = occupancy.full_occupant(side.opposite()) else {
            return;
        };
        if opposite_frame.width() + rect.width() <= area.width() + 1.0 {
            return;
        }
        let width = (area.width() - rect.width()).max(self.settings.min_tile_width);
        let x = match side.opposite() {
            Side::Left => area.left(),
            Side::Right => area.right() - width,
        };
        trace!(?opposite, width, "shrinking opposite full tile to complement");
        self.set_frame_expected(host, opposite, Rect::new(x, area.top(), width, area.height()));
    }

    /// Removes `window`'s tile: releases dependents, promotes a surviving
    /// quarter sibling, restores the saved size centered under the cursor,
    /// and defers a repack so the freed space is reclaimed.
    pub fn remove_tile(
        &mut self,
        host: &mut dyn WindowServer,
        window: WindowId,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Option<EventResponse> {
        let state = *self.states.get(window)?;
        debug!(?window, zone = ?state.zone, "removing edge tile");
        host.unsubscribe_frame_changes(window);

        // A dependent tile only exists to complement its master; it follows
        // the master out, recursively.
        for dependent in self.deps.release_for_master(window) {
            trace!(?dependent, master = ?window, "releasing dependent auto-tile");
            self.release_dependent(host, dependent);
        }

        if state.zone.is_quarter() {
            self.promote_sibling_of(host, state.zone, window, workspace, monitor);
        }
        if state.zone == Zone::Fullscreen {
            host.unmaximize(window);
        }

        // Restore the saved size, but reappear where the user is
        // interacting rather than at the saved position.
        let cursor = host.pointer_position();
        let size = state.saved_frame.size;
        let restored = Rect::new(
            cursor.x - size.width / 2.0,
            cursor.y - size.height / 2.0,
            size.width,
            size.height,
        )
        .round();
        host.set_frame(window, restored);

        self.states.remove(window);
        self.expected_frames.remove(&window);

        Some(EventResponse::after(
            self.settings.retile_settle(),
            DeferredTask::Retile { workspace, monitor },
        ))
    }

    /// Untile without cursor repositioning: restore the saved frame in
    /// place. Used for dependent release and zone eviction, where the user
    /// is not interacting with the window itself.
    fn untile(&mut self, host: &mut dyn WindowServer, window: WindowId) {
        let Some(state) = self.states.remove(window) else { return };
        host.unsubscribe_frame_changes(window);
        if state.zone == Zone::Fullscreen {
            host.unmaximize(window);
        }
        host.set_frame(window, state.saved_frame);
        self.expected_frames.remove(&window);
        for dependent in self.deps.release_for_master(window) {
            self.release_dependent(host, dependent);
        }
    }

    fn release_dependent(&mut self, host: &mut dyn WindowServer, dependent: WindowId) {
        self.untile(host, dependent);
    }

    fn promote_sibling_of(
        &mut self,
        host: &mut dyn WindowServer,
        zone: Zone,
        removed: WindowId,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) {
        let sibling_zone = zone.vertical_sibling().unwrap();
        let occupancy = self.occupancy_excluding(host, workspace, monitor, Some(removed));
        let Some(sibling) = occupancy.occupant(sibling_zone) else { return };
        self.promote_quarter_to_full(host, sibling, sibling_zone, workspace, monitor, &occupancy);
    }

    fn promote_quarter_to_full(
        &mut self,
        host: &mut dyn WindowServer,
        window: WindowId,
        zone: Zone,
        workspace: WorkspaceId,
        monitor: MonitorId,
        occupancy: &ZoneOccupancy,
    ) {
        let side = zone.side().unwrap();
        let area = host.work_area(workspace, monitor);
        let Some(frame) = host.frame(window) else { return };

        // The survivor keeps its width; only the height grows, so promotion
        // is rectangle-equal to tiling the window full directly.
        let mut opposite_only = ZoneOccupancy::default();
        for (z, id, f) in occupancy.side_windows(side.opposite()) {
            opposite_only.insert(z, id, f);
        }
        let Some(rect) = zones::zone_rect(side.full_zone(), area, &opposite_only, frame) else {
            return;
        };
        debug!(?window, from = ?zone, to = ?side.full_zone(), "promoting quarter to full");
        self.set_frame_expected(host, window, rect);
        self.states.set_zone(window, side.full_zone());
    }

    /// Promotes a lone surviving quarter on either side to that side's full
    /// zone. Idempotent: sides with zero or two quarters are untouched.
    pub fn check_quarter_expansion(
        &mut self,
        host: &mut dyn WindowServer,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> bool {
        let mut promoted = false;
        for side in [Side::Left, Side::Right] {
            let occupancy = self.occupancy(host, workspace, monitor);
            if occupancy.full_occupant(side).is_some() {
                continue;
            }
            let quarters = occupancy.quarters_on(side);
            if let [(zone, id, _)] = quarters.as_slice() {
                self.promote_quarter_to_full(host, *id, *zone, workspace, monitor, &occupancy);
                promoted = true;
            }
        }
        promoted
    }

    /// Interactive resize propagation. Returns whether a rebalance was
    /// applied. Self-issued writes echoing back are consumed here and never
    /// rebalance, which is what makes the operation re-entrant safe.
    pub fn on_window_frame_changed(
        &mut self,
        host: &mut dyn WindowServer,
        window: WindowId,
        new_frame: Rect,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> bool {
        if let Some(expected) = self.expected_frames.get(&window).copied() {
            self.expected_frames.remove(&window);
            if expected.approx_eq(&new_frame) {
                trace!(?window, "own geometry write acknowledged");
                return false;
            }
            // The host honored a different frame than requested; treat the
            // event as authoritative and fall through.
        }

        let zone = self.states.zone_of(window);
        if !zone.is_edge() {
            return false;
        }
        let area = host.work_area(workspace, monitor);
        let occupancy = self.occupancy_excluding(host, workspace, monitor, Some(window));

        if zone.is_full_side() {
            let side = zone.side().unwrap();
            let Some((partner, _)) = occupancy.full_occupant(side.opposite()) else {
                return false;
            };
            let partner_width = area.width() - new_frame.width();
            if partner_width < self.settings.min_tile_width {
                return self.fix_tiled_pair_sizes(host, workspace, monitor);
            }
            let x = match side.opposite() {
                Side::Left => area.left(),
                Side::Right => area.right() - partner_width,
            };
            trace!(?window, ?partner, partner_width, "rebalancing full pair widths");
            self.set_frame_expected(
                host,
                partner,
                Rect::new(x, area.top(), partner_width, area.height()),
            );
            return true;
        }

        // Quarter pairs rebalance along height.
        let sibling_zone = zone.vertical_sibling().unwrap();
        let Some((sibling, sibling_frame)) = occupancy
            .occupant(sibling_zone)
            .and_then(|id| host.frame(id).map(|f| (id, f)))
        else {
            return false;
        };
        let sibling_height = area.height() - new_frame.height();
        if sibling_height < self.settings.min_tile_height {
            return self.fix_tiled_pair_sizes(host, workspace, monitor);
        }
        let y = match sibling_zone.vertical_half().unwrap() {
            VerticalHalf::Top => area.top(),
            VerticalHalf::Bottom => area.bottom() - sibling_height,
        };
        trace!(?window, ?sibling, sibling_height, "rebalancing quarter pair heights");
        self.set_frame_expected(
            host,
            sibling,
            Rect::new(sibling_frame.left(), y, sibling_frame.width(), sibling_height),
        );
        true
    }

    /// Clamps tiled pairs back to the minimum-size floors after a resize
    /// pushed a partner below them. Applied post-resize; there is no
    /// mid-resize snap-back.
    pub fn fix_tiled_pair_sizes(
        &mut self,
        host: &mut dyn WindowServer,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> bool {
        let area = host.work_area(workspace, monitor);
        let occupancy = self.occupancy(host, workspace, monitor);
        let mut fixed = false;

        if let (Some((left, left_frame)), Some((right, right_frame))) = (
            occupancy.full_occupant(Side::Left),
            occupancy.full_occupant(Side::Right),
        ) {
            let min = self.settings.min_tile_width;
            let (wide, narrow, wide_frame) = if left_frame.width() >= right_frame.width() {
                (left, right, left_frame)
            } else {
                (right, left, right_frame)
            };
            if area.width() - wide_frame.width() < min {
                let wide_width = area.width() - min;
                warn!(?wide, ?narrow, "clamping full pair to minimum width floor");
                let (wide_x, narrow_x) = if wide == left {
                    (area.left(), area.right() - min)
                } else {
                    (area.right() - wide_width, area.left())
                };
                self.set_frame_expected(
                    host,
                    wide,
                    Rect::new(wide_x, area.top(), wide_width, area.height()),
                );
                self.set_frame_expected(
                    host,
                    narrow,
                    Rect::new(narrow_x, area.top(), min, area.height()),
                );
                fixed = true;
            }
        }

        for side in [Side::Left, Side::Right] {
            let quarters = occupancy.quarters_on(side);
            let [(_, top, top_frame), (_, bottom, bottom_frame)] = quarters.as_slice() else {
                continue;
            };
            let min = self.settings.min_tile_height;
            let (tall, short, tall_frame, short_frame) =
                if top_frame.height() >= bottom_frame.height() {
                    (*top, *bottom, *top_frame, *bottom_frame)
                } else {
                    (*bottom, *top, *bottom_frame, *top_frame)
                };
            if area.height() - tall_frame.height() < min {
                let tall_height = area.height() - min;
                warn!(?tall, ?short, "clamping quarter pair to minimum height floor");
                let tall_is_top = tall_frame.top() <= short_frame.top();
                let (tall_y, short_y) = if tall_is_top {
                    (area.top(), area.bottom() - min)
                } else {
                    (area.bottom() - tall_height, area.top())
                };
                self.set_frame_expected(
                    host,
                    tall,
                    Rect::new(tall_frame.left(), tall_y, tall_frame.width(), tall_height),
                );
                self.set_frame_expected(
                    host,
                    short,
                    Rect::new(short_frame.left(), short_y, short_frame.width(), min),
                );
                fixed = true;
            }
        }
        fixed
    }

    /// Consequences of a freshly applied full-side tile for the mosaic set:
    /// a lone mosaic window already spanning most of the remaining width is
    /// auto-snapped opposite; a crowded mosaic migrates wholesale to a new
    /// workspace.
    fn handle_mosaic_overflow(
        &mut self,
        host: &mut dyn WindowServer,
        window: WindowId,
        zone: Zone,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> EventResponse {
        let side = match zone.side() {
            Some(side) => side,
            None => return EventResponse::none(),
        };
        let area = host.work_area(workspace, monitor);
        let occupancy = self.occupancy(host, workspace, monitor);
        let remaining = zones::remaining_space(area, &occupancy);

        let mosaic: Vec<WindowInfo> = self
            .mosaic_windows(host, workspace, monitor)
            .into_iter()
            .filter(|info| info.id != window)
            .collect();
        if mosaic.is_empty() {
            return EventResponse::none();
        }

        if let [lone] = mosaic.as_slice() {
            if remaining.width() > 0.0
                && lone.frame.width() >= self.settings.auto_snap_width_ratio * remaining.width()
            {
                let opposite = side.opposite().full_zone();
                debug!(dependent = ?lone.id, master = ?window, ?opposite, "auto-snapping lone mosaic window");
                let lone_id = lone.id;
                let response = self
                    .apply_tile(host, lone_id, opposite, workspace, monitor, true)
                    .unwrap_or_default();
                self.deps.record(lone_id, window);
                return response;
            }
        }

        let mosaic_area: f64 = mosaic.iter().map(|info| info.frame.area()).sum();
        if mosaic_area > self.settings.migrate_area_ratio * remaining.area() {
            let target = host.create_workspace();
            debug!(
                windows = mosaic.len(),
                ?target,
                "mosaic exceeds remaining space, migrating to new workspace"
            );
            for info in &mosaic {
                host.move_to_workspace(info.id, target);
            }
            host.activate_workspace(target);
        }
        EventResponse::none()
    }

    /// Exchanges zones between two tiled windows directly, without an
    /// intermediate untiling.
    pub fn exchange_zones(
        &mut self,
        host: &mut dyn WindowServer,
        a: WindowId,
        b: WindowId,
    ) -> bool {
        let zone_a = self.states.zone_of(a);
        let zone_b = self.states.zone_of(b);
        if !zone_a.is_edge() || !zone_b.is_edge() || a == b {
            return false;
        }
        let (Some(frame_a), Some(frame_b)) = (host.frame(a), host.frame(b)) else {
            return false;
        };
        debug!(?a, ?b, ?zone_a, ?zone_b, "exchanging zones");
        self.set_frame_expected(host, a, frame_b);
        self.set_frame_expected(host, b, frame_a);
        self.states.set_zone(a, zone_b);
        self.states.set_zone(b, zone_a);
        true
    }

    /// Forgets a destroyed window. No geometry is touched; the window is
    /// gone.
    pub fn remove_window(&mut self, id: WindowId) {
        self.states.remove(id);
        self.deps.remove_window(id);
        self.expected_frames.remove(&id);
    }

    /// Shutdown: unsubscribe every listener and drop all state so nothing
    /// leaks into a disabled instance.
    pub fn clear_all(&mut self, host: &mut dyn WindowServer) {
        let ids: Vec<WindowId> = self.states.ids().collect();
        for id in ids {
            host.unsubscribe_frame_changes(id);
        }
        self.states.clear();
        self.deps.clear();
        self.expected_frames.clear();
    }
}
