//! Directional neighbor resolution and keyboard-driven window swapping.
//!
//! The mosaic and the edge tiles form one navigation space: a swap can
//! exchange two mosaic slots, trade a mosaic window against a tile, move a
//! quarter into its empty sibling slot, or expand a quarter over its side.

use tracing::{debug, trace};

use crate::layout_engine::{Direction, Orientation};
use crate::layout_engine::zones::{Side, VerticalHalf, Zone};
use crate::sys::geometry::Rect;
use crate::sys::screen::{MonitorId, WorkspaceId};
use crate::sys::window_server::{Animator, WindowId, WindowServer};

use super::orchestrator::TilingOrchestrator;

/// What a directional move from a given window would hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighborTarget {
    /// Another mosaic window; swapping is a list transposition.
    Mosaic(WindowId),
    /// An occupied edge zone.
    Tiled { id: WindowId, zone: Zone },
    /// An unoccupied zone the window can move into.
    EmptyTile { zone: Zone },
    /// No occupant and no slot either: the window grows over its own side.
    EmptyTileExpand { zone: Zone },
}

impl TilingOrchestrator {
    /// Resolves the neighbor a move from `window` toward `direction` would
    /// target. `None` means the move dead-ends (screen edge, or a mosaic
    /// move with nothing in that direction).
    pub fn find_neighbor(
        &self,
        host: &dyn WindowServer,
        window: WindowId,
        direction: Direction,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Option<NeighborTarget> {
        let zone = self.edge.zone_of(window);
        if zone.is_edge() {
            self.find_tiled_neighbor(host, window, zone, direction, workspace, monitor)
        } else {
            self.find_mosaic_neighbor(host, window, direction, workspace, monitor)
        }
    }

    fn find_tiled_neighbor(
        &self,
        host: &dyn WindowServer,
        window: WindowId,
        zone: Zone,
        direction: Direction,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Option<NeighborTarget> {
        let side = zone.side()?;
        let occupancy = self.edge.occupancy(host, workspace, monitor);

        match direction {
            // Vertical moves only exist inside a quarter pair.
            Direction::Up | Direction::Down => {
                let half = zone.vertical_half()?;
                let toward_sibling = matches!(
                    (half, direction),
                    (VerticalHalf::Top, Direction::Down) | (VerticalHalf::Bottom, Direction::Up)
                );
                if !toward_sibling {
                    return None;
                }
                let sibling_zone = zone.vertical_sibling()?;
                Some(match occupancy.occupant(sibling_zone) {
                    Some(id) => NeighborTarget::Tiled { id, zone: sibling_zone },
                    None => NeighborTarget::EmptyTile { zone: sibling_zone },
                })
            }
            Direction::Left | Direction::Right => {
                let inward = match side {
                    Side::Left => Direction::Right,
                    Side::Right => Direction::Left,
                };
                if direction != inward {
                    return None;
                }
                let opposite = side.opposite();

                // A level-matched quarter across the screen is the most
                // natural trade for a quarter source.
                if let Some(half) = zone.vertical_half() {
                    let matched = Zone::quarter(opposite, half);
                    if let Some(id) = occupancy.occupant(matched) {
                        return Some(NeighborTarget::Tiled { id, zone: matched });
                    }
                }
                if let Some((z, id, _)) = occupancy.side_windows(opposite).first().copied() {
                    return Some(NeighborTarget::Tiled { id, zone: z });
                }
                let frame = host.frame(window)?;
                if let Some(id) =
                    self.nearest_mosaic(host, window, frame, direction, workspace, monitor)
                {
                    return Some(NeighborTarget::Mosaic(id));
                }
                // Nothing across and no mosaic between: a quarter can at
                // least claim the rest of its own side.
                zone.is_quarter()
                    .then_some(NeighborTarget::EmptyTileExpand { zone: side.full_zone() })
            }
        }
    }

    fn find_mosaic_neighbor(
        &self,
        host: &dyn WindowServer,
        window: WindowId,
        direction: Direction,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Option<NeighborTarget> {
        let frame = host.frame(window)?;
        if let Some(id) = self.nearest_mosaic(host, window, frame, direction, workspace, monitor) {
            return Some(NeighborTarget::Mosaic(id));
        }
        // Horizontal fallback: the edge tile on that side, if any. A mosaic
        // move never targets an empty zone.
        let side = match direction {
            Direction::Left => Side::Left,
            Direction::Right => Side::Right,
            Direction::Up | Direction::Down => return None,
        };
        let occupancy = self.edge.occupancy(host, workspace, monitor);
        occupancy
            .side_windows(side)
            .first()
            .map(|&(zone, id, _)| NeighborTarget::Tiled { id, zone })
    }

    /// Nearest mosaic window strictly in `direction` from `frame`.
    /// Horizontal candidates must share vertical span with the source;
    /// distance along the axis decides, the cross axis breaks ties.
    fn nearest_mosaic(
        &self,
        host: &dyn WindowServer,
        window: WindowId,
        frame: Rect,
        direction: Direction,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> Option<WindowId> {
        let from = frame.mid();
        let mut best: Option<(f64, f64, WindowId)> = None;
        for info in self.edge.mosaic_windows(host, workspace, monitor) {
            if info.id == window {
                continue;
            }
            let to = info.frame.mid();
            let (primary, secondary) = match direction {
                Direction::Left => (from.x - to.x, (from.y - to.y).abs()),
                Direction::Right => (to.x - from.x, (from.y - to.y).abs()),
                Direction::Up => (from.y - to.y, (from.x - to.x).abs()),
                Direction::Down => (to.y - from.y, (from.x - to.x).abs()),
            };
            if primary <= 0.0 {
                continue;
            }
            if direction.orientation() == Orientation::Horizontal
                && info.frame.vertical_overlap(&frame) <= 0.0
            {
                continue;
            }
            let candidate = (primary, secondary, info.id);
            if best.is_none_or(|b| (candidate.0, candidate.1) < (b.0, b.1)) {
                best = Some(candidate);
            }
        }
        best.map(|(_, _, id)| id)
    }

    /// Moves `window` toward `direction`, trading places with whatever
    /// [`find_neighbor`] resolves. Returns whether anything changed.
    ///
    /// [`find_neighbor`]: Self::find_neighbor
    pub fn swap_window(
        &mut self,
        host: &mut dyn WindowServer,
        animator: &mut dyn Animator,
        window: WindowId,
        direction: Direction,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> bool {
        let Some(target) = self.find_neighbor(host, window, direction, workspace, monitor) else {
            trace!(?window, ?direction, "no neighbor in direction");
            return false;
        };
        debug!(?window, ?direction, ?target, "swapping");
        let zone = self.edge.zone_of(window);

        let moved = if zone.is_edge() {
            match target {
                NeighborTarget::Mosaic(neighbor) => {
                    // The tile changes hands: the mosaic neighbor inherits
                    // the vacated zone and the source joins the mosaic.
                    self.edge.remove_tile(host, window, workspace, monitor);
                    self.edge
                        .apply_tile(host, neighbor, zone, workspace, monitor, true)
                        .is_some()
                }
                NeighborTarget::Tiled { id, .. } => self.edge.exchange_zones(host, window, id),
                NeighborTarget::EmptyTile { zone }
                | NeighborTarget::EmptyTileExpand { zone } => self
                    .edge
                    .apply_tile(host, window, zone, workspace, monitor, true)
                    .is_some(),
            }
        } else {
            match target {
                NeighborTarget::Mosaic(neighbor) => {
                    self.swaps.commit(workspace, window, neighbor);
                    true
                }
                NeighborTarget::Tiled { id, zone } => {
                    self.edge.remove_tile(host, id, workspace, monitor);
                    self.edge
                        .apply_tile(host, window, zone, workspace, monitor, true)
                        .is_some()
                }
                // find_neighbor never resolves empty targets for a mosaic
                // source.
                NeighborTarget::EmptyTile { .. } | NeighborTarget::EmptyTileExpand { .. } => false,
            }
        };

        if moved {
            self.tile_workspace_windows(host, animator, workspace, monitor, None, true, None);
        }
        moved
    }

    /// Drop-on-zone variant used at drag end: `window` lands on
    /// `target_zone` and trades with its occupant. Dropping on an empty
    /// zone or on itself is not a swap.
    pub fn swap_windows(
        &mut self,
        host: &mut dyn WindowServer,
        animator: &mut dyn Animator,
        window: WindowId,
        target_zone: Zone,
        workspace: WorkspaceId,
        monitor: MonitorId,
    ) -> bool {
        if !target_zone.is_edge() {
            return false;
        }
        let occupancy = self.edge.occupancy(host, workspace, monitor);
        let occupant = occupancy.occupant(target_zone);
        if occupant == Some(window) || occupant.is_none() {
            return false;
        }
        let other = occupant.unwrap();
        debug!(?window, ?other, ?target_zone, "drop swap");

        let moved = if self.edge.is_edge_tiled(window) {
            self.edge.exchange_zones(host, window, other)
        } else {
            self.edge.remove_tile(host, other, workspace, monitor);
            self.edge
                .apply_tile(host, window, target_zone, workspace, monitor, true)
                .is_some()
        };
        if moved {
            self.tile_workspace_windows(host, animator, workspace, monitor, None, true, None);
        }
        moved
    }
}
