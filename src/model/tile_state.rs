//! Per-window tiling state and auto-tile dependency tracking.
//!
//! Both maps are owned by the edge tiling engine and have explicit lifecycle
//! methods; nothing here is ambient or global.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::common::collections::HashMap;
use crate::layout_engine::zones::Zone;
use crate::sys::geometry::Rect;
use crate::sys::window_server::WindowId;

/// State for one edge-tiled window. Created on the first tile action and
/// destroyed when the window is untiled permanently or closed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowState {
    /// Pre-tiling geometry, captured exactly once so it can be restored
    /// verbatim when the tile is removed.
    pub saved_frame: Rect,
    pub zone: Zone,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TileStates {
    states: HashMap<WindowId, WindowState>,
}

impl TileStates {
    /// Captures the pre-tiling frame. Idempotent: a second save while a state
    /// exists is a no-op.
    pub fn save_geometry(&mut self, id: WindowId, frame: Rect) -> &mut WindowState {
        self.states.entry(id).or_insert_with(|| {
            trace!(?id, ?frame, "saving pre-tile geometry");
            WindowState {
                saved_frame: frame,
                zone: Zone::None,
            }
        })
    }

    pub fn get(&self, id: WindowId) -> Option<&WindowState> { self.states.get(&id) }

    pub fn set_zone(&mut self, id: WindowId, zone: Zone) -> bool {
        match self.states.get_mut(&id) {
            Some(state) => {
                state.zone = zone;
                true
            }
            None => false,
        }
    }

    pub fn zone_of(&self, id: WindowId) -> Zone {
        self.states.get(&id).map(|s| s.zone).unwrap_or(Zone::None)
    }

    pub fn is_edge_tiled(&self, id: WindowId) -> bool { self.zone_of(id) != Zone::None }

    pub fn remove(&mut self, id: WindowId) -> Option<WindowState> { self.states.remove(&id) }

    pub fn ids(&self) -> impl Iterator<Item = WindowId> + '_ { self.states.keys().copied() }

    pub fn len(&self) -> usize { self.states.len() }

    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    pub fn clear(&mut self) { self.states.clear(); }
}

/// Directed edges `dependent -> master`, recorded when a lone mosaic window
/// is auto-snapped opposite an edge tile. At most one master per dependent;
/// removing the master releases the dependent.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AutoTileDeps {
    masters: HashMap<WindowId, WindowId>,
}

impl AutoTileDeps {
    pub fn record(&mut self, dependent: WindowId, master: WindowId) {
        trace!(?dependent, ?master, "recording auto-tile dependency");
        self.masters.insert(dependent, master);
    }

    pub fn master_of(&self, dependent: WindowId) -> Option<WindowId> {
        self.masters.get(&dependent).copied()
    }

    /// Drops the dependency owned by this window, if any. Returns whether one
    /// existed.
    pub fn clear_dependent(&mut self, dependent: WindowId) -> bool {
        self.masters.remove(&dependent).is_some()
    }

    /// Removes and returns every window that depended on `master`.
    pub fn release_for_master(&mut self, master: WindowId) -> Vec<WindowId> {
        let dependents: Vec<WindowId> = self
            .masters
            .iter()
            .filter(|(_, m)| **m == master)
            .map(|(d, _)| *d)
            .collect();
        for dependent in &dependents {
            self.masters.remove(dependent);
        }
        dependents
    }

    /// Forgets the window in both roles.
    pub fn remove_window(&mut self, id: WindowId) {
        self.masters.remove(&id);
        self.masters.retain(|_, master| *master != id);
    }

    pub fn clear(&mut self) { self.masters.clear(); }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn wid(raw: u64) -> WindowId { WindowId::new(raw) }

    #[test]
    fn save_geometry_is_idempotent() {
        let mut states = TileStates::default();
        let first = Rect::new(10.0, 10.0, 400.0, 300.0);
        states.save_geometry(wid(1), first);
        states.set_zone(wid(1), Zone::LeftFull);

        // A second save while tiled must not clobber the original frame.
        states.save_geometry(wid(1), Rect::new(0.0, 0.0, 500.0, 600.0));
        assert_eq!(states.get(wid(1)).unwrap().saved_frame, first);
        assert_eq!(states.zone_of(wid(1)), Zone::LeftFull);
    }

    #[test]
    fn zone_defaults_to_none_for_unknown_windows() {
        let states = TileStates::default();
        assert_eq!(states.zone_of(wid(9)), Zone::None);
        assert!(!states.is_edge_tiled(wid(9)));
    }

    #[test]
    fn release_for_master_returns_all_dependents() {
        let mut deps = AutoTileDeps::default();
        deps.record(wid(2), wid(1));
        deps.record(wid(3), wid(1));
        deps.record(wid(4), wid(9));

        let mut released = deps.release_for_master(wid(1));
        released.sort();
        assert_eq!(released, vec![wid(2), wid(3)]);
        assert_eq!(deps.master_of(wid(2)), None);
        assert_eq!(deps.master_of(wid(4)), Some(wid(9)));
    }

    #[test]
    fn at_most_one_master_per_dependent() {
        let mut deps = AutoTileDeps::default();
        deps.record(wid(2), wid(1));
        deps.record(wid(2), wid(5));
        assert_eq!(deps.master_of(wid(2)), Some(wid(5)));
        assert!(deps.release_for_master(wid(1)).is_empty());
    }

    #[test]
    fn remove_window_clears_both_roles() {
        let mut deps = AutoTileDeps::default();
        deps.record(wid(2), wid(1));
        deps.record(wid(1), wid(3));
        deps.remove_window(wid(1));
        assert_eq!(deps.master_of(wid(2)), None);
        assert_eq!(deps.master_of(wid(1)), None);
    }
}
