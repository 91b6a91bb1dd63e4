//! Committed reorder swaps, keyed by workspace.
//!
//! A swap is a transposition of two id-matched entries in the descriptor
//! list, not a geometric operation. The committed list is replayed in order
//! before every packing pass so manual ordering survives window churn.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::common::collections::HashMap;
use crate::layout_engine::mosaic::WindowDescriptor;
use crate::sys::screen::WorkspaceId;
use crate::sys::window_server::WindowId;

/// Exchanges the positions of the two id-matched entries. A transposition
/// naming a window that is not present is a no-op.
pub fn apply_swap(descriptors: &mut [WindowDescriptor], a: WindowId, b: WindowId) -> bool {
    let ia = descriptors.iter().position(|d| d.id == a);
    let ib = descriptors.iter().position(|d| d.id == b);
    match (ia, ib) {
        (Some(ia), Some(ib)) if ia != ib => {
            descriptors.swap(ia, ib);
            true
        }
        _ => false,
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WorkspaceSwaps {
    swaps: HashMap<WorkspaceId, Vec<(WindowId, WindowId)>>,
}

impl WorkspaceSwaps {
    pub fn commit(&mut self, workspace: WorkspaceId, a: WindowId, b: WindowId) {
        if a == b {
            return;
        }
        trace!(?workspace, ?a, ?b, "committing reorder swap");
        self.swaps.entry(workspace).or_default().push((a, b));
    }

    /// Replays every committed swap for the workspace, in commit order.
    pub fn apply_all(&self, workspace: WorkspaceId, descriptors: &mut [WindowDescriptor]) {
        if let Some(swaps) = self.swaps.get(&workspace) {
            for &(a, b) in swaps {
                apply_swap(descriptors, a, b);
            }
        }
    }

    pub fn committed(&self, workspace: WorkspaceId) -> &[(WindowId, WindowId)] {
        self.swaps.get(&workspace).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear_workspace(&mut self, workspace: WorkspaceId) { self.swaps.remove(&workspace); }

    pub fn clear(&mut self) { self.swaps.clear(); }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sys::geometry::Rect;

    fn wid(raw: u64) -> WindowId { WindowId::new(raw) }

    fn descriptors(ids: &[u64]) -> Vec<WindowDescriptor> {
        ids.iter()
            .enumerate()
            .map(|(index, &raw)| {
                WindowDescriptor::new(wid(raw), Rect::new(0.0, 0.0, 100.0, 100.0), index)
            })
            .collect()
    }

    fn order(descs: &[WindowDescriptor]) -> Vec<u64> { descs.iter().map(|d| d.id.get()).collect() }

    #[test]
    fn swap_exchanges_positions() {
        let mut descs = descriptors(&[1, 2, 3]);
        assert!(apply_swap(&mut descs, wid(1), wid(3)));
        assert_eq!(order(&descs), vec![3, 2, 1]);
    }

    #[test]
    fn swap_with_missing_window_is_noop() {
        let mut descs = descriptors(&[1, 2]);
        assert!(!apply_swap(&mut descs, wid(1), wid(7)));
        assert_eq!(order(&descs), vec![1, 2]);
    }

    #[test]
    fn committed_swaps_replay_in_order() {
        let ws = WorkspaceId::new(1);
        let mut swaps = WorkspaceSwaps::default();
        swaps.commit(ws, wid(1), wid(2));
        swaps.commit(ws, wid(2), wid(3));

        let mut descs = descriptors(&[1, 2, 3]);
        swaps.apply_all(ws, &mut descs);
        // (1 2 3) -> (2 1 3) -> (3 1 2)
        assert_eq!(order(&descs), vec![3, 1, 2]);
    }

    #[test]
    fn replay_is_stable_across_passes() {
        let ws = WorkspaceId::new(1);
        let mut swaps = WorkspaceSwaps::default();
        swaps.commit(ws, wid(1), wid(2));

        for _ in 0..3 {
            let mut descs = descriptors(&[1, 2, 3]);
            swaps.apply_all(ws, &mut descs);
            assert_eq!(order(&descs), vec![2, 1, 3]);
        }
    }

    #[test]
    fn self_swap_is_not_recorded() {
        let ws = WorkspaceId::new(1);
        let mut swaps = WorkspaceSwaps::default();
        swaps.commit(ws, wid(1), wid(1));
        assert!(swaps.committed(ws).is_empty());
    }
}
