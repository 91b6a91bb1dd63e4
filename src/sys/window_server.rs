//! The window server boundary.
//!
//! Everything the layout engine needs from the compositor is expressed here
//! as traits; the event-dispatch glue owns the real implementation. Keeping
//! this surface narrow is what makes the engine testable without a display
//! server.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::screen::{MonitorId, WorkspaceId};

/// An identifier representing a window.
///
/// Assigned by the host; only valid for the lifetime of the host session and
/// never reused while the window exists.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct WindowId(NonZeroU64);

impl WindowId {
    pub fn new(raw: u64) -> WindowId { WindowId(NonZeroU64::new(raw).unwrap()) }

    pub fn get(self) -> u64 { self.0.get() }
}

/// Snapshot of a window's host-side state at the time of the query.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub frame: Rect,
    pub is_normal: bool,
    pub can_resize: bool,
    pub is_minimized: bool,
    pub is_maximized: bool,
    pub is_fullscreen: bool,
}

impl WindowInfo {
    /// Whether the engine may manage this window at all.
    pub fn is_manageable(&self) -> bool { self.is_normal && !self.is_minimized }
}

/// Host windowing collaborator.
///
/// Lookup methods return `None` for windows that have disappeared; callers
/// treat that as a silent no-op. Mutating methods are fire-and-forget; the
/// host may apply geometry asynchronously and report the result through a
/// frame-changed notification.
pub trait WindowServer {
    fn windows_on(&self, workspace: WorkspaceId, monitor: MonitorId) -> Vec<WindowId>;
    fn window_info(&self, id: WindowId) -> Option<WindowInfo>;

    fn set_frame(&mut self, id: WindowId, frame: Rect);
    fn move_window(&mut self, id: WindowId, origin: Point);
    fn resize_window(&mut self, id: WindowId, size: Size);
    fn maximize(&mut self, id: WindowId);
    fn unmaximize(&mut self, id: WindowId);

    fn move_to_workspace(&mut self, id: WindowId, workspace: WorkspaceId);
    fn create_workspace(&mut self) -> WorkspaceId;
    fn activate_workspace(&mut self, workspace: WorkspaceId);

    fn subscribe_frame_changes(&mut self, id: WindowId);
    fn unsubscribe_frame_changes(&mut self, id: WindowId);

    fn pointer_position(&self) -> Point;
    /// Usable area for a workspace/monitor pair, system chrome excluded.
    fn work_area(&self, workspace: WorkspaceId, monitor: MonitorId) -> Rect;

    fn frame(&self, id: WindowId) -> Option<Rect> { self.window_info(id).map(|i| i.frame) }
}

/// Render collaborator for batched, animated geometry application. Immediate
/// (non-animated) moves go through [`WindowServer::set_frame`] instead.
pub trait Animator {
    fn animate(&mut self, moves: &[(WindowId, Rect)]);
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::common::collections::{HashMap, HashSet};

    #[derive(Clone, Debug)]
    pub struct FakeWindow {
        pub id: WindowId,
        pub workspace: WorkspaceId,
        pub monitor: MonitorId,
        pub frame: Rect,
        pub is_normal: bool,
        pub can_resize: bool,
        pub is_minimized: bool,
        pub is_maximized: bool,
        pub is_fullscreen: bool,
    }

    /// In-memory window server with synchronous geometry application.
    pub struct FakeWindowServer {
        windows: Vec<FakeWindow>,
        next_id: u64,
        next_workspace: u64,
        pub active_workspace: WorkspaceId,
        pub created_workspaces: Vec<WorkspaceId>,
        pub pointer: Point,
        work_areas: HashMap<(WorkspaceId, MonitorId), Rect>,
        pub subscriptions: HashSet<WindowId>,
        default_area: Rect,
    }

    impl FakeWindowServer {
        pub fn new(work_area: Rect) -> Self {
            Self {
                windows: Vec::new(),
                next_id: 1,
                next_workspace: 100,
                active_workspace: Self::workspace(),
                created_workspaces: Vec::new(),
                pointer: Point::default(),
                work_areas: HashMap::default(),
                subscriptions: HashSet::default(),
                default_area: work_area,
            }
        }

        pub fn workspace() -> WorkspaceId { WorkspaceId::new(1) }

        pub fn monitor() -> MonitorId { MonitorId::new(0) }

        pub fn add_window(&mut self, frame: Rect) -> WindowId {
            self.add_window_on(Self::workspace(), Self::monitor(), frame)
        }

        pub fn add_window_on(
            &mut self,
            workspace: WorkspaceId,
            monitor: MonitorId,
            frame: Rect,
        ) -> WindowId {
            let id = WindowId::new(self.next_id);
            self.next_id += 1;
            self.windows.push(FakeWindow {
                id,
                workspace,
                monitor,
                frame,
                is_normal: true,
                can_resize: true,
                is_minimized: false,
                is_maximized: false,
                is_fullscreen: false,
            });
            id
        }

        pub fn remove_window(&mut self, id: WindowId) { self.windows.retain(|w| w.id != id); }

        pub fn set_pointer(&mut self, pointer: Point) { self.pointer = pointer; }

        pub fn window(&self, id: WindowId) -> &FakeWindow {
            self.windows.iter().find(|w| w.id == id).unwrap()
        }

        pub fn window_mut(&mut self, id: WindowId) -> &mut FakeWindow {
            self.windows.iter_mut().find(|w| w.id == id).unwrap()
        }

        fn find(&self, id: WindowId) -> Option<&FakeWindow> {
            self.windows.iter().find(|w| w.id == id)
        }
    }

    impl WindowServer for FakeWindowServer {
        fn windows_on(&self, workspace: WorkspaceId, monitor: MonitorId) -> Vec<WindowId> {
            self.windows
                .iter()
                .filter(|w| w.workspace == workspace && w.monitor == monitor)
                .map(|w| w.id)
                .collect()
        }

        fn window_info(&self, id: WindowId) -> Option<WindowInfo> {
            self.find(id).map(|w| WindowInfo {
                id: w.id,
                frame: w.frame,
                is_normal: w.is_normal,
                can_resize: w.can_resize,
                is_minimized: w.is_minimized,
                is_maximized: w.is_maximized,
                is_fullscreen: w.is_fullscreen,
            })
        }

        fn set_frame(&mut self, id: WindowId, frame: Rect) {
            if let Some(w) = self.windows.iter_mut().find(|w| w.id == id) {
                w.frame = frame;
            }
        }

        fn move_window(&mut self, id: WindowId, origin: Point) {
            if let Some(w) = self.windows.iter_mut().find(|w| w.id == id) {
                w.frame.origin = origin;
            }
        }

        fn resize_window(&mut self, id: WindowId, size: Size) {
            if let Some(w) = self.windows.iter_mut().find(|w| w.id == id) {
                w.frame.size = size;
            }
        }

        fn maximize(&mut self, id: WindowId) {
            let area = self
                .find(id)
                .map(|w| self.work_area(w.workspace, w.monitor))
                .unwrap_or(self.default_area);
            if let Some(w) = self.windows.iter_mut().find(|w| w.id == id) {
                w.is_maximized = true;
                w.frame = area;
            }
        }

        fn unmaximize(&mut self, id: WindowId) {
            if let Some(w) = self.windows.iter_mut().find(|w| w.id == id) {
                w.is_maximized = false;
            }
        }

        fn move_to_workspace(&mut self, id: WindowId, workspace: WorkspaceId) {
            if let Some(w) = self.windows.iter_mut().find(|w| w.id == id) {
                w.workspace = workspace;
            }
        }

        fn create_workspace(&mut self) -> WorkspaceId {
            let ws = WorkspaceId::new(self.next_workspace);
            self.next_workspace += 1;
            self.created_workspaces.push(ws);
            ws
        }

        fn activate_workspace(&mut self, workspace: WorkspaceId) {
            self.active_workspace = workspace;
        }

        fn subscribe_frame_changes(&mut self, id: WindowId) { self.subscriptions.insert(id); }

        fn unsubscribe_frame_changes(&mut self, id: WindowId) { self.subscriptions.remove(&id); }

        fn pointer_position(&self) -> Point { self.pointer }

        fn work_area(&self, workspace: WorkspaceId, monitor: MonitorId) -> Rect {
            self.work_areas
                .get(&(workspace, monitor))
                .copied()
                .unwrap_or(self.default_area)
        }
    }

    /// Records batches without applying them; tests that care about resulting
    /// geometry run the orchestrator with animation disabled instead.
    #[derive(Default)]
    pub struct FakeAnimator {
        pub batches: Vec<Vec<(WindowId, Rect)>>,
    }

    impl Animator for FakeAnimator {
        fn animate(&mut self, moves: &[(WindowId, Rect)]) { self.batches.push(moves.to_vec()); }
    }
}
