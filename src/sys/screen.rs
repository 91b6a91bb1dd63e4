use serde::{Deserialize, Serialize};

/// A logical workspace as enumerated by the host. The engine never allocates
/// these; it only routes windows between them.
#[derive(
    Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct WorkspaceId(u64);

impl WorkspaceId {
    pub fn new(raw: u64) -> Self { Self(raw) }

    pub fn get(self) -> u64 { self.0 }
}

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct MonitorId(u32);

impl MonitorId {
    pub fn new(raw: u32) -> Self { Self(raw) }

    pub fn get(self) -> u32 { self.0 }
}
