pub mod edge_tiling;
pub mod events;
pub mod mosaic;
mod neighbors;
pub mod orchestrator;
mod reorder;
pub mod zones;

use serde::{Deserialize, Serialize};

pub use edge_tiling::EdgeTilingEngine;
pub use events::{Deferred, DeferredTask, EventResponse};
pub use mosaic::{MosaicLayout, WindowDescriptor, pack};
pub use neighbors::NeighborTarget;
pub use orchestrator::TilingOrchestrator;
pub use zones::{Side, VerticalHalf, Zone, ZoneOccupancy};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }
}
