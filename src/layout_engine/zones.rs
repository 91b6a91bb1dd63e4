//! Edge zone model: the seven named screen regions a window can be pinned
//! to, cursor-based zone detection, and target rectangle computation.

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

use crate::common::collections::HashMap;
use crate::sys::geometry::{Point, Rect, Round};
use crate::sys::window_server::WindowId;

#[derive(
    Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    #[default]
    None,
    LeftFull,
    RightFull,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Fullscreen,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn full_zone(self) -> Zone {
        match self {
            Side::Left => Zone::LeftFull,
            Side::Right => Zone::RightFull,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalHalf {
    Top,
    Bottom,
}

impl VerticalHalf {
    pub fn opposite(self) -> VerticalHalf {
        match self {
            VerticalHalf::Top => VerticalHalf::Bottom,
            VerticalHalf::Bottom => VerticalHalf::Top,
        }
    }
}

impl Zone {
    pub fn quarter(side: Side, half: VerticalHalf) -> Zone {
        match (side, half) {
            (Side::Left, VerticalHalf::Top) => Zone::TopLeft,
            (Side::Left, VerticalHalf::Bottom) => Zone::BottomLeft,
            (Side::Right, VerticalHalf::Top) => Zone::TopRight,
            (Side::Right, VerticalHalf::Bottom) => Zone::BottomRight,
        }
    }

    pub fn is_quarter(self) -> bool {
        matches!(
            self,
            Zone::TopLeft | Zone::TopRight | Zone::BottomLeft | Zone::BottomRight
        )
    }

    pub fn is_full_side(self) -> bool { matches!(self, Zone::LeftFull | Zone::RightFull) }

    /// Whether the zone carves space out of the work area. Fullscreen covers
    /// everything and `None` is the mosaic-managed state, so neither counts.
    pub fn is_edge(self) -> bool { self.is_quarter() || self.is_full_side() }

    pub fn side(self) -> Option<Side> {
        match self {
            Zone::LeftFull | Zone::TopLeft | Zone::BottomLeft => Some(Side::Left),
            Zone::RightFull | Zone::TopRight | Zone::BottomRight => Some(Side::Right),
            Zone::None | Zone::Fullscreen => None,
        }
    }

    pub fn vertical_half(self) -> Option<VerticalHalf> {
        match self {
            Zone::TopLeft | Zone::TopRight => Some(VerticalHalf::Top),
            Zone::BottomLeft | Zone::BottomRight => Some(VerticalHalf::Bottom),
            _ => None,
        }
    }

    /// The quarter sharing this quarter's side: TopLeft <-> BottomLeft and
    /// TopRight <-> BottomRight.
    pub fn vertical_sibling(self) -> Option<Zone> {
        match self {
            Zone::TopLeft => Some(Zone::BottomLeft),
            Zone::BottomLeft => Some(Zone::TopLeft),
            Zone::TopRight => Some(Zone::BottomRight),
            Zone::BottomRight => Some(Zone::TopRight),
            _ => None,
        }
    }
}

/// Snapshot of edge-tile occupancy for one workspace/monitor pair, with the
/// occupants' current frames. Built fresh before every geometric decision;
/// never cached across passes.
#[derive(Clone, Debug, Default)]
pub struct ZoneOccupancy {
    entries: HashMap<Zone, (WindowId, Rect)>,
}

impl ZoneOccupancy {
    pub fn insert(&mut self, zone: Zone, id: WindowId, frame: Rect) {
        if zone.is_edge() {
            self.entries.insert(zone, (id, frame));
        }
    }

    pub fn occupant(&self, zone: Zone) -> Option<WindowId> {
        self.entries.get(&zone).map(|(id, _)| *id)
    }

    pub fn occupant_frame(&self, zone: Zone) -> Option<Rect> {
        self.entries.get(&zone).map(|(_, frame)| *frame)
    }

    pub fn full_occupant(&self, side: Side) -> Option<(WindowId, Rect)> {
        self.entries.get(&side.full_zone()).copied()
    }

    pub fn quarters_on(&self, side: Side) -> Vec<(Zone, WindowId, Rect)> {
        [VerticalHalf::Top, VerticalHalf::Bottom]
            .into_iter()
            .filter_map(|half| {
                let zone = Zone::quarter(side, half);
                self.entries.get(&zone).map(|(id, frame)| (zone, *id, *frame))
            })
            .collect()
    }

    /// All occupants on a side, full zone first.
    pub fn side_windows(&self, side: Side) -> Vec<(Zone, WindowId, Rect)> {
        let mut out = Vec::new();
        if let Some((id, frame)) = self.full_occupant(side) {
            out.push((side.full_zone(), id, frame));
        }
        out.extend(self.quarters_on(side));
        out
    }

    pub fn side_occupied(&self, side: Side) -> bool { !self.side_windows(side).is_empty() }

    pub fn both_sides_occupied(&self) -> bool {
        self.side_occupied(Side::Left) && self.side_occupied(Side::Right)
    }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Width claimed on a side. Quarters on a side share one width with the
    /// side's full zone, so any occupant frame answers.
    pub fn side_width(&self, side: Side) -> Option<f64> {
        self.side_windows(side).first().map(|(_, _, frame)| frame.width())
    }

    /// Horizontal extent a side's occupants carve out of the work area,
    /// measured from the matching edge of `area`.
    fn side_extent(&self, side: Side, area: Rect) -> f64 {
        self.side_windows(side)
            .iter()
            .map(|(_, _, frame)| match side {
                Side::Left => (frame.right() - area.left()).max(0.0),
                Side::Right => (area.right() - frame.left()).max(0.0),
            })
            .fold(0.0, f64::max)
    }
}

/// Maps a cursor position to the zone a drop there would target.
///
/// The top strip wins over the side strips so a drag into a top corner still
/// maximizes. Side strips split into vertical thirds once the side is
/// occupied: the outer thirds target quarters and the middle third targets
/// the full-side occupant.
pub fn detect_zone(cursor: Point, area: Rect, occupancy: &ZoneOccupancy, threshold: f64) -> Zone {
    if area.is_degenerate() || !area.contains(cursor) {
        return Zone::None;
    }
    if cursor.y <= area.top() + threshold {
        return Zone::Fullscreen;
    }

    let side = if cursor.x <= area.left() + threshold {
        Side::Left
    } else if cursor.x >= area.right() - threshold {
        Side::Right
    } else {
        return Zone::None;
    };

    if !occupancy.side_occupied(side) {
        return side.full_zone();
    }
    let third = area.height() / 3.0;
    if cursor.y < area.top() + third {
        Zone::quarter(side, VerticalHalf::Top)
    } else if cursor.y > area.bottom() - third {
        Zone::quarter(side, VerticalHalf::Bottom)
    } else {
        side.full_zone()
    }
}

const WIDTH_EPSILON: f64 = 1.0;

/// Width for a zone on `side`, honoring the complement rule: an opposite
/// occupant with a usable non-default width implies `area.w - opposite.w` so
/// the pair exactly tiles the work area. With no opposite occupant the
/// window keeps its own width, clamped to the area.
fn zone_width(side: Side, area: Rect, occupancy: &ZoneOccupancy, window_frame: Rect) -> f64 {
    let half = area.width() / 2.0;
    match occupancy.side_width(side.opposite()) {
        Some(opposite_width) => {
            let complement = area.width() - opposite_width;
            if (opposite_width - half).abs() <= WIDTH_EPSILON || complement < WIDTH_EPSILON {
                half
            } else {
                complement
            }
        }
        None => {
            let own = window_frame.width();
            if own <= WIDTH_EPSILON {
                area.width()
            } else {
                own.min(area.width())
            }
        }
    }
}

/// Target rectangle for pinning `window_frame`'s window to `zone`.
///
/// Returns `None` for `Zone::None` or a degenerate work area; callers treat
/// that as a no-op.
pub fn zone_rect(
    zone: Zone,
    area: Rect,
    occupancy: &ZoneOccupancy,
    window_frame: Rect,
) -> Option<Rect> {
    if area.is_degenerate() {
        return None;
    }
    let rect = match zone {
        Zone::None => return None,
        Zone::Fullscreen => area,
        Zone::LeftFull | Zone::RightFull => {
            let side = zone.side().unwrap();
            let width = zone_width(side, area, occupancy, window_frame);
            let x = match side {
                Side::Left => area.left(),
                Side::Right => area.right() - width,
            };
            Rect::new(x, area.top(), width, area.height())
        }
        Zone::TopLeft | Zone::TopRight | Zone::BottomLeft | Zone::BottomRight => {
            let side = zone.side().unwrap();
            let half = zone.vertical_half().unwrap();

            // Width is inherited from any same-side occupant so quarters and
            // the side's full zone always share one width.
            let width = match occupancy.side_width(side) {
                Some(width) => width,
                None => zone_width(side, area, occupancy, window_frame),
            };

            // Height complements an existing opposite-vertical quarter so the
            // pair spans the side without assuming an even split.
            let height = occupancy
                .occupant_frame(zone.vertical_sibling().unwrap())
                .map(|sibling| (area.height() - sibling.height()).max(WIDTH_EPSILON))
                .unwrap_or(area.height() / 2.0);

            let x = match side {
                Side::Left => area.left(),
                Side::Right => area.right() - width,
            };
            let y = match half {
                VerticalHalf::Top => area.top(),
                VerticalHalf::Bottom => area.bottom() - height,
            };
            Rect::new(x, y, width, height)
        }
    };
    Some(rect.round())
}

/// The work-area rectangle left over after subtracting edge-tile occupancy;
/// this is the mosaic packer's input area. Zero width once both sides are
/// occupied.
pub fn remaining_space(area: Rect, occupancy: &ZoneOccupancy) -> Rect {
    let left = occupancy.side_extent(Side::Left, area);
    let right = occupancy.side_extent(Side::Right, area);
    let width = (area.width() - left - right).max(0.0);
    Rect::new(area.left() + left, area.top(), width, area.height())
}
