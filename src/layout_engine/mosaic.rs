//! The mosaic packer: a pure, order-preserving row packer.
//!
//! Windows are packed at their current sizes, left to right, top to bottom.
//! Each row is centered horizontally and the whole block of rows is centered
//! vertically; within a row every window is additionally centered against
//! the row height. Overflow never aborts a pass: an offending window is
//! dropped from the layout and the flag reports it.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::sys::geometry::{Point, Rect, Round};
use crate::sys::window_server::WindowId;

/// Snapshot of one window's frame for a single packing pass. Never persisted
/// across passes; `index` records the pre-swap gather position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowDescriptor {
    pub id: WindowId,
    pub frame: Rect,
    pub index: usize,
}

impl WindowDescriptor {
    pub fn new(id: WindowId, frame: Rect, index: usize) -> Self { Self { id, frame, index } }

    pub fn width(&self) -> f64 { self.frame.width() }

    pub fn height(&self) -> f64 { self.frame.height() }
}

/// One packed row: accumulated extent plus the centering offset it was
/// placed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
    pub windows: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MosaicLayout {
    pub placements: Vec<(WindowId, Rect)>,
    pub levels: Vec<Level>,
    pub total_width: f64,
    pub total_height: f64,
    pub overflow: bool,
    pub anchor: Point,
}

impl MosaicLayout {
    pub fn is_empty(&self) -> bool { self.placements.is_empty() }

    pub fn rect_for(&self, id: WindowId) -> Option<Rect> {
        self.placements.iter().find(|(wid, _)| *wid == id).map(|(_, rect)| *rect)
    }
}

struct Row {
    entries: Vec<usize>,
    width: f64,
    height: f64,
}

/// Packs `descriptors` into `area` in input order. Pure: identical inputs
/// produce identical rectangles. Callers pre-apply any reorder swaps; a swap
/// is a list transposition, not a geometric operation.
pub fn pack(descriptors: &[WindowDescriptor], area: Rect, spacing: f64) -> MosaicLayout {
    if descriptors.is_empty() {
        return MosaicLayout::default();
    }
    if area.is_degenerate() {
        return MosaicLayout {
            overflow: true,
            ..Default::default()
        };
    }

    // Row estimate from the summed widths; informational only, rows are
    // never capped by it.
    let summed: f64 = descriptors.iter().map(|d| d.width() + spacing).sum();
    trace!(
        windows = descriptors.len(),
        estimated_rows = (summed / area.width()).ceil() as usize,
        "packing mosaic"
    );

    let mut rows: Vec<Row> = Vec::new();
    let mut current = Row {
        entries: Vec::new(),
        width: 0.0,
        height: 0.0,
    };
    // Heights of closed rows plus the spacing between them.
    let mut closed_height = 0.0;
    let mut overflow = false;

    for (i, desc) in descriptors.iter().enumerate() {
        let width = desc.width();
        if width > area.width() {
            trace!(id = ?desc.id, width, "descriptor wider than area, dropping");
            overflow = true;
            continue;
        }

        if !current.entries.is_empty() && current.width + spacing + width > area.width() {
            closed_height += if rows.is_empty() { 0.0 } else { spacing } + current.height;
            rows.push(std::mem::replace(&mut current, Row {
                entries: Vec::new(),
                width: 0.0,
                height: 0.0,
            }));
        }

        let row_height = current.height.max(desc.height());
        let block_height = if rows.is_empty() && current.entries.is_empty() {
            row_height
        } else if current.entries.is_empty() {
            closed_height + spacing + row_height
        } else {
            closed_height + if rows.is_empty() { 0.0 } else { spacing } + row_height
        };
        if block_height > area.height() {
            trace!(id = ?desc.id, block_height, "descriptor exceeds area height, dropping");
            overflow = true;
            continue;
        }

        current.width += if current.entries.is_empty() { width } else { spacing + width };
        current.height = row_height;
        current.entries.push(i);
    }
    if !current.entries.is_empty() {
        closed_height += if rows.is_empty() { 0.0 } else { spacing } + current.height;
        rows.push(current);
    }

    let total_height = closed_height;
    let total_width = rows.iter().map(|r| r.width).fold(0.0, f64::max);
    let anchor = Point::new(
        area.left() + (area.width() - total_width) / 2.0,
        area.top() + (area.height() - total_height) / 2.0,
    );

    let mut placements = Vec::new();
    let mut levels = Vec::new();
    let mut y = anchor.y;
    for row in &rows {
        let row_x = area.left() + (area.width() - row.width) / 2.0;
        let mut x = row_x;
        for &i in &row.entries {
            let desc = &descriptors[i];
            // Micro-centering against the row, on top of the block-level
            // macro-centering.
            let window_y = y + (row.height - desc.height()) / 2.0;
            placements.push((
                desc.id,
                Rect::new(x, window_y, desc.width(), desc.height()).round(),
            ));
            x += desc.width() + spacing;
        }
        levels.push(Level {
            width: row.width,
            height: row.height,
            x: row_x,
            y,
            windows: row.entries.len(),
        });
        y += row.height + spacing;
    }

    MosaicLayout {
        placements,
        levels,
        total_width,
        total_height,
        overflow,
        anchor,
    }
}
