//! Host-neutral geometry primitives.
//!
//! The layout engine never talks to the compositor's native rectangle types
//! directly; the event glue converts at the boundary.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }

    /// Squared euclidean distance, used for nearest-candidate selection.
    pub fn dist2(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self { Self { width, height } }

    pub fn area(&self) -> f64 { self.width.max(0.0) * self.height.max(0.0) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn left(&self) -> f64 { self.origin.x }

    pub fn right(&self) -> f64 { self.origin.x + self.size.width }

    pub fn top(&self) -> f64 { self.origin.y }

    pub fn bottom(&self) -> f64 { self.origin.y + self.size.height }

    pub fn width(&self) -> f64 { self.size.width }

    pub fn height(&self) -> f64 { self.size.height }

    pub fn mid(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    pub fn area(&self) -> f64 { self.size.area() }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    /// Overlap of the vertical spans of two rects, ignoring horizontal extent.
    pub fn vertical_overlap(&self, other: &Rect) -> f64 {
        (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0)
    }

    pub fn is_degenerate(&self) -> bool { self.size.width <= 0.0 || self.size.height <= 0.0 }

    /// Same rect within a one pixel tolerance per edge. Frame reads from the
    /// host can come back rounded; exact comparison would misclassify our own
    /// writes as user resizes.
    pub fn approx_eq(&self, other: &Rect) -> bool {
        (self.origin.x - other.origin.x).abs() <= 1.0
            && (self.origin.y - other.origin.y).abs() <= 1.0
            && (self.size.width - other.size.width).abs() <= 1.0
            && (self.size.height - other.size.height).abs() <= 1.0
    }
}

pub trait Round {
    fn round(self) -> Self;
}

impl Round for Point {
    fn round(self) -> Self { Point::new(self.x.round(), self.y.round()) }
}

impl Round for Size {
    fn round(self) -> Self { Size::new(self.width.round(), self.height.round()) }
}

impl Round for Rect {
    fn round(self) -> Self {
        Rect {
            origin: self.origin.round(),
            size: self.size.round(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rect_edges_and_mid() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 70.0);
        assert_eq!(r.mid(), Point::new(60.0, 45.0));
    }

    #[test]
    fn contains_is_inclusive_of_edges() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(!r.contains(Point::new(10.1, 5.0)));
    }

    #[test]
    fn vertical_overlap_of_offset_rects() {
        let a = Rect::new(0.0, 0.0, 10.0, 100.0);
        let b = Rect::new(50.0, 60.0, 10.0, 100.0);
        assert_eq!(a.vertical_overlap(&b), 40.0);
        let c = Rect::new(0.0, 200.0, 10.0, 10.0);
        assert_eq!(a.vertical_overlap(&c), 0.0);
    }

    #[test]
    fn approx_eq_tolerates_rounding() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(0.6, 0.0, 99.5, 100.4);
        assert!(a.approx_eq(&b));
        let c = Rect::new(2.0, 0.0, 100.0, 100.0);
        assert!(!a.approx_eq(&c));
    }

    #[test]
    fn round_rect() {
        let r = Rect::new(0.4, 0.6, 99.5, 100.2).round();
        assert_eq!(r, Rect::new(0.0, 1.0, 100.0, 100.0));
    }
}
