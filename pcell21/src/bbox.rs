//!
//! # Rectangular Bounding Boxes and Associated Trait
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::geom::{Point, Shape, ShapeTrait};

/// # Rectangular Bounding Box
///
/// Points `p0` and `p1` represent opposite corners of a bounding rectangle.
/// `p0` is always closest to negative-infinity, in both x and y,
/// and `p1` is always closest to positive-infinity.
///
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BoundBox {
    pub p0: Point,
    pub p1: Point,
}
impl BoundBox {
    /// Create a new [BoundBox] from two [Point]s.
    /// Callers are responsible for ensuring that p0.x <= p1.x, and p0.y <= p1.y.
    fn new(p0: Point, p1: Point) -> Self {
        Self { p0, p1 }
    }
    /// Create a new [BoundBox] from a single [Point].
    /// The resultant [BoundBox] comprises solely the point, having zero area.
    pub fn from_point(pt: Point) -> Self {
        Self { p0: pt, p1: pt }
    }
    /// Create a new [BoundBox] from two points
    pub fn from_points(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }
    /// Create an empty, otherwise invalid [BoundBox]
    pub fn empty() -> Self {
        Self {
            p0: Point::new(f64::INFINITY, f64::INFINITY),
            p1: Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }
    /// Boolean indication of whether a box is empty
    pub fn is_empty(&self) -> bool {
        self.p0.x > self.p1.x || self.p0.y > self.p1.y
    }
    /// Boolean indication of whether [Point] `pt` lies inside our box.
    pub fn contains(&self, pt: &Point) -> bool {
        self.p0.x <= pt.x && self.p1.x >= pt.x && self.p0.y <= pt.y && self.p1.y >= pt.y
    }
    /// Expand an existing [BoundBox] in all directions by `delta`.
    /// Empty boxes stay empty.
    pub fn expand(&mut self, delta: f64) {
        if self.is_empty() {
            return;
        }
        self.p0.x -= delta;
        self.p0.y -= delta;
        self.p1.x += delta;
        self.p1.y += delta;
    }
}

///
/// # Bounding Box Trait
///
/// Methods for interacting with [BoundBox]s.
/// Implementations for [Point]s, [Shape]s, and [BoundBox]s
/// combine into enclosing boxes through [BoundBoxTrait::union].
///
pub trait BoundBoxTrait {
    /// Compute the union with rectangular bounding box `bbox`.
    /// Creates and returns a new [BoundBox].
    fn union(&self, bbox: &BoundBox) -> BoundBox {
        let b = self.bbox();
        BoundBox::new(
            Point::new(b.p0.x.min(bbox.p0.x), b.p0.y.min(bbox.p0.y)),
            Point::new(b.p1.x.max(bbox.p1.x), b.p1.y.max(bbox.p1.y)),
        )
    }
    /// Compute a rectangular bounding box around the implementing type.
    fn bbox(&self) -> BoundBox;
}

impl BoundBoxTrait for BoundBox {
    fn bbox(&self) -> BoundBox {
        self.clone()
    }
}
impl BoundBoxTrait for Point {
    fn bbox(&self) -> BoundBox {
        BoundBox::from_point(*self)
    }
}
impl BoundBoxTrait for Vec<Point> {
    fn bbox(&self) -> BoundBox {
        let mut bbox = BoundBox::empty();
        for pt in self {
            bbox = pt.union(&bbox);
        }
        bbox
    }
}
impl BoundBoxTrait for Shape {
    /// Paths extend half their width to either side of their centerline
    fn bbox(&self) -> BoundBox {
        self.outline().bbox()
    }
}
