//!
//! # Geometry Module
//!
//! Defines the core geometric types including [Point], [Shape], and [Transform],
//! and their core operations.
//!
//! Coordinates are real-valued, in user units (micrometers by default).
//! Conversion to integer database units happens only on GDSII export.
//!

// Std-Lib
use std::f64::consts::{PI, TAU};
use std::ops::{Add, Mul, Neg, Sub};

// Crates.io
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// Distance below which two coordinates are considered coincident
pub const EPS: f64 = 1e-9;
/// Most vertices in any one polygon from [Polygon::ring]
pub const RING_MAX_POINTS: usize = 4000;

/// # Point in two-dimensional layout-space
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}
impl Point {
    /// Create a new [Point] from (x,y) coordinates
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    /// Unit vector at `angle` radians counter-clockwise from the x-axis
    pub fn unit(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }
    /// Rotate about the origin by `angle` radians, counter-clockwise
    pub fn rotate(&self, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point {
            x: cos * self.x - sin * self.y,
            y: sin * self.x + cos * self.y,
        }
    }
    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }
    /// Z-component of the cross product, positive if `other` lies counter-clockwise of `self`
    pub fn cross(&self, other: &Point) -> f64 {
        self.x * other.y - self.y * other.x
    }
    /// Euclidean length
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }
    pub fn dist(&self, other: &Point) -> f64 {
        (*other - *self).norm()
    }
    /// Unit-length vector in our direction. `None` for (near) zero-length vectors.
    pub fn normalized(&self) -> Option<Point> {
        let n = self.norm();
        if n < EPS {
            return None;
        }
        Some(Point::new(self.x / n, self.y / n))
    }
    /// Left-hand (counter-clockwise) perpendicular
    pub fn perp(&self) -> Point {
        Point::new(-self.y, self.x)
    }
    /// Angle from the x-axis, in radians
    pub fn angle(&self) -> f64 {
        self.y.atan2(self.x)
    }
    /// Create a new [Point], transformed from our original location by `trans`
    pub fn transform(&self, trans: &Transform) -> Point {
        let x = trans.a[0][0] * self.x + trans.a[0][1] * self.y + trans.b[0];
        let y = trans.a[1][0] * self.x + trans.a[1][1] * self.y + trans.b[1];
        Self { x, y }
    }
}
impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}
impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}
impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}
impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}
impl From<(f64, f64)> for Point {
    fn from(xy: (f64, f64)) -> Self {
        Self::new(xy.0, xy.1)
    }
}

/// Normalize `angle` into [0, 2π).
/// Values within 1e-12 of 2π snap to zero.
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    if TAU - a < 1e-12 {
        return 0.0;
    }
    a
}
/// Signed difference `a - b`, wrapped into (-π, π]
pub fn angle_diff(a: f64, b: f64) -> f64 {
    let d = normalize_angle(a - b);
    if d > PI {
        d - TAU
    } else {
        d
    }
}

/// # Path
///
/// Open-ended geometric path with non-zero width.
/// Primarily consists of a series of ordered [Point]s along its centerline.
/// Ends are flush with the first and last points, as GDSII path-type 0.
///
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Path {
    pub points: Vec<Point>,
    pub width: f64,
}
/// # Polygon
///
/// Closed n-sided polygon with arbitrary number of vertices.
/// Closure from the last point back to the first is implied;
/// the initial point need not be repeated at the end.
///
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
}
impl Polygon {
    /// Annulus between radii `inner` and `outer` about `center`.
    ///
    /// Each polygon is an annular sector: the outer arc counter-clockwise, then the
    /// inner arc clockwise. Small rings are a single keyhole polygon joined along the
    /// positive x-axis. Larger ones are split into equal sectors of at most
    /// [RING_MAX_POINTS] vertices each.
    pub fn ring(center: Point, inner: f64, outer: f64, tolerance: f64) -> Vec<Self> {
        let n = arc_segments(TAU, outer, tolerance).max(8);
        let per_sector = RING_MAX_POINTS / 2 - 1;
        let sectors = (n + per_sector - 1) / per_sector;
        // Round up to a whole number of segments per sector
        let per_sector = (n + sectors - 1) / sectors;
        let n = per_sector * sectors;
        let at = |k: usize, r: f64| center + Point::unit(TAU * k as f64 / n as f64) * r;
        (0..sectors)
            .map(|s| {
                let (k0, k1) = (s * per_sector, (s + 1) * per_sector);
                let mut points = Vec::with_capacity(2 * (k1 - k0 + 1));
                points.extend((k0..=k1).map(|k| at(k, outer)));
                points.extend((k0..=k1).rev().map(|k| at(k, inner)));
                Self { points }
            })
            .collect()
    }
}
/// Number of chords needed to approximate an arc of `sweep` radians and `radius`
/// with chord error no larger than `tolerance`
pub fn arc_segments(sweep: f64, radius: f64, tolerance: f64) -> usize {
    if radius <= tolerance {
        return 1;
    }
    let max_step = 2.0 * (1.0 - tolerance / radius).acos();
    ((sweep.abs() / max_step).ceil() as usize).max(1)
}
/// # Rectangle
///
/// Axis-aligned rectangle, specified by two opposite corners.
///
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub p0: Point,
    pub p1: Point,
}
impl Rect {
    /// Create from two opposite corners, in either order
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }
}

/// # Shape
///
/// The primary geometric primitive comprising cell geometry.
/// Variants include [Rect], [Polygon], and [Path].
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[enum_dispatch(ShapeTrait)]
pub enum Shape {
    Rect(Rect),
    Polygon(Polygon),
    Path(Path),
}
impl Default for Shape {
    fn default() -> Self {
        Self::Rect(Rect::default())
    }
}

///
/// # ShapeTrait
///
/// Common shape operations, dispatched from the [Shape] enum to its variants by [enum_dispatch].
///
#[enum_dispatch]
pub trait ShapeTrait {
    /// Defining vertices. For [Path]s these are the centerline points.
    fn vertices(&self) -> Vec<Point>;
    /// Points whose bounding box is that of the drawn shape.
    fn outline(&self) -> Vec<Point> {
        self.vertices()
    }
}

impl ShapeTrait for Rect {
    fn vertices(&self) -> Vec<Point> {
        vec![
            self.p0,
            Point::new(self.p1.x, self.p0.y),
            self.p1,
            Point::new(self.p0.x, self.p1.y),
        ]
    }
}
impl ShapeTrait for Polygon {
    fn vertices(&self) -> Vec<Point> {
        self.points.clone()
    }
}
impl ShapeTrait for Path {
    fn vertices(&self) -> Vec<Point> {
        self.points.clone()
    }
    /// Segment corners, offset half our width to either side, plus the mitered
    /// corners at each joint. Ends are flush with the first and last points.
    fn outline(&self) -> Vec<Point> {
        let half = self.width / 2.;
        // (start, end, left-hand normal) of each non-degenerate segment
        let segs: Vec<(Point, Point, Point)> = self
            .points
            .windows(2)
            .filter_map(|w| (w[1] - w[0]).normalized().map(|d| (w[0], w[1], d.perp())))
            .collect();
        if segs.is_empty() {
            return self.points.clone();
        }
        let mut pts = Vec::with_capacity(6 * segs.len());
        for (a, b, n) in segs.iter() {
            let off = *n * half;
            pts.extend([*a + off, *a - off, *b + off, *b - off]);
        }
        for w in segs.windows(2) {
            let (n0, n1, joint) = (w[0].2, w[1].2, w[1].0);
            let denom = 1. + n0.dot(&n1);
            // Reversals have no finite miter
            if denom > EPS {
                let miter = (n0 + n1) * (half / denom);
                pts.extend([joint + miter, joint - miter]);
            }
        }
        pts
    }
}

/// # Matrix-Vector Transformation
///
/// 2x2 rotation-matrix and two-entry translation vector,
/// used for relative movement of [Point]s and [Shape]s.
///
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Rotation / Transformation Matrix
    /// Represented in row-major order
    pub a: [[f64; 2]; 2],
    /// X-Y Translation
    pub b: [f64; 2],
}
impl Transform {
    /// The identity transform, leaving any transformed object unmodified
    pub fn identity() -> Self {
        Self {
            a: [[1., 0.], [0., 1.]],
            b: [0., 0.],
        }
    }
    /// Translation by (x,y)
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            a: [[1., 0.], [0., 1.]],
            b: [x, y],
        }
    }
    /// A transform to rotate by `angle` radians, counter-clockwise
    pub fn rotate(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            a: [[cos, -sin], [sin, cos]],
            b: [0., 0.],
        }
    }
    /// A transform to reflect about the x-axis
    pub fn reflect_vert() -> Self {
        Self {
            a: [[1., 0.], [0., -1.]],
            b: [0., 0.],
        }
    }
    /// Create a transform from instance fields: location, reflection, and rotation (radians).
    /// Reflection is applied first, then rotation, then translation.
    pub fn from_instance(loc: &Point, reflect_vert: bool, angle: f64) -> Self {
        let b = [loc.x, loc.y];
        let (sin, cos) = angle.sin_cos();
        let a = if reflect_vert {
            [[cos, sin], [sin, -cos]]
        } else {
            [[cos, -sin], [sin, cos]]
        };
        Self { a, b }
    }
    /// Create a new [Transform] that is the cascade of `parent` and `child`.
    ///
    /// "Parents" and "children" refer to typical layout-instance hierarchies,
    /// in which each layer of instance has a nested set of transformations relative to its top-level parent.
    /// The child's transform is applied first. The operation is not commutative.
    ///
    pub fn cascade(parent: &Transform, child: &Transform) -> Transform {
        // The result-transform's origin is the parent's origin,
        // plus the parent-transformed child's origin
        let mut b = matvec(&parent.a, &child.b);
        b[0] += parent.b[0];
        b[1] += parent.b[1];
        // And the cascade-matrix is the product of the parent's and child's
        let a = matmul(&parent.a, &child.a);
        Self { a, b }
    }
    /// Boolean indication of whether axis-aligned rectangles stay axis-aligned
    pub fn is_manhattan(&self) -> bool {
        (self.a[0][1].abs() < EPS && self.a[1][0].abs() < EPS)
            || (self.a[0][0].abs() < EPS && self.a[1][1].abs() < EPS)
    }
}
/// Multiply 2x2 matrices, returning a new 2x2 matrix
fn matmul(a: &[[f64; 2]; 2], b: &[[f64; 2]; 2]) -> [[f64; 2]; 2] {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[1][0],
            a[0][0] * b[0][1] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[1][0],
            a[1][0] * b[0][1] + a[1][1] * b[1][1],
        ],
    ]
}
/// Multiply a 2x2 matrix by a 2-entry vector, returning a new 2-entry vector
fn matvec(a: &[[f64; 2]; 2], b: &[f64; 2]) -> [f64; 2] {
    [
        a[0][0] * b[0] + a[0][1] * b[1],
        a[1][0] * b[0] + a[1][1] * b[1],
    ]
}
pub trait TransformTrait {
    /// Apply matrix-vector [Transform] `trans`.
    /// Creates a new shape at a location equal to the transformation of our own.
    fn transform(&self, trans: &Transform) -> Self;
}
impl TransformTrait for Shape {
    /// Rectangles rotated off-axis become [Polygon]s
    fn transform(&self, trans: &Transform) -> Self {
        match self {
            Shape::Rect(r) if trans.is_manhattan() => Shape::Rect(r.transform(trans)),
            Shape::Rect(r) => Shape::Polygon(
                Polygon {
                    points: r.vertices(),
                }
                .transform(trans),
            ),
            Shape::Polygon(p) => Shape::Polygon(p.transform(trans)),
            Shape::Path(p) => Shape::Path(p.transform(trans)),
        }
    }
}
impl TransformTrait for Rect {
    fn transform(&self, trans: &Transform) -> Self {
        Rect::new(self.p0.transform(trans), self.p1.transform(trans))
    }
}
impl TransformTrait for Polygon {
    fn transform(&self, trans: &Transform) -> Self {
        Polygon {
            points: self.points.iter().map(|p| p.transform(trans)).collect(),
        }
    }
}
impl TransformTrait for Path {
    fn transform(&self, trans: &Transform) -> Self {
        Path {
            points: self.points.iter().map(|p| p.transform(trans)).collect(),
            width: self.width,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn assert_pt(p: Point, x: f64, y: f64) {
        assert_abs_diff_eq!(p.x, x, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, y, epsilon = 1e-9);
    }
    #[test]
    fn transform_identity() {
        let shape1 = Shape::Rect(Rect::new(Point::new(0., 0.), Point::new(1., 1.)));
        let shape2 = shape1.transform(&Transform::identity());
        assert_eq!(shape2, shape1);
    }
    #[test]
    fn transform_rotate() {
        let trans = Transform::rotate(FRAC_PI_2);
        let p = Point::new(1., 0.);
        assert_pt(p.transform(&trans), 0., 1.);
        assert_pt(p.transform(&trans).transform(&trans), -1., 0.);
        assert_pt(p.rotate(FRAC_PI_2), 0., 1.);

        // Quarter-turns keep rectangles rectangular
        let rect = Shape::Rect(Rect::new(Point::new(0., 0.), Point::new(2., 1.)));
        match rect.transform(&trans) {
            Shape::Rect(r) => {
                assert_pt(r.p0, -1., 0.);
                assert_pt(r.p1, 0., 2.);
            }
            _ => panic!("Expected a Rect"),
        }
        // And eighth-turns do not
        let rot45 = Transform::rotate(FRAC_PI_2 / 2.);
        assert!(matches!(rect.transform(&rot45), Shape::Polygon(_)));
    }
    #[test]
    fn test_cascade1() {
        let trans1 = Transform::reflect_vert();
        let trans2 = Transform::translate(1., 1.);

        let p = Point::new(1., 1.);
        let cascade1 = Transform::cascade(&trans1, &trans2);
        assert_pt(p.transform(&cascade1), 2., -2.);

        let cascade2 = Transform::cascade(&trans2, &trans1);
        assert_pt(p.transform(&cascade2), 2., 0.);
    }
    #[test]
    fn test_from_instance() {
        // Reflect first, then rotate, then translate
        let trans = Transform::from_instance(&Point::new(10., 0.), true, FRAC_PI_2);
        let manual = Transform::cascade(
            &Transform::translate(10., 0.),
            &Transform::cascade(&Transform::rotate(FRAC_PI_2), &Transform::reflect_vert()),
        );
        let p = Point::new(1., 2.);
        let (p1, p2) = (p.transform(&trans), p.transform(&manual));
        assert_pt(p1, p2.x, p2.y);
        assert_pt(p1, 12., 1.);
    }
    #[test]
    fn test_normalize_angle() {
        assert_abs_diff_eq!(normalize_angle(-FRAC_PI_2), 3. * FRAC_PI_2, epsilon = 1e-12);
        assert_eq!(normalize_angle(TAU), 0.);
        assert_eq!(normalize_angle(TAU - 1e-13), 0.);
        assert_abs_diff_eq!(normalize_angle(5. * PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_diff(0.1, TAU - 0.1), 0.2, epsilon = 1e-12);
    }
    #[test]
    fn test_path_outline() {
        // Ends are flush, sides extend half the width
        let path = Path {
            points: vec![Point::new(0., 0.), Point::new(10., 0.)],
            width: 2.,
        };
        let xs: Vec<f64> = path.outline().iter().map(|p| p.x).collect();
        let ys: Vec<f64> = path.outline().iter().map(|p| p.y).collect();
        assert_eq!(xs.iter().cloned().fold(f64::INFINITY, f64::min), 0.);
        assert_eq!(xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 10.);
        assert_eq!(ys.iter().cloned().fold(f64::INFINITY, f64::min), -1.);
        assert_eq!(ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 1.);

        // A right-angle turn gets its outer miter corner
        let bend = Path {
            points: vec![Point::new(0., 0.), Point::new(10., 0.), Point::new(10., 10.)],
            width: 2.,
        };
        let outline = bend.outline();
        assert!(outline
            .iter()
            .any(|p| p.dist(&Point::new(11., -1.)) < 1e-12));
        // Degenerate paths are just their points
        let dot = Path {
            points: vec![Point::new(3., 4.), Point::new(3., 4.)],
            width: 2.,
        };
        assert_eq!(dot.outline(), dot.points);
    }
    #[test]
    fn test_ring() {
        let tol = 1e-3;
        let center = Point::new(0., 10.);
        let rings = Polygon::ring(center, 4., 6., tol);
        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        let n = ring.points.len();
        assert_eq!(n % 2, 0);
        // Outer vertices on the outer circle, inner on the inner
        assert_abs_diff_eq!(ring.points[0].dist(&center), 6., epsilon = 1e-9);
        assert_abs_diff_eq!(ring.points[n - 1].dist(&center), 4., epsilon = 1e-9);
        // Keyhole joined along the positive x-axis
        assert_pt(ring.points[0], 6., 10.);
        assert_pt(ring.points[n / 2 - 1], 6., 10.);
        assert_pt(ring.points[n - 1], 4., 10.);
        // Chord error within tolerance
        let step = ring.points[0].dist(&ring.points[1]);
        let sagitta = 6. - (36. - step * step / 4.).sqrt();
        assert!(sagitta <= tol + 1e-12);
    }
    #[test]
    fn test_big_ring() {
        let center = Point::new(0., 0.);
        let rings = Polygon::ring(center, 999.5, 1000.5, 1e-5);
        assert!(rings.len() > 1);
        assert!(rings.iter().all(|r| r.points.len() <= RING_MAX_POINTS));
        // Sectors abut, and together close the circle
        for pair in rings.windows(2) {
            let (a, b) = (&pair[0].points, &pair[1].points);
            let k = a.len() / 2 - 1;
            assert_pt(a[k], b[0].x, b[0].y);
        }
        let last = &rings[rings.len() - 1].points;
        assert_pt(last[last.len() / 2 - 1], 1000.5, 0.);
        assert_pt(rings[0].points[0], 1000.5, 0.);
    }
}
