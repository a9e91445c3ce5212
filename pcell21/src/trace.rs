//!
//! # Traces
//!
//! Constant-width, bounded-curvature paths through a list of waypoints,
//! and the [TraceTemplate] trait through which circuits request them.
//!

// Std-Lib
use std::f64::consts::PI;

// Crates.io
use log::debug;
use serde::{Deserialize, Serialize};

// Local imports
use crate::{
    geom::{arc_segments, normalize_angle, Point, Polygon, EPS},
    port::Port,
    route, Cell, Element, Layer, LayoutError, LayoutResult,
};

///
/// # Trace Template
///
/// Produces the connecting [Cell] between two oriented [Port]s.
/// The sole dependency of [crate::Circuit] on path generation.
///
pub trait TraceTemplate {
    /// Minimum bend radius, used to plan waypoints
    fn bend_radius(&self) -> f64;
    /// Create a [Cell] named `name` following `waypoints`
    fn build(&self, name: &str, waypoints: &[Point]) -> LayoutResult<Cell>;
    /// Create a [Cell] named `name` connecting port `from` to port `to`.
    /// The path leaves `from` along its direction, and arrives at `to` against its direction.
    fn connect(&self, name: &str, from: &Port, to: &Port) -> LayoutResult<Cell> {
        let waypoints = route::waypoints(from, to, self.bend_radius());
        debug!("Routing {} through {:?}", name, waypoints);
        self.build(name, &waypoints)
    }
}

///
/// # Trace
///
/// Waveguide-style path template. Interior corners of the waypoint list are
/// replaced by circular arcs of exactly `bend_radius`, and the resulting
/// centerline is drawn as a ribbon polygon of constant `width`.
///
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Trace {
    pub width: f64,
    pub bend_radius: f64,
    pub port_type: String,
    /// Maximum chord error of arc discretization, in user units
    pub tolerance: f64,
    /// Maximum vertices per ribbon polygon
    pub max_points: usize,
    /// Lateral shift of the ribbon from the centerline, positive to the left.
    /// Ports stay on the centerline.
    pub offset: f64,
    /// Kept last, as TOML writes tables after plain values
    pub layer: Layer,
}
impl Default for Trace {
    fn default() -> Self {
        Self {
            width: 0.45,
            bend_radius: 5.,
            layer: Layer::new(3, 0),
            port_type: "op".into(),
            tolerance: 1e-3,
            max_points: 4000,
            offset: 0.,
        }
    }
}
impl Trace {
    /// Create a [Trace] with default type, tolerance and vertex limit.
    pub fn new(width: f64, bend_radius: f64, layer: impl Into<Layer>) -> LayoutResult<Self> {
        let trace = Self {
            width,
            bend_radius,
            layer: layer.into(),
            ..Default::default()
        };
        trace.validate()?;
        Ok(trace)
    }
    /// Check our parameters for consistency
    pub fn validate(&self) -> LayoutResult<()> {
        if !(self.width > 0.) {
            return Err(LayoutError::InvalidTrace(format!(
                "Width must be positive, got {}",
                self.width
            )));
        }
        if !(self.tolerance > 0.) {
            return Err(LayoutError::InvalidTrace(format!(
                "Tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.bend_radius < self.width / 2. {
            return Err(LayoutError::InvalidTrace(format!(
                "Bend radius {} smaller than half the width {}",
                self.bend_radius, self.width
            )));
        }
        if self.bend_radius < self.width / 2. + self.offset.abs() {
            return Err(LayoutError::InvalidTrace(format!(
                "Offset {} folds the ribbon inside bend radius {}",
                self.offset, self.bend_radius
            )));
        }
        if self.max_points < 4 {
            return Err(LayoutError::InvalidTrace(format!(
                "At least four points per polygon required, got {}",
                self.max_points
            )));
        }
        Ok(())
    }
    /// Compute the centerline through `waypoints`
    pub fn centerline(&self, waypoints: &[Point]) -> LayoutResult<Centerline> {
        self.validate()?;
        if waypoints.len() < 2 {
            return Err(LayoutError::InvalidTrace(format!(
                "At least two waypoints required, got {}",
                waypoints.len()
            )));
        }
        let Corners {
            pts,
            dirs,
            turns,
            tangents,
        } = corners(waypoints, self.bend_radius)?;
        if pts.len() < 2 {
            // All waypoints coincide
            return Ok(Centerline::default());
        }
        let r = self.bend_radius;

        let mut line = Centerline {
            points: vec![pts[0]],
            directions: vec![dirs[0]],
            start_angle: normalize_angle(dirs[0].angle()),
            end_angle: normalize_angle(dirs[dirs.len() - 1].angle()),
        };
        for k in 1..pts.len() - 1 {
            let (din, dout, phi, t) = (dirs[k - 1], dirs[k], turns[k], tangents[k]);
            let start = pts[k] - din * t;
            let end = pts[k] + dout * t;
            // Arc center sits on the inside of the turn
            let normal = if phi > 0. { din.perp() } else { -din.perp() };
            let center = start + normal * r;
            line.push(start, din);
            let n = arc_segments(phi, r, self.tolerance);
            for j in 1..n {
                let frac = phi * j as f64 / n as f64;
                line.push(center + (start - center).rotate(frac), din.rotate(frac));
            }
            line.push(end, dout);
        }
        line.push(pts[pts.len() - 1], dirs[dirs.len() - 1]);
        Ok(line)
    }
    /// Create the ribbon polygon(s) for `waypoints`, in a new [Cell] named `name`.
    ///
    /// The cell carries ports `in` and `out` at the two ends of the path, pointing outward.
    /// Fully coincident waypoints produce an empty cell.
    pub fn build(&self, name: &str, waypoints: &[Point]) -> LayoutResult<Cell> {
        let line = self.centerline(waypoints)?;
        let mut cell = Cell::new(name);
        if line.points.len() < 2 {
            return Ok(cell);
        }
        // Split into chunks which share their end-points, so the polygons abut
        let chunk = (self.max_points / 2).max(2);
        let mut start = 0;
        while start < line.points.len() - 1 {
            let stop = (start + chunk).min(line.points.len());
            let poly = line.ribbon(start..stop, self.width, self.offset);
            cell.add_element(Element::new(self.layer, poly));
            start = stop - 1;
        }
        let (first, last) = (line.points[0], line.points[line.points.len() - 1]);
        cell.add_ports([
            ("in", Port::new(first, line.start_angle + PI, &self.port_type)),
            ("out", Port::new(last, line.end_angle, &self.port_type)),
        ])?;
        Ok(cell)
    }
}
impl TraceTemplate for Trace {
    fn bend_radius(&self) -> f64 {
        self.bend_radius
    }
    fn build(&self, name: &str, waypoints: &[Point]) -> LayoutResult<Cell> {
        Trace::build(self, name, waypoints)
    }
}

/// Simplified waypoints, with segment directions, and the signed turn angle
/// and arc tangent-length at each point (zero at the two ends)
pub(crate) struct Corners {
    pub pts: Vec<Point>,
    pub dirs: Vec<Point>,
    pub turns: Vec<f64>,
    pub tangents: Vec<f64>,
}

/// Analyze the corners of `waypoints` for bends of radius `r`.
/// Fails with [LayoutError::BendRadiusInfeasible] if any segment is too short
/// for the arcs at its two ends.
pub(crate) fn corners(waypoints: &[Point], r: f64) -> LayoutResult<Corners> {
    let pts = simplify(waypoints)?;
    if pts.len() < 2 {
        return Ok(Corners {
            pts,
            dirs: Vec::new(),
            turns: Vec::new(),
            tangents: Vec::new(),
        });
    }
    // Unit directions of each segment
    let dirs = pts
        .windows(2)
        .map(|w| (w[1] - w[0]).normalized().unwrap_or_default())
        .collect::<Vec<_>>();
    let mut turns = vec![0.; pts.len()];
    let mut tangents = vec![0.; pts.len()];
    for k in 1..pts.len() - 1 {
        let (din, dout) = (dirs[k - 1], dirs[k]);
        let phi = din.cross(&dout).atan2(din.dot(&dout));
        if phi.abs() >= PI - 1e-9 {
            return Err(LayoutError::BendRadiusInfeasible {
                segment: k,
                required: f64::INFINITY,
                available: pts[k].dist(&pts[k + 1]),
            });
        }
        turns[k] = phi;
        tangents[k] = r * (phi.abs() / 2.).tan();
    }
    // Each segment must fit the arcs at both of its ends
    for k in 0..pts.len() - 1 {
        let required = tangents[k] + tangents[k + 1];
        let available = pts[k].dist(&pts[k + 1]);
        if required > available + EPS * available.max(1.) {
            return Err(LayoutError::BendRadiusInfeasible {
                segment: k,
                required,
                available,
            });
        }
    }
    Ok(Corners {
        pts,
        dirs,
        turns,
        tangents,
    })
}

/// Remove consecutive duplicates and collinear interior waypoints.
/// Fails on reversals, i.e. a waypoint doubling back along the incoming segment.
fn simplify(waypoints: &[Point]) -> LayoutResult<Vec<Point>> {
    let mut pts: Vec<Point> = Vec::with_capacity(waypoints.len());
    for pt in waypoints {
        if pts.last().map_or(true, |last| last.dist(pt) > EPS) {
            pts.push(*pt);
        }
    }
    let mut rv: Vec<Point> = Vec::with_capacity(pts.len());
    for (k, pt) in pts.iter().enumerate() {
        if k + 1 < pts.len() && !rv.is_empty() {
            let prev = rv[rv.len() - 1];
            let (din, dout) = (*pt - prev, pts[k + 1] - *pt);
            if din.cross(&dout).abs() <= EPS * din.norm() * dout.norm() {
                if din.dot(&dout) < 0. {
                    return Err(LayoutError::BendRadiusInfeasible {
                        segment: rv.len(),
                        required: f64::INFINITY,
                        available: dout.norm(),
                    });
                }
                // Straight through; drop it
                continue;
            }
        }
        rv.push(*pt);
    }
    Ok(rv)
}

///
/// # Centerline
///
/// Discretized centerline of a [Trace], with the unit tangent direction at each point.
/// Arc end-points coincide with their adjacent straight segments and share their tangents.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Centerline {
    pub points: Vec<Point>,
    pub directions: Vec<Point>,
    /// Heading at the first point, radians
    pub start_angle: f64,
    /// Heading at the last point, radians
    pub end_angle: f64,
}
impl Centerline {
    /// Append a point and its direction, skipping repeats of the last point
    fn push(&mut self, pt: Point, dir: Point) {
        if let Some(last) = self.points.last() {
            if last.dist(&pt) < EPS {
                return;
            }
        }
        self.points.push(pt);
        self.directions.push(dir);
    }
    /// Ribbon polygon of `width` around the points in `range`, shifted left by `offset`
    fn ribbon(&self, range: std::ops::Range<usize>, width: f64, offset: f64) -> Polygon {
        let (left, right) = (offset + width / 2., offset - width / 2.);
        let (pts, dirs) = (&self.points[range.clone()], &self.directions[range]);
        let mut points = Vec::with_capacity(2 * pts.len());
        for (p, d) in pts.iter().zip(dirs.iter()) {
            points.push(*p + d.perp() * left);
        }
        for (p, d) in pts.iter().zip(dirs.iter()).rev() {
            points.push(*p + d.perp() * right);
        }
        Polygon { points }
    }
}
