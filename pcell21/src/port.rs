//!
//! # Ports
//!
//! Typed, oriented connection points of a [crate::Cell].
//!

// Std-Lib
use std::f64::consts::PI;

// Local imports
use crate::geom::{normalize_angle, Point};

/// Angular tolerance for direction comparisons, in radians
pub const ANGLE_TOL: f64 = 1e-9;

///
/// # Port
///
/// A connection point: `position`, outward-pointing `angle` (radians, counter-clockwise
/// from the x-axis), and a free-form `port_type` tag used for compatibility checks.
///
/// Ports are immutable values. Every transformation creates a new [Port],
/// and the angle is always kept normalized into [0, 2π).
///
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    position: Point,
    angle: f64,
    port_type: String,
}
impl Port {
    /// Create a new [Port]. `angle` is normalized into [0, 2π).
    pub fn new(position: impl Into<Point>, angle: f64, port_type: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            angle: normalize_angle(angle),
            port_type: port_type.into(),
        }
    }
    pub fn position(&self) -> Point {
        self.position
    }
    pub fn angle(&self) -> f64 {
        self.angle
    }
    pub fn port_type(&self) -> &str {
        &self.port_type
    }
    /// Rotate about the origin by `rotation` radians, then translate by `translation`.
    pub fn transform(&self, rotation: f64, translation: Point) -> Port {
        Port {
            position: self.position.rotate(rotation) + translation,
            angle: normalize_angle(self.angle + rotation),
            port_type: self.port_type.clone(),
        }
    }
    /// Same location and type, pointing the opposite way
    pub fn reversed(&self) -> Port {
        Port {
            position: self.position,
            angle: normalize_angle(self.angle + PI),
            port_type: self.port_type.clone(),
        }
    }
}
