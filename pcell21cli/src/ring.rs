//!
//! # Ring Resonator
//!
//! A ring waveguide side-coupled to a straight bus, with ports at either end of the bus.
//!

// Local imports
use pcell21::{Cell, Element, Layer, LayoutError, LayoutResult, Point, Polygon, Port, Rect};

/// Ring-resonator parameters, in microns
#[derive(Debug, Clone, PartialEq)]
pub struct RingResonator {
    /// Cell name
    pub name: String,
    /// Ring centerline radius
    pub radius: f64,
    /// Edge-to-edge spacing between ring and bus
    pub gap: f64,
    /// Width of both ring and bus waveguides
    pub width: f64,
    /// Maximum deviation of the ring's polygon from a true circle
    pub tolerance: f64,
    pub layer: Layer,
    /// Type of both ports
    pub port_type: String,
}
impl Default for RingResonator {
    fn default() -> Self {
        Self {
            name: "ringres".into(),
            radius: 10.,
            gap: 0.2,
            width: 0.45,
            tolerance: 2e-4,
            layer: Layer::new(3, 0),
            port_type: "op".into(),
        }
    }
}
impl RingResonator {
    /// Half-length of the bus, which spans the ring's outer diameter
    pub fn bus_half_length(&self) -> f64 {
        self.radius + self.width
    }
}

/// Create a ring-resonator [Cell], named by `params.name`.
///
/// The bus runs along the x-axis, centered at the origin.
/// Port `in` faces -x at its left end, and `out` faces +x at its right.
pub fn ring_resonator(params: &RingResonator) -> LayoutResult<Cell> {
    let RingResonator {
        radius,
        gap,
        width,
        tolerance,
        ..
    } = *params;
    if !(width > 0. && gap > 0. && tolerance > 0.) {
        return LayoutError::fail(format!("Invalid ring-resonator parameters {:?}", params));
    }
    if radius <= width / 2. {
        return LayoutError::fail(format!(
            "Ring radius {} must exceed half its width {}",
            radius, width
        ));
    }
    let half = params.bus_half_length();
    let center = Point::new(0., radius + gap + width);
    let mut cell = Cell::new(&params.name);
    let ring = Polygon::ring(center, radius - width / 2., radius + width / 2., tolerance);
    cell.add_elements(ring.into_iter().map(|p| Element::new(params.layer, p)));
    cell.add_element(Element::new(
        params.layer,
        Rect::new(Point::new(-half, -width / 2.), Point::new(half, width / 2.)),
    ));
    cell.add_ports([
        ("in", Port::new((-half, 0.), std::f64::consts::PI, &params.port_type)),
        ("out", Port::new((half, 0.), 0., &params.port_type)),
    ])?;
    Ok(cell)
}
