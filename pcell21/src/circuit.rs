//!
//! # Circuits
//!
//! Placement of [Cell] instances, auto-routing of the links between their ports,
//! and re-export of whichever ports remain unlinked.
//!

// Std-Lib
use std::collections::{BTreeMap, HashSet};

// Crates.io
use indexmap::IndexMap;
use log::{debug, info};

// Local imports
use crate::{
    data::{Cell, Instance},
    deps,
    geom::Point,
    port::Port,
    trace::{Trace, TraceTemplate},
    utils::Ptr,
    LayoutError, LayoutResult,
};

/// Reference to a port of an instance, as (instance-name, port-name)
pub type PortRef = (String, String);

/// Key of `port` in a [Circuit]'s port-mapping, `instance.port`
fn port_key(port: &PortRef) -> String {
    format!("{}.{}", port.0, port.1)
}

/// # Link
///
/// Declaration that two instance-ports be connected by a routed trace.
/// The trace leaves `from` and arrives at `to`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub from: PortRef,
    pub to: PortRef,
}
impl Link {
    pub fn new(
        from_inst: impl Into<String>,
        from_port: impl Into<String>,
        to_inst: impl Into<String>,
        to_port: impl Into<String>,
    ) -> Self {
        Self {
            from: (from_inst.into(), from_port.into()),
            to: (to_inst.into(), to_port.into()),
        }
    }
}
impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}->{}", port_key(&self.from), port_key(&self.to))
    }
}

///
/// # Circuit Specification
///
/// Declarative inputs to a [Circuit]: named instances (`pcells`), their placements,
/// and the links among their ports. Instances without an entry in `translations`
/// or `rotations` sit at the origin, un-rotated.
///
/// ```text
/// let spec = CircuitSpec::new("top")
///     .pcell("dev1", &ring)
///     .pcell("dev2", &ring)
///     .translate("dev2", (100., 50.))
///     .rotate("dev2", FRAC_PI_2)
///     .link("dev1", "out", "dev2", "out");
/// ```
///
#[derive(Debug, Clone, Default)]
pub struct CircuitSpec {
    pub name: String,
    /// Instances, in declaration order
    pub pcells: IndexMap<String, Ptr<Cell>>,
    pub translations: BTreeMap<String, Point>,
    /// Rotations, in radians counter-clockwise
    pub rotations: BTreeMap<String, f64>,
    pub links: Vec<Link>,
}
impl CircuitSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Add an instance of `cell` named `inst`
    pub fn pcell(mut self, inst: impl Into<String>, cell: &Ptr<Cell>) -> Self {
        self.pcells.insert(inst.into(), cell.clone());
        self
    }
    /// Move instance `inst` to `loc`
    pub fn translate(mut self, inst: impl Into<String>, loc: impl Into<Point>) -> Self {
        self.translations.insert(inst.into(), loc.into());
        self
    }
    /// Rotate instance `inst` by `angle` radians about its origin
    pub fn rotate(mut self, inst: impl Into<String>, angle: f64) -> Self {
        self.rotations.insert(inst.into(), angle);
        self
    }
    /// Link port `from_port` of `from_inst` to port `to_port` of `to_inst`
    pub fn link(
        mut self,
        from_inst: impl Into<String>,
        from_port: impl Into<String>,
        to_inst: impl Into<String>,
        to_port: impl Into<String>,
    ) -> Self {
        self.links
            .push(Link::new(from_inst, from_port, to_inst, to_port));
        self
    }
}

///
/// # Circuit
///
/// The result of placing and routing a [CircuitSpec].
/// `cell` holds one instance per pcell, plus one per routed link, and carries
/// every unlinked instance-port under the name `instance.port`.
///
/// Construction either fully succeeds or returns an error; there is no partially-routed state.
///
#[derive(Debug, Clone)]
pub struct Circuit {
    pub name: String,
    /// Composite [Cell], suitable for instancing elsewhere, including in other [Circuit]s
    pub cell: Ptr<Cell>,
    /// Unlinked ports, in circuit coordinates
    pub ports: BTreeMap<String, Port>,
    /// Routing cells, one per link, in declaration order
    pub routes: Vec<Ptr<Cell>>,
}
impl Circuit {
    /// Build from `spec`, routing with the default [Trace]
    pub fn new(spec: &CircuitSpec) -> LayoutResult<Self> {
        Self::with_template(spec, &Trace::default())
    }
    /// Build from `spec`, routing each link with `template`
    pub fn with_template(spec: &CircuitSpec, template: &dyn TraceTemplate) -> LayoutResult<Self> {
        // Check that each placement names a declared instance
        for inst in spec.translations.keys().chain(spec.rotations.keys()) {
            if !spec.pcells.contains_key(inst) {
                return Err(LayoutError::UnknownInstance(inst.clone()));
            }
        }
        let global = global_ports(spec)?;

        // Route each link, in declaration order
        let mut linked: HashSet<&PortRef> = HashSet::new();
        let mut routes = Vec::with_capacity(spec.links.len());
        for (k, link) in spec.links.iter().enumerate() {
            let from = global
                .get(&link.from)
                .ok_or_else(|| LayoutError::UnknownPort(port_key(&link.from)))?;
            let to = global
                .get(&link.to)
                .ok_or_else(|| LayoutError::UnknownPort(port_key(&link.to)))?;
            if linked.contains(&link.from) {
                return Err(LayoutError::PortAlreadyLinked(port_key(&link.from)));
            }
            if linked.contains(&link.to) || link.to == link.from {
                return Err(LayoutError::PortAlreadyLinked(port_key(&link.to)));
            }
            if from.port_type() != to.port_type() {
                return Err(LayoutError::IncompatiblePorts {
                    from: format!("{} ({})", port_key(&link.from), from.port_type()),
                    to: format!("{} ({})", port_key(&link.to), to.port_type()),
                });
            }
            let name = format!("{}_link{}", spec.name, k);
            debug!("Routing link {} as {}", link, name);
            let route = template.connect(&name, from, to).map_err(|e| match e {
                LayoutError::BendRadiusInfeasible { .. } => LayoutError::RoutingFailed {
                    link: link.to_string(),
                    source: Box::new(e),
                },
                e => e,
            })?;
            linked.insert(&link.from);
            linked.insert(&link.to);
            routes.push(Ptr::new(route));
        }

        // Everything left unlinked becomes a port of the circuit
        let ports: BTreeMap<String, Port> = global
            .iter()
            .filter(|(key, _)| !linked.contains(key))
            .map(|(key, port)| (port_key(key), port.clone()))
            .collect();

        // And assemble the composite cell
        let mut cell = Cell::new(&spec.name);
        for (inst_name, pcell) in spec.pcells.iter() {
            let (angle, loc) = placement(spec, inst_name);
            cell.add_instance(Instance {
                loc,
                angle,
                ..Instance::new(inst_name, pcell)
            });
        }
        for route in routes.iter() {
            let name = route.read()?.name.clone();
            cell.add_instance(Instance::new(name, route));
        }
        cell.ports = ports.clone();
        info!(
            "Built circuit {}: {} instances, {} routes, {} ports",
            spec.name,
            spec.pcells.len(),
            routes.len(),
            ports.len()
        );
        Ok(Self {
            name: spec.name.clone(),
            cell: Ptr::new(cell),
            ports,
            routes,
        })
    }
    /// Get a reference to exposed port `name`, e.g. `"dev1.in"`
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.get(name)
    }
    /// Cells referenced by our composite cell. See [deps::dependencies].
    pub fn dependencies(&self, recursive: bool) -> LayoutResult<Vec<Ptr<Cell>>> {
        deps::dependencies(&self.cell, recursive)
    }
}

/// (rotation, translation) of instance `inst`, defaulting to the identity
fn placement(spec: &CircuitSpec, inst: &str) -> (f64, Point) {
    let rotation = spec.rotations.get(inst).copied().unwrap_or(0.);
    let translation = spec.translations.get(inst).copied().unwrap_or_default();
    (rotation, translation)
}

/// Every instance-port of `spec`, transformed into circuit coordinates
fn global_ports(spec: &CircuitSpec) -> LayoutResult<BTreeMap<PortRef, Port>> {
    let mut global = BTreeMap::new();
    for (inst_name, pcell) in spec.pcells.iter() {
        let (rotation, translation) = placement(spec, inst_name);
        let pcell = pcell.read()?;
        for (port_name, port) in pcell.ports.iter() {
            global.insert(
                (inst_name.clone(), port_name.clone()),
                port.transform(rotation, translation),
            );
        }
    }
    Ok(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Rect;
    use crate::Element;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    /// Two-port device, ports `in` at (-5, 0) and `out` at (5, 0)
    fn device(name: &str) -> LayoutResult<Ptr<Cell>> {
        let mut cell = Cell::new(name);
        cell.add_element(Element::new(
            (1, 0),
            Rect::new(Point::new(-5., -1.), Point::new(5., 1.)),
        ));
        cell.add_ports([
            ("in", Port::new((-5., 0.), PI, "op")),
            ("out", Port::new((5., 0.), 0., "op")),
        ])?;
        Ok(Ptr::new(cell))
    }
    fn assert_port(port: &Port, x: f64, y: f64, angle: f64) {
        assert_abs_diff_eq!(port.position().x, x, epsilon = 1e-9);
        assert_abs_diff_eq!(port.position().y, y, epsilon = 1e-9);
        assert_abs_diff_eq!(port.angle(), angle, epsilon = 1e-9);
    }

    #[test]
    fn test_declaration_order() -> LayoutResult<()> {
        let dev = device("dev")?;
        let circuit = Circuit::new(
            &CircuitSpec::new("ordered")
                .pcell("zeta", &dev)
                .pcell("alpha", &dev)
                .pcell("mid", &dev)
                .translate("alpha", (0., 20.)),
        )?;
        let cell = circuit.cell.read()?;
        let names: Vec<&str> = cell.insts.iter().map(|i| i.inst_name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_abs_diff_eq!(cell.insts[1].loc.y, 20., epsilon = 1e-12);
        Ok(())
    }
    #[test]
    fn test_no_links() -> LayoutResult<()> {
        let dev = device("dev")?;
        let spec = CircuitSpec::new("c")
            .pcell("a", &dev)
            .pcell("b", &dev)
            .translate("b", (0., 20.))
            .rotate("b", PI);
        let circuit = Circuit::new(&spec)?;
        assert!(circuit.routes.is_empty());
        let names: Vec<&str> = circuit.ports.keys().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["a.in", "a.out", "b.in", "b.out"]);
        assert_port(circuit.port("a.out").unwrap(), 5., 0., 0.);
        assert_port(circuit.port("b.in").unwrap(), 5., 20., 0.);
        assert_port(circuit.port("b.out").unwrap(), -5., 20., PI);
        // The composite carries the same ports
        assert_eq!(circuit.cell.read()?.ports, circuit.ports);
        assert_eq!(circuit.cell.read()?.insts.len(), 2);
        Ok(())
    }
    #[test]
    fn test_link_quarter_turn() -> LayoutResult<()> {
        let dev = device("dev")?;
        let spec = CircuitSpec::new("c")
            .pcell("dev1", &dev)
            .pcell("dev2", &dev)
            .translate("dev2", (100., 50.))
            .rotate("dev2", FRAC_PI_2)
            .link("dev1", "out", "dev2", "out");
        let circuit = Circuit::new(&spec)?;

        assert_eq!(circuit.routes.len(), 1);
        let route = circuit.routes[0].read()?;
        assert_eq!(route.name, "c_link0");
        assert_port(route.port("in").unwrap(), 5., 0., PI);
        assert_port(route.port("out").unwrap(), 100., 55., 3. * FRAC_PI_2);

        let names: Vec<&str> = circuit.ports.keys().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["dev1.in", "dev2.in"]);
        assert_port(circuit.port("dev2.in").unwrap(), 100., 45., 3. * FRAC_PI_2);

        let cell = circuit.cell.read()?;
        assert_eq!(cell.insts.len(), 3);
        assert_eq!(cell.insts[1].angle, FRAC_PI_2);
        assert_eq!(cell.insts[2].inst_name, "c_link0");
        Ok(())
    }
    #[test]
    fn test_coincident_link() -> LayoutResult<()> {
        let dev = device("dev")?;
        let spec = CircuitSpec::new("c")
            .pcell("a", &dev)
            .pcell("b", &dev)
            .translate("b", (10., 0.))
            .link("a", "out", "b", "in");
        let circuit = Circuit::with_template(&spec, &Trace::new(0.5, 50., (3, 0))?)?;
        assert!(circuit.routes[0].read()?.elems.is_empty());
        assert_eq!(circuit.ports.len(), 2);
        Ok(())
    }
    #[test]
    fn test_already_linked() -> LayoutResult<()> {
        let dev = device("dev")?;
        let spec = CircuitSpec::new("c")
            .pcell("a", &dev)
            .pcell("b", &dev)
            .translate("b", (50., 0.))
            .link("a", "out", "b", "in")
            .link("b", "out", "a", "out");
        match Circuit::new(&spec) {
            Err(LayoutError::PortAlreadyLinked(p)) => assert_eq!(p, "a.out"),
            other => panic!("Expected PortAlreadyLinked, got {:?}", other),
        }
        // A port linked to itself
        let spec = CircuitSpec::new("c")
            .pcell("a", &dev)
            .link("a", "out", "a", "out");
        assert!(matches!(
            Circuit::new(&spec),
            Err(LayoutError::PortAlreadyLinked(_))
        ));
        Ok(())
    }
    #[test]
    fn test_unknowns() -> LayoutResult<()> {
        let dev = device("dev")?;
        let spec = CircuitSpec::new("c").pcell("a", &dev).translate("z", (1., 1.));
        match Circuit::new(&spec) {
            Err(LayoutError::UnknownInstance(i)) => assert_eq!(i, "z"),
            other => panic!("Expected UnknownInstance, got {:?}", other),
        }
        let spec = CircuitSpec::new("c")
            .pcell("a", &dev)
            .pcell("b", &dev)
            .link("a", "out", "b", "nope");
        match Circuit::new(&spec) {
            Err(LayoutError::UnknownPort(p)) => assert_eq!(p, "b.nope"),
            other => panic!("Expected UnknownPort, got {:?}", other),
        }
        Ok(())
    }
    #[test]
    fn test_incompatible() -> LayoutResult<()> {
        let dev = device("dev")?;
        let mut pad = Cell::new("pad");
        pad.add_port("p", Port::new((0., 0.), PI, "dc"))?;
        let spec = CircuitSpec::new("c")
            .pcell("a", &dev)
            .pcell("pad", &Ptr::new(pad))
            .translate("pad", (50., 0.))
            .link("a", "out", "pad", "p");
        assert!(matches!(
            Circuit::new(&spec),
            Err(LayoutError::IncompatiblePorts { .. })
        ));
        Ok(())
    }

    /// Plans with a smaller radius than it draws with
    struct Overconfident(Trace);
    impl TraceTemplate for Overconfident {
        fn bend_radius(&self) -> f64 {
            1.
        }
        fn build(&self, name: &str, waypoints: &[Point]) -> LayoutResult<Cell> {
            self.0.build(name, waypoints)
        }
    }
    #[test]
    fn test_routing_failed() -> LayoutResult<()> {
        let dev = device("dev")?;
        let spec = CircuitSpec::new("c")
            .pcell("a", &dev)
            .pcell("b", &dev)
            .translate("b", (45., 3.))
            .link("a", "out", "b", "in");
        match Circuit::with_template(&spec, &Overconfident(Trace::default())) {
            Err(LayoutError::RoutingFailed { link, source }) => {
                assert_eq!(link, "a.out->b.in");
                assert!(matches!(*source, LayoutError::BendRadiusInfeasible { .. }));
            }
            other => panic!("Expected RoutingFailed, got {:?}", other),
        }
        Ok(())
    }
    #[test]
    fn test_nested() -> LayoutResult<()> {
        let dev = device("dev")?;
        let inner = Circuit::new(
            &CircuitSpec::new("inner")
                .pcell("a", &dev)
                .pcell("b", &dev)
                .translate("b", (40., 20.))
                .link("a", "out", "b", "in"),
        )?;
        let outer = Circuit::new(
            &CircuitSpec::new("outer")
                .pcell("x", &inner.cell)
                .pcell("y", &inner.cell)
                .translate("y", (0., 100.)),
        )?;
        assert!(outer.port("x.a.in").is_some());
        assert_port(outer.port("y.b.out").unwrap(), 45., 120., 0.);
        let deps = outer.dependencies(true)?;
        // dev, the one route, and the inner circuit, each once
        assert_eq!(deps.len(), 3);
        assert!(Ptr::ptr_eq(&deps[2], &inner.cell));
        Ok(())
    }
}
