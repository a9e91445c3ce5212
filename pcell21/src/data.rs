//!
//! # Cell Data Model
//!
//! Layers, geometric elements, instances, cells, and libraries.
//!

// Std-Lib
use std::collections::BTreeMap;

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::{
    bbox::{BoundBox, BoundBoxTrait},
    geom::{Point, Shape, ShapeTrait, Transform, TransformTrait},
    port::Port,
    utils::{Ptr, PtrList},
    LayoutError, LayoutResult,
};

/// # Layer
///
/// As in GDSII, a pair of numbers identifies each layer:
/// the layer number proper, and a datatype.
///
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Layer {
    pub layer: i16,
    pub datatype: i16,
}
impl Layer {
    pub fn new(layer: i16, datatype: i16) -> Self {
        Self { layer, datatype }
    }
}
impl From<(i16, i16)> for Layer {
    fn from(ld: (i16, i16)) -> Self {
        Self::new(ld.0, ld.1)
    }
}

/// # Distance Units
///
/// The user unit and the database precision, both in meters.
/// Cell coordinates are in user units. Exported GDSII coordinates are
/// integer multiples of the precision.
///
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Units {
    pub user_unit: f64,
    pub precision: f64,
}
impl Default for Units {
    /// Default units are micrometers, with nanometer precision
    fn default() -> Units {
        Units {
            user_unit: 1e-6,
            precision: 1e-9,
        }
    }
}
impl Units {
    /// Database units per user unit
    pub fn db_per_user(&self) -> f64 {
        self.user_unit / self.precision
    }
}

/// # Primitive Geometric Element
///
/// Combines a geometric [Shape] with a [Layer].
///
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub layer: Layer,
    pub inner: Shape,
}
impl Element {
    pub fn new(layer: impl Into<Layer>, inner: impl Into<Shape>) -> Self {
        Self {
            layer: layer.into(),
            inner: inner.into(),
        }
    }
}

/// # Text Annotation
///
/// A string placed at a point on a layer, e.g. a port label.
///
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TextElement {
    /// String Value
    pub string: String,
    pub layer: Layer,
    /// Location
    pub loc: Point,
}

/// Instance of another Cell
#[derive(Debug, Clone)]
pub struct Instance {
    /// Instance Name
    pub inst_name: String,
    /// Cell Definition Reference
    pub cell: Ptr<Cell>,
    /// Location of `cell` origin
    /// regardless of rotation or reflection
    pub loc: Point,
    /// Vertical reflection,
    /// applied *before* rotation
    pub reflect_vert: bool,
    /// Angle of rotation (radians, counter-clockwise)
    pub angle: f64,
}
impl Instance {
    /// Create an un-transformed instance of `cell`, placed at the origin
    pub fn new(inst_name: impl Into<String>, cell: &Ptr<Cell>) -> Self {
        Self {
            inst_name: inst_name.into(),
            cell: cell.clone(),
            loc: Point::default(),
            reflect_vert: false,
            angle: 0.,
        }
    }
    /// Our placement [Transform]
    pub fn transform(&self) -> Transform {
        Transform::from_instance(&self.loc, self.reflect_vert, self.angle)
    }
}

///
/// # Cell
///
/// Geometry, text annotations, named [Port]s, and instances of other [Cell]s.
///
/// Cells are shared among their parents through [Ptr]s, and are
/// treated as immutable once placed.
///
#[derive(Debug, Clone, Default)]
pub struct Cell {
    /// Cell Name
    pub name: String,
    /// Primitive/ Geometric Elements
    pub elems: Vec<Element>,
    /// Text Annotations
    pub annotations: Vec<TextElement>,
    /// Instances
    pub insts: Vec<Instance>,
    /// Ports, by name
    pub ports: BTreeMap<String, Port>,
    /// Original name, if renamed on import
    pub renamed_from: Option<String>,
}
impl Cell {
    /// Create a new and empty Cell named `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Add geometric [Element]s
    pub fn add_elements(&mut self, elems: impl IntoIterator<Item = Element>) {
        self.elems.extend(elems);
    }
    /// Add a single [Element]
    pub fn add_element(&mut self, elem: impl Into<Element>) {
        self.elems.push(elem.into());
    }
    /// Add a text annotation
    pub fn add_annotation(&mut self, text: TextElement) {
        self.annotations.push(text);
    }
    /// Add an [Instance]
    pub fn add_instance(&mut self, inst: Instance) {
        self.insts.push(inst);
    }
    /// Merge `ports` into our port-mapping.
    ///
    /// Fails with [LayoutError::DuplicatePort] if any name is already present,
    /// or repeated within `ports`. Nothing is added unless everything can be.
    pub fn add_ports<S: Into<String>>(
        &mut self,
        ports: impl IntoIterator<Item = (S, Port)>,
    ) -> LayoutResult<()> {
        let mut new = BTreeMap::new();
        for (name, port) in ports {
            let name = name.into();
            if self.ports.contains_key(&name) || new.contains_key(&name) {
                return Err(LayoutError::DuplicatePort(name));
            }
            new.insert(name, port);
        }
        self.ports.append(&mut new);
        Ok(())
    }
    /// Add a single [Port]
    pub fn add_port(&mut self, name: impl Into<String>, port: Port) -> LayoutResult<()> {
        self.add_ports([(name.into(), port)])
    }
    /// Get a reference to port `name`, if present
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.get(name)
    }
    /// Create a rectangular [BoundBox] surrounding all elements of the cell and its instances.
    /// Child geometry is transformed vertex-by-vertex through the cascade of instance transforms.
    pub fn bbox(&self) -> LayoutResult<BoundBox> {
        let mut bbox = BoundBox::empty();
        bbox_helper(self, &Transform::identity(), &mut bbox)?;
        Ok(bbox)
    }
    /// Flatten the hierarchy below us to a vector of [Element]s, in our coordinates
    pub fn flatten(&self) -> LayoutResult<Vec<Element>> {
        // Kick off recursive calls, with the identity-transform applied for the top-level cell
        let mut elems = Vec::new();
        flatten_helper(self, &Transform::identity(), &mut elems)?;
        Ok(elems)
    }
}
/// Internal helper and core logic for [Cell::bbox]
fn bbox_helper(cell: &Cell, trans: &Transform, bbox: &mut BoundBox) -> LayoutResult<()> {
    for elem in cell.elems.iter() {
        let mut ebox = BoundBox::empty();
        for pt in elem.inner.outline() {
            ebox = pt.transform(trans).union(&ebox);
        }
        *bbox = ebox.union(bbox);
    }
    for inst in cell.insts.iter() {
        let trans = Transform::cascade(trans, &inst.transform());
        let child = inst.cell.read()?;
        bbox_helper(&child, &trans, bbox)?;
    }
    Ok(())
}
/// Internal helper and core logic for [Cell::flatten]
fn flatten_helper(cell: &Cell, trans: &Transform, elems: &mut Vec<Element>) -> LayoutResult<()> {
    // Transform each geometric element
    for elem in cell.elems.iter() {
        elems.push(Element {
            layer: elem.layer,
            inner: elem.inner.transform(trans),
        });
    }
    // Note text-valued "annotations" are ignored

    // Visit all of `cell`'s instances, recursively getting their elements
    for inst in cell.insts.iter() {
        // Create a new [Transform], cascading the parent's and instance's
        let trans = Transform::cascade(trans, &inst.transform());
        let child = inst.cell.read()?;
        flatten_helper(&child, &trans, elems)?;
    }
    Ok(())
}

/// # Cell Library
///
/// A named collection of [Cell]s, with [Units], ready for export.
/// Each name appears at most once: adding a different cell under a name already
/// in use fails, whereas re-adding the same cell is a no-op.
///
#[derive(Debug, Clone, Default)]
pub struct Library {
    /// Library Name
    pub name: String,
    /// Distance Units
    pub units: Units,
    /// Cell Definitions
    pub cells: PtrList<Cell>,
    /// Layer on which to label ports upon export, if any
    pub port_labels: Option<Layer>,
}
impl Library {
    /// Create a new and empty Library
    pub fn new(name: impl Into<String>, units: Units) -> Self {
        Self {
            name: name.into(),
            units,
            ..Default::default()
        }
    }
    /// Add `cell`. A no-op if already present.
    pub fn add(&mut self, cell: &Ptr<Cell>) -> LayoutResult<()> {
        if self.cells.contains(cell) {
            return Ok(());
        }
        {
            let new = cell.read()?;
            for existing in self.cells.iter() {
                let existing = existing.read()?;
                if existing.name == new.name {
                    return Err(name_clash(&existing, &new));
                }
            }
        }
        self.cells.insert(cell);
        Ok(())
    }
    /// Add `cell` and all of its dependencies
    pub fn add_with_dependencies(&mut self, cell: &Ptr<Cell>) -> LayoutResult<()> {
        for dep in crate::deps::dependencies(cell, true)? {
            self.add(&dep)?;
        }
        self.add(cell)
    }
    /// Get the cell named `name`, if present
    pub fn cell(&self, name: &str) -> LayoutResult<Option<Ptr<Cell>>> {
        for ptr in self.cells.iter() {
            if ptr.read()?.name == name {
                return Ok(Some(ptr.clone()));
            }
        }
        Ok(None)
    }
}
/// Error for two distinct cells sharing a name.
/// Reported as a rename collision if either was renamed on import.
pub(crate) fn name_clash(a: &Cell, b: &Cell) -> LayoutError {
    if a.renamed_from.is_some() || b.renamed_from.is_some() {
        LayoutError::RenameCollision(b.name.clone())
    } else {
        LayoutError::DuplicateCellName(b.name.clone())
    }
}
