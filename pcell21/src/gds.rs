//!
//! # GDSII Import & Export Module
//!
//! Conversion between [Library]s of [Cell]s and [gds21::GdsLibrary]s.
//!

// Std-Lib
use std::collections::HashMap;

// Crates.io
use log::{debug, info, warn};

// Local imports
use crate::{
    data::{name_clash, Cell, Element, Instance, Layer, Library, TextElement, Units},
    deps,
    geom::{normalize_angle, Path, Point, Polygon, Rect, Shape, ShapeTrait},
    utils::{ErrorContext, ErrorHelper, Ptr},
    LayoutError, LayoutResult,
};

/// Maximum number of distinct vertices in a GDSII boundary
pub const GDS_MAX_POINTS: usize = 8190;

/// # Gds21 Exporter
///
/// Converts a [Library] to a GDSII library ([gds21::GdsLibrary]).
/// Cells are written leaves-first, including any dependencies not explicitly added to the [Library].
///
#[derive(Debug)]
pub struct GdsExporter<'lib> {
    lib: &'lib Library,
    /// Database units per user unit
    scale: f64,
    ctx: Vec<ErrorContext>,
}
impl<'lib> GdsExporter<'lib> {
    pub fn export(lib: &'lib Library) -> LayoutResult<gds21::GdsLibrary> {
        let mut exporter = Self {
            lib,
            scale: lib.units.db_per_user(),
            ctx: vec![ErrorContext::Library(lib.name.clone())],
        };
        exporter.export_lib()
    }
    fn export_lib(&mut self) -> LayoutResult<gds21::GdsLibrary> {
        let units = self.lib.units;
        self.assert(
            units.precision > 0. && units.user_unit > 0.,
            format!("Invalid units {:?}", units),
        )?;
        let mut gds = gds21::GdsLibrary::new(&self.lib.name);
        gds.units = gds21::GdsUnits::new(units.precision / units.user_unit, units.precision);

        let cells = deps::order(self.lib.cells.as_slice())?;
        let mut names: HashMap<String, Ptr<Cell>> = HashMap::new();
        for ptr in cells.iter() {
            let cell = ptr.read()?;
            if let Some(other) = names.get(&cell.name) {
                return Err(name_clash(&*other.read()?, &cell));
            }
            names.insert(cell.name.clone(), ptr.clone());
            gds.structs.push(self.export_cell(&cell)?);
        }
        info!(
            "Exported library {} with {} cells",
            self.lib.name,
            gds.structs.len()
        );
        Ok(gds)
    }
    /// Convert a [Cell] to a [gds21::GdsStruct] cell-definition
    fn export_cell(&mut self, cell: &Cell) -> LayoutResult<gds21::GdsStruct> {
        self.ctx.push(ErrorContext::Cell(cell.name.clone()));
        let mut strukt = gds21::GdsStruct::new(&cell.name);
        for inst in cell.insts.iter() {
            strukt.elems.push(self.export_instance(inst)?.into());
        }
        for elem in cell.elems.iter() {
            strukt.elems.push(self.export_element(elem)?);
        }
        for text in cell.annotations.iter() {
            strukt
                .elems
                .push(self.export_text(&text.string, text.layer, &text.loc)?.into());
        }
        // Port labels, if the library asks for them
        if let Some(layer) = self.lib.port_labels {
            for (name, port) in cell.ports.iter() {
                strukt
                    .elems
                    .push(self.export_text(name, layer, &port.position())?.into());
            }
        }
        debug!("Exported cell {} ({} elements)", cell.name, strukt.elems.len());
        self.ctx.pop();
        Ok(strukt)
    }
    /// Convert an [Instance] to a GDS instance, AKA [gds21::GdsStructRef]
    fn export_instance(&mut self, inst: &Instance) -> LayoutResult<gds21::GdsStructRef> {
        self.ctx.push(ErrorContext::Instance(inst.inst_name.clone()));
        let name = inst.cell.read()?.name.clone();
        // GDSII angles are in degrees, counter-clockwise
        let angle = normalize_angle(inst.angle).to_degrees();
        let strans = if inst.reflect_vert || angle != 0. {
            Some(gds21::GdsStrans {
                reflected: inst.reflect_vert,
                angle: if angle != 0. { Some(angle) } else { None },
                ..Default::default()
            })
        } else {
            None
        };
        let sref = gds21::GdsStructRef {
            name,
            xy: self.export_point(&inst.loc)?,
            strans,
            ..Default::default()
        };
        self.ctx.pop();
        Ok(sref)
    }
    /// Convert an [Element] into a [gds21::GdsElement]
    fn export_element(&mut self, elem: &Element) -> LayoutResult<gds21::GdsElement> {
        self.ctx.push(ErrorContext::Geometry);
        let Layer { layer, datatype } = elem.layer;
        let gdselem = match &elem.inner {
            Shape::Rect(r) => gds21::GdsBoundary {
                layer,
                datatype,
                xy: self.export_boundary(&r.vertices())?,
                ..Default::default()
            }
            .into(),
            Shape::Polygon(p) => gds21::GdsBoundary {
                layer,
                datatype,
                xy: self.export_boundary(&p.points)?,
                ..Default::default()
            }
            .into(),
            Shape::Path(p) => gds21::GdsPath {
                layer,
                datatype,
                xy: p
                    .points
                    .iter()
                    .map(|pt| self.export_point(pt))
                    .collect::<Result<Vec<_>, _>>()?,
                width: Some(self.export_dist(p.width)?),
                ..Default::default()
            }
            .into(),
        };
        self.ctx.pop();
        Ok(gdselem)
    }
    /// Convert polygon vertices to a GDSII boundary.
    ///
    /// Vertices which round onto their predecessor are dropped,
    /// and the origin is repeated at the end, to "close" the polygon.
    fn export_boundary(&self, pts: &[Point]) -> LayoutResult<Vec<gds21::GdsPoint>> {
        let mut xy: Vec<gds21::GdsPoint> = Vec::with_capacity(pts.len() + 1);
        for pt in pts.iter() {
            let pt = self.export_point(pt)?;
            if xy.last() != Some(&pt) {
                xy.push(pt);
            }
        }
        if xy.len() > 1 && xy.first() == xy.last() {
            xy.pop();
        }
        if xy.len() < 3 {
            return self.fail(format!(
                "Degenerate polygon with {} distinct vertices",
                xy.len()
            ));
        }
        if xy.len() > GDS_MAX_POINTS {
            return self.fail(format!(
                "Polygon with {} vertices exceeds the GDSII limit of {}",
                xy.len(),
                GDS_MAX_POINTS
            ));
        }
        xy.push(xy[0].clone());
        Ok(xy)
    }
    /// Convert a string-label to a [gds21::GdsTextElem]
    fn export_text(
        &self,
        string: &str,
        layer: Layer,
        loc: &Point,
    ) -> LayoutResult<gds21::GdsTextElem> {
        Ok(gds21::GdsTextElem {
            string: string.into(),
            layer: layer.layer,
            texttype: layer.datatype,
            xy: self.export_point(loc)?,
            ..Default::default()
        })
    }
    fn export_point(&self, pt: &Point) -> LayoutResult<gds21::GdsPoint> {
        Ok(gds21::GdsPoint::new(
            self.export_dist(pt.x)?,
            self.export_dist(pt.y)?,
        ))
    }
    /// Convert a distance in user units to integer database units
    fn export_dist(&self, val: f64) -> LayoutResult<i32> {
        let db = (val * self.scale).round();
        if !db.is_finite() || db < i32::MIN as f64 || db > i32::MAX as f64 {
            return self.fail(format!("Coordinate {} out of GDSII range", val));
        }
        Ok(db as i32)
    }
}
impl ErrorHelper for GdsExporter<'_> {
    type Error = LayoutError;
    fn err(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::Export {
            message: msg.into(),
            stack: self.ctx.clone(),
        }
    }
}

/// # GDSII Importer
///
/// Creates [Cell]s from the structs of a [gds21::GdsLibrary], by name.
///
/// Each struct is imported at most once per importer: referenced structs are looked up
/// in (or added to) `cells`, keyed by their GDSII name. Newly created cells are named
/// `{prefix}_{name}` if a `prefix` is set.
///
#[derive(Debug)]
pub struct GdsImporter<'g> {
    gds: &'g gds21::GdsLibrary,
    /// User units per database unit
    scale: f64,
    cells: HashMap<String, Ptr<Cell>>,
    prefix: Option<String>,
    /// Structs currently being imported, outermost first
    stack: Vec<String>,
    ctx: Vec<ErrorContext>,
}
impl<'g> GdsImporter<'g> {
    /// Create an importer from `gds` into `units`, starting from previously-imported `cells`
    pub fn new(
        gds: &'g gds21::GdsLibrary,
        units: &Units,
        cells: HashMap<String, Ptr<Cell>>,
        prefix: Option<String>,
    ) -> Self {
        Self {
            gds,
            scale: gds.units.db_unit() / units.user_unit,
            cells,
            prefix,
            stack: Vec::new(),
            ctx: vec![ErrorContext::Library(gds.name.clone())],
        }
    }
    /// Import every struct of `gds` into a new [Library], in the GDSII file's own units
    pub fn import(gds: &'g gds21::GdsLibrary) -> LayoutResult<Library> {
        let units = import_units(&gds.units)?;
        let mut importer = Self::new(gds, &units, HashMap::new(), None);
        let mut lib = Library::new(&gds.name, units);
        for strukt in gds.structs.iter() {
            let cell = importer.cell(&strukt.name)?;
            lib.add(&cell)?;
        }
        info!("Imported library {} with {} cells", gds.name, lib.cells.len());
        Ok(lib)
    }
    /// Consume the importer, returning every cell it holds, by GDSII name
    pub fn into_cells(self) -> HashMap<String, Ptr<Cell>> {
        self.cells
    }
    /// Get the cell for struct `name`, importing it if not already done
    pub fn cell(&mut self, name: &str) -> LayoutResult<Ptr<Cell>> {
        if let Some(ptr) = self.cells.get(name) {
            return Ok(ptr.clone());
        }
        let new_name = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, name),
            None => name.to_string(),
        };
        let ptr = Ptr::new(self.import_struct(name, &new_name)?);
        self.cells.insert(name.to_string(), ptr.clone());
        Ok(ptr)
    }
    /// Import struct `name` into a new [Cell] named `new_name`, regardless of any earlier import.
    /// Referenced structs are shared through [GdsImporter::cell].
    pub fn import_struct(&mut self, name: &str, new_name: &str) -> LayoutResult<Cell> {
        let gds = self.gds;
        let strukt = match gds.structs.iter().find(|s| s.name == name) {
            Some(s) => s,
            None => {
                return Err(LayoutError::ImportNotFound {
                    cell: name.to_string(),
                    file: gds.name.clone(),
                })
            }
        };
        if self.stack.iter().any(|s| s == name) {
            return Err(LayoutError::CyclicReference(name.to_string()));
        }
        self.stack.push(name.to_string());
        self.ctx.push(ErrorContext::Cell(name.to_string()));

        let mut cell = Cell::new(new_name);
        if new_name != name {
            cell.renamed_from = Some(name.to_string());
        }
        for elem in strukt.elems.iter() {
            use gds21::GdsElement::*;
            match elem {
                GdsBoundary(x) => cell.add_element(self.import_boundary(x)?),
                GdsBox(x) => cell.add_element(self.import_box(x)?),
                GdsPath(x) => cell.add_element(self.import_path(x)?),
                GdsTextElem(x) => cell.add_annotation(self.import_text(x)),
                GdsStructRef(x) => {
                    let inst = self.import_instance(x, cell.insts.len())?;
                    cell.add_instance(inst);
                }
                GdsArrayRef(x) => {
                    let insts = self.import_array(x, cell.insts.len())?;
                    for inst in insts {
                        cell.add_instance(inst);
                    }
                }
                GdsNode(_) => warn!("Skipping unsupported GDSII NODE in {}", name),
            }
        }
        debug!(
            "Imported {} as {} ({} elements, {} instances)",
            name,
            new_name,
            cell.elems.len(),
            cell.insts.len()
        );
        self.ctx.pop();
        self.stack.pop();
        Ok(cell)
    }
    /// Import a [gds21::GdsBoundary] into an [Element]
    fn import_boundary(&mut self, x: &gds21::GdsBoundary) -> LayoutResult<Element> {
        self.ctx.push(ErrorContext::Geometry);
        let xy = &x.xy;
        if xy.len() < 4 || xy.first() != xy.last() {
            return self.fail("GDS Boundary must be closed, with at least three vertices");
        }
        let mut pts: Vec<Point> = xy.iter().map(|p| self.import_point(p)).collect();
        // Pop the redundant last entry
        pts.pop();
        // Check for Rectangles, in either rotational sense
        let is_rect = xy.len() == 5
            && ((xy[0].x == xy[1].x
                && xy[1].y == xy[2].y
                && xy[2].x == xy[3].x
                && xy[3].y == xy[0].y)
                || (xy[0].y == xy[1].y
                    && xy[1].x == xy[2].x
                    && xy[2].y == xy[3].y
                    && xy[3].x == xy[0].x));
        let inner: Shape = if is_rect {
            Rect::new(pts[0], pts[2]).into()
        } else {
            Polygon { points: pts }.into()
        };
        self.ctx.pop();
        Ok(Element::new((x.layer, x.datatype), inner))
    }
    /// Import a [gds21::GdsBox] into an [Element].
    /// The first and third of its five points are opposite corners.
    fn import_box(&mut self, x: &gds21::GdsBox) -> LayoutResult<Element> {
        let inner = Rect::new(self.import_point(&x.xy[0]), self.import_point(&x.xy[2]));
        Ok(Element::new((x.layer, x.boxtype), inner))
    }
    /// Import a [gds21::GdsPath] into an [Element]
    fn import_path(&mut self, x: &gds21::GdsPath) -> LayoutResult<Element> {
        self.ctx.push(ErrorContext::Geometry);
        if x.xy.len() < 2 {
            return self.fail("GDS Path must have at least two points");
        }
        let points = x.xy.iter().map(|p| self.import_point(p)).collect();
        // Negative widths are "absolute", i.e. unscaled, which is all we do anyway
        let width = x.width.unwrap_or(0).abs() as f64 * self.scale;
        self.ctx.pop();
        Ok(Element::new((x.layer, x.datatype), Path { points, width }))
    }
    fn import_text(&self, x: &gds21::GdsTextElem) -> TextElement {
        TextElement {
            string: x.string.clone(),
            layer: Layer::new(x.layer, x.texttype),
            loc: self.import_point(&x.xy),
        }
    }
    /// Import a [gds21::GdsStructRef] into an [Instance].
    /// GDSII instances are unnamed; ours are named by their position in the parent.
    fn import_instance(&mut self, x: &gds21::GdsStructRef, idx: usize) -> LayoutResult<Instance> {
        self.ctx.push(ErrorContext::Instance(x.name.clone()));
        let (reflect_vert, angle) = self.import_strans(&x.strans)?;
        let cell = self.cell(&x.name)?;
        let inst = Instance {
            inst_name: format!("i{}", idx),
            cell,
            loc: self.import_point(&x.xy),
            reflect_vert,
            angle,
        };
        self.ctx.pop();
        Ok(inst)
    }
    /// Import a [gds21::GdsArrayRef] into one [Instance] per array entry, row by row
    fn import_array(&mut self, x: &gds21::GdsArrayRef, idx: usize) -> LayoutResult<Vec<Instance>> {
        self.ctx.push(ErrorContext::Instance(x.name.clone()));
        self.assert(
            x.cols > 0 && x.rows > 0,
            format!("Invalid GDS array dimensions {}x{}", x.cols, x.rows),
        )?;
        let (reflect_vert, angle) = self.import_strans(&x.strans)?;
        let cell = self.cell(&x.name)?;
        // The second and third points sit a full column- and row-span away from the origin
        let p0 = self.import_point(&x.xy[0]);
        let colstep = (self.import_point(&x.xy[1]) - p0) * (1. / x.cols as f64);
        let rowstep = (self.import_point(&x.xy[2]) - p0) * (1. / x.rows as f64);
        let mut insts = Vec::with_capacity(x.rows as usize * x.cols as usize);
        for row in 0..x.rows {
            for col in 0..x.cols {
                let k = idx + insts.len();
                insts.push(Instance {
                    inst_name: format!("i{}", k),
                    cell: cell.clone(),
                    loc: p0 + colstep * col as f64 + rowstep * row as f64,
                    reflect_vert,
                    angle,
                });
            }
        }
        self.ctx.pop();
        Ok(insts)
    }
    /// Import reflection and rotation (radians). Magnification is not supported.
    fn import_strans(&self, strans: &Option<gds21::GdsStrans>) -> LayoutResult<(bool, f64)> {
        let strans = match strans {
            Some(s) => s,
            None => return Ok((false, 0.)),
        };
        if strans.abs_mag || strans.abs_angle {
            return self.fail("Unsupported GDSII absolute magnification or angle");
        }
        if let Some(mag) = strans.mag {
            if (mag - 1.).abs() > 1e-9 {
                return self.fail(format!("Unsupported GDSII magnification {}", mag));
            }
        }
        Ok((strans.reflected, strans.angle.unwrap_or(0.).to_radians()))
    }
    fn import_point(&self, pt: &gds21::GdsPoint) -> Point {
        Point::new(pt.x as f64 * self.scale, pt.y as f64 * self.scale)
    }
}
impl ErrorHelper for GdsImporter<'_> {
    type Error = LayoutError;
    fn err(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::Import {
            message: msg.into(),
            stack: self.ctx.clone(),
        }
    }
}

/// Convert GDSII units to our own, keeping the file's user unit
fn import_units(units: &gds21::GdsUnits) -> LayoutResult<Units> {
    // The first GDSII unit-number is only available as the ratio `user_unit()`
    let precision = units.db_unit();
    let db_per_user = units.user_unit() * precision;
    if !(db_per_user > 0. && precision > 0.) {
        return Err(LayoutError::Import {
            message: format!("Invalid GDSII units {:?}", units),
            stack: vec![ErrorContext::Units],
        });
    }
    Ok(Units {
        user_unit: precision / db_per_user,
        precision,
    })
}

impl Library {
    /// Convert to a [gds21::GdsLibrary]
    pub fn to_gds(&self) -> LayoutResult<gds21::GdsLibrary> {
        GdsExporter::export(self)
    }
    /// Write to GDSII file `fname`
    pub fn save_gds(&self, fname: impl AsRef<std::path::Path>) -> LayoutResult<()> {
        let gds = self.to_gds()?;
        gds.save(fname)?;
        Ok(())
    }
    /// Import every struct of `gds`
    pub fn from_gds(gds: &gds21::GdsLibrary) -> LayoutResult<Library> {
        GdsImporter::import(gds)
    }
    /// Read and import GDSII file `fname`
    pub fn open_gds(fname: impl AsRef<std::path::Path>) -> LayoutResult<Library> {
        let gds = gds21::GdsLibrary::load(fname)?;
        Self::from_gds(&gds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::Port;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Element {
        Element::new((1, 0), Rect::new(Point::new(x0, y0), Point::new(x1, y1)))
    }
    fn lib_of(cells: &[&Ptr<Cell>]) -> LayoutResult<Library> {
        let mut lib = Library::new("lib", Units::default());
        for cell in cells {
            lib.add(cell)?;
        }
        Ok(lib)
    }

    #[test]
    fn test_export_rect() -> LayoutResult<()> {
        let mut cell = Cell::new("c");
        cell.add_element(rect(0., 0., 0.4504, 1.));
        let gds = lib_of(&[&Ptr::new(cell)])?.to_gds()?;
        let units = import_units(&gds.units)?;
        assert_abs_diff_eq!(units.user_unit, 1e-6, epsilon = 1e-15);
        assert_abs_diff_eq!(units.precision, 1e-9, epsilon = 1e-21);
        assert_eq!(gds.structs.len(), 1);
        match &gds.structs[0].elems[0] {
            gds21::GdsElement::GdsBoundary(b) => {
                assert_eq!(b.layer, 1);
                assert_eq!(b.xy.len(), 5);
                assert_eq!(b.xy[0], b.xy[4]);
                assert!(b.xy.contains(&gds21::GdsPoint::new(450, 1000)));
            }
            other => panic!("Expected a boundary, got {:?}", other),
        }
        Ok(())
    }
    #[test]
    fn test_export_instances() -> LayoutResult<()> {
        let child = Ptr::new(Cell::new("child"));
        let mut parent = Cell::new("parent");
        parent.add_instance(Instance {
            loc: Point::new(1., 2.),
            angle: FRAC_PI_2,
            reflect_vert: true,
            ..Instance::new("i", &child)
        });
        parent.add_instance(Instance::new("j", &child));
        // Only the parent is added; its child comes first regardless
        let gds = lib_of(&[&Ptr::new(parent)])?.to_gds()?;
        let names: Vec<&str> = gds.structs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["child", "parent"]);
        match &gds.structs[1].elems[0] {
            gds21::GdsElement::GdsStructRef(s) => {
                assert_eq!(s.name, "child");
                assert_eq!(s.xy, gds21::GdsPoint::new(1000, 2000));
                let strans = s.strans.as_ref().unwrap();
                assert!(strans.reflected);
                assert_abs_diff_eq!(strans.angle.unwrap(), 90., epsilon = 1e-9);
            }
            other => panic!("Expected a struct reference, got {:?}", other),
        }
        match &gds.structs[1].elems[1] {
            gds21::GdsElement::GdsStructRef(s) => assert!(s.strans.is_none()),
            other => panic!("Expected a struct reference, got {:?}", other),
        }
        Ok(())
    }
    #[test]
    fn test_export_duplicate_names() -> LayoutResult<()> {
        let mut top = Cell::new("top");
        top.add_instance(Instance::new("a", &Ptr::new(Cell::new("x"))));
        top.add_instance(Instance::new("b", &Ptr::new(Cell::new("x"))));
        match lib_of(&[&Ptr::new(top)])?.to_gds() {
            Err(LayoutError::DuplicateCellName(name)) => assert_eq!(name, "x"),
            other => panic!("Expected DuplicateCellName, got {:?}", other),
        }
        Ok(())
    }
    #[test]
    fn test_export_limits() -> LayoutResult<()> {
        let points = (0..9000)
            .map(|k| Point::unit(k as f64 * 1e-3) * 1000.)
            .collect();
        let mut cell = Cell::new("big");
        cell.add_element(Element::new((1, 0), Polygon { points }));
        match lib_of(&[&Ptr::new(cell)])?.to_gds() {
            Err(LayoutError::Export { stack, .. }) => {
                assert!(stack.contains(&ErrorContext::Cell("big".into())));
            }
            other => panic!("Expected an export error, got {:?}", other),
        }
        let mut cell = Cell::new("far");
        cell.add_element(rect(0., 0., 1e9, 1.));
        assert!(lib_of(&[&Ptr::new(cell)])?.to_gds().is_err());
        Ok(())
    }
    #[test]
    fn test_round_trip() -> LayoutResult<()> {
        let mut child = Cell::new("child");
        child.add_element(rect(-1., -1., 1., 1.));
        child.add_element(Element::new(
            (2, 0),
            Path {
                points: vec![Point::new(0., 0.), Point::new(10., 0.)],
                width: 0.45,
            },
        ));
        child.add_port("p", Port::new((1., 0.), 0., "op"))?;
        let child = Ptr::new(child);
        let mut parent = Cell::new("parent");
        parent.add_instance(Instance {
            loc: Point::new(20., 0.),
            angle: FRAC_PI_2,
            ..Instance::new("i", &child)
        });
        let mut lib = lib_of(&[&Ptr::new(parent)])?;
        lib.port_labels = Some(Layer::new(10, 0));

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("lib.gds");
        lib.save_gds(&path)?;
        let back = Library::open_gds(&path)?;

        assert_eq!(back.name, "lib");
        assert_abs_diff_eq!(back.units.user_unit, 1e-6, epsilon = 1e-15);
        let child = back.cell("child")?.unwrap();
        let child = child.read()?;
        assert_eq!(child.elems.len(), 2);
        match &child.elems[0].inner {
            Shape::Rect(r) => {
                assert_abs_diff_eq!(r.p0.x, -1., epsilon = 1e-9);
                assert_abs_diff_eq!(r.p1.y, 1., epsilon = 1e-9);
            }
            other => panic!("Expected a rectangle, got {:?}", other),
        }
        match &child.elems[1].inner {
            Shape::Path(p) => assert_abs_diff_eq!(p.width, 0.45, epsilon = 1e-9),
            other => panic!("Expected a path, got {:?}", other),
        }
        // Port labels come back as annotations
        assert_eq!(child.annotations.len(), 1);
        assert_eq!(child.annotations[0].string, "p");
        assert_eq!(child.annotations[0].layer, Layer::new(10, 0));

        let parent = back.cell("parent")?.unwrap();
        let parent = parent.read()?;
        assert_eq!(parent.insts.len(), 1);
        assert_abs_diff_eq!(parent.insts[0].angle, FRAC_PI_2, epsilon = 1e-9);
        let bbox = parent.bbox()?;
        assert_abs_diff_eq!(bbox.p0.x, 19., epsilon = 1e-9);
        // Path ends are flush, its sides widened by half its width
        assert_abs_diff_eq!(bbox.p1.y, 10., epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.p1.x, 21., epsilon = 1e-9);
        let path_only = Cell {
            elems: vec![child.elems[1].clone()],
            ..Cell::new("path")
        };
        let pbox = path_only.bbox()?;
        assert_abs_diff_eq!(pbox.p0.x, 0., epsilon = 1e-9);
        assert_abs_diff_eq!(pbox.p0.y, -0.225, epsilon = 1e-9);
        Ok(())
    }
    #[test]
    fn test_import_cycle() {
        let mut gds = gds21::GdsLibrary::new("cyclic");
        for (name, child) in [("a", "b"), ("b", "a")] {
            let mut s = gds21::GdsStruct::new(name);
            s.elems.push(
                gds21::GdsStructRef {
                    name: child.into(),
                    xy: gds21::GdsPoint::new(0, 0),
                    ..Default::default()
                }
                .into(),
            );
            gds.structs.push(s);
        }
        match Library::from_gds(&gds) {
            Err(LayoutError::CyclicReference(name)) => assert_eq!(name, "a"),
            other => panic!("Expected CyclicReference, got {:?}", other),
        }
    }
    #[test]
    fn test_import_array() -> LayoutResult<()> {
        let mut gds = gds21::GdsLibrary::new("arrays");
        gds.structs.push(gds21::GdsStruct::new("unit"));
        let mut s = gds21::GdsStruct::new("top");
        s.elems.push(
            gds21::GdsArrayRef {
                name: "unit".into(),
                xy: [
                    gds21::GdsPoint::new(0, 0),
                    gds21::GdsPoint::new(3000, 0),
                    gds21::GdsPoint::new(0, 4000),
                ],
                cols: 3,
                rows: 2,
                ..Default::default()
            }
            .into(),
        );
        s.elems.push(
            gds21::GdsNode {
                layer: 1,
                nodetype: 0,
                xy: vec![gds21::GdsPoint::new(0, 0)],
                ..Default::default()
            }
            .into(),
        );
        gds.structs.push(s);
        let lib = Library::from_gds(&gds)?;
        let top = lib.cell("top")?.unwrap();
        let top = top.read()?;
        assert_eq!(top.insts.len(), 6);
        let last = &top.insts[5];
        assert_eq!(last.inst_name, "i5");
        assert_abs_diff_eq!(last.loc.x, 2., epsilon = 1e-9);
        assert_abs_diff_eq!(last.loc.y, 2., epsilon = 1e-9);
        // All share the same definition
        assert!(top.insts.iter().all(|i| Ptr::ptr_eq(&i.cell, &top.insts[0].cell)));
        Ok(())
    }
}
