//!
//! # Imported Cells
//!
//! Cells read from GDSII files, optionally renamed, with ports attached from
//! a companion text file.
//!
//! Port files hold one port per line, as `name, x, y, angle, type`,
//! separated by commas and/or whitespace. Angles are in radians.
//! Blank lines and lines starting with `#` are ignored.
//!

// Std-Lib
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

// Crates.io
use log::{debug, info};

// Local imports
use crate::{
    data::{Cell, Units},
    gds::GdsImporter,
    port::Port,
    utils::{ErrorContext, ErrorHelper, Ptr, Unwrapper},
    LayoutError, LayoutResult,
};

/// Distance by which ports may lie outside their cell's bounding box, in user units
pub const PORT_BBOX_TOL: f64 = 1e-6;

/// A parsed GDSII file, and the cells created from it
#[derive(Debug)]
struct ImportedFile {
    gds: gds21::GdsLibrary,
    /// Cells shared as dependencies, by GDSII struct name
    cells: HashMap<String, Ptr<Cell>>,
    /// Port-less top-level loads, by (GDSII struct name, cell name)
    loaded: HashMap<(String, String), Ptr<Cell>>,
}

///
/// # Importer
///
/// Loads named cells from GDSII files.
///
/// Each file is read once. Cells referenced by a loaded cell are shared among every
/// later load from the same file, and are never renamed after creation.
/// Loading with a `rename` names the requested cell `rename`, and any dependencies
/// it newly creates `{rename}_{name}`.
///
#[derive(Debug, Default)]
pub struct Importer {
    pub units: Units,
    files: HashMap<PathBuf, ImportedFile>,
    /// Names of every cell created so far
    names: HashSet<String>,
}
impl Importer {
    pub fn new(units: Units) -> Self {
        Self {
            units,
            ..Default::default()
        }
    }
    /// Load cell `cell_name` from GDSII file `filename`.
    ///
    /// Fails with [LayoutError::ImportNotFound] if the file has no such cell,
    /// and [LayoutError::RenameCollision] if `rename` is the name of any cell already loaded,
    /// or of any cell among its dependencies. If `ports_filename` is given,
    /// ports are read from it and checked against the cell's bounding box.
    ///
    /// Repeated loads of the same cell under the same name, with no ports,
    /// return the same [Ptr].
    pub fn load(
        &mut self,
        cell_name: &str,
        filename: impl AsRef<Path>,
        rename: Option<&str>,
        ports_filename: Option<&Path>,
    ) -> LayoutResult<Ptr<Cell>> {
        let path = filename.as_ref().to_path_buf();
        let file = match self.files.entry(path.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                info!("Reading GDSII file {}", path.display());
                let gds = gds21::GdsLibrary::load(&path)?;
                e.insert(ImportedFile {
                    gds,
                    cells: HashMap::new(),
                    loaded: HashMap::new(),
                })
            }
        };
        if !file.gds.structs.iter().any(|s| s.name == cell_name) {
            return Err(LayoutError::ImportNotFound {
                cell: cell_name.to_string(),
                file: path.display().to_string(),
            });
        }
        let new_name = rename.unwrap_or(cell_name);
        let key = (cell_name.to_string(), new_name.to_string());
        if ports_filename.is_none() {
            let shared = match file.cells.get(cell_name) {
                Some(c) if c.read()?.name == new_name => Some(c),
                _ => None,
            };
            if let Some(cached) = shared.or_else(|| file.loaded.get(&key)) {
                debug!("Reusing {} from {}", cell_name, path.display());
                return Ok(cached.clone());
            }
        }
        if let Some(rename) = rename {
            if self.names.contains(rename) {
                return Err(LayoutError::RenameCollision(rename.to_string()));
            }
        }

        // Import into a copy of the file's cells, kept only on success
        let mut importer = GdsImporter::new(
            &file.gds,
            &self.units,
            file.cells.clone(),
            rename.map(String::from),
        );
        let mut cell = importer.import_struct(cell_name, new_name)?;
        let mut cells = importer.into_cells();
        if let Some(rename) = rename {
            for dep in cell.dependencies(true)? {
                if dep.read()?.name == rename {
                    return Err(LayoutError::RenameCollision(rename.to_string()));
                }
            }
        }
        if let Some(ports_filename) = ports_filename {
            let ports = read_ports(ports_filename)?;
            check_ports(&cell, &ports)?;
            cell.add_ports(ports)?;
        }

        let ptr = Ptr::new(cell);
        cells
            .entry(cell_name.to_string())
            .or_insert_with(|| ptr.clone());
        for c in cells.values() {
            self.names.insert(c.read()?.name.clone());
        }
        self.names.insert(ptr.read()?.name.clone());
        file.cells = cells;
        if ports_filename.is_none() {
            file.loaded.insert(key, ptr.clone());
        }
        info!(
            "Imported {} from {}{}",
            cell_name,
            path.display(),
            rename.map(|r| format!(" as {}", r)).unwrap_or_default()
        );
        Ok(ptr)
    }
}

///
/// # Imported Cell
///
/// Shorthand for one-off imports through a fresh [Importer], in default [Units].
///
pub struct ImportedCell;
impl ImportedCell {
    /// See [Importer::load]
    pub fn load(
        cell_name: &str,
        filename: impl AsRef<Path>,
        rename: Option<&str>,
        ports_filename: Option<&Path>,
    ) -> LayoutResult<Ptr<Cell>> {
        Importer::default().load(cell_name, filename, rename, ports_filename)
    }
}

/// Check that every port lies within `cell`'s bounding box
fn check_ports(cell: &Cell, ports: &[(String, Port)]) -> LayoutResult<()> {
    let mut bbox = cell.bbox()?;
    bbox.expand(PORT_BBOX_TOL);
    for (name, port) in ports.iter() {
        let pos = port.position();
        if bbox.is_empty() || !bbox.contains(&pos) {
            return Err(LayoutError::PortDescriptorMismatch(format!(
                "Port {} at ({}, {}) lies outside cell {}",
                name, pos.x, pos.y, cell.name
            )));
        }
    }
    Ok(())
}

/// Read port descriptors from file `fname`
pub fn read_ports(fname: impl AsRef<Path>) -> LayoutResult<Vec<(String, Port)>> {
    let fname = fname.as_ref();
    let text = std::fs::read_to_string(fname)?;
    PortParser {
        ctx: vec![ErrorContext::File(fname.display().to_string())],
    }
    .parse(&text)
}

/// Parse port descriptors from `text`
pub fn parse_ports(text: &str) -> LayoutResult<Vec<(String, Port)>> {
    PortParser { ctx: Vec::new() }.parse(text)
}

/// Line-by-line port-file parser
struct PortParser {
    ctx: Vec<ErrorContext>,
}
impl PortParser {
    fn parse(&mut self, text: &str) -> LayoutResult<Vec<(String, Port)>> {
        let mut ports = Vec::new();
        for (num, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.ctx.push(ErrorContext::Line(num + 1));
            ports.push(self.parse_line(line)?);
            self.ctx.pop();
        }
        Ok(ports)
    }
    fn parse_line(&self, line: &str) -> LayoutResult<(String, Port)> {
        let tokens: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() != 5 {
            return self.fail(format!(
                "Expected `name, x, y, angle, type`, got {} fields in `{}`",
                tokens.len(),
                line
            ));
        }
        let x = tokens[1]
            .parse::<f64>()
            .unwrapper(self, format!("Invalid x-coordinate `{}`", tokens[1]))?;
        let y = tokens[2]
            .parse::<f64>()
            .unwrapper(self, format!("Invalid y-coordinate `{}`", tokens[2]))?;
        let angle = tokens[3]
            .parse::<f64>()
            .unwrapper(self, format!("Invalid angle `{}`", tokens[3]))?;
        Ok((tokens[0].to_string(), Port::new((x, y), angle, tokens[4])))
    }
}
impl ErrorHelper for PortParser {
    type Error = LayoutError;
    fn err(&self, msg: impl Into<String>) -> LayoutError {
        LayoutError::PortDescriptorMismatch(format!("{} {:?}", msg.into(), self.ctx))
    }
}
