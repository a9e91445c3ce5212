//!
//! # gdsimport
//!
//! Load a cell from a GDSII file, optionally renaming it and attaching ports
//! from a port-descriptor file. Print its ports and dependency order,
//! and write it, with its dependencies, to a new GDSII file.
//!

// Std-Lib
use std::error::Error;
use std::path::PathBuf;

// Crates.io
use clap::Parser;
use log::info;

// Workspace
use pcell21::utils::Ptr;
use pcell21::{order, Cell, LayoutResult, Technology};

#[derive(Parser, Debug)]
#[command(name = "gdsimport", about = "Import, rename, and re-export a GDSII cell")]
pub struct ProgramOptions {
    /// Input GDSII file
    #[arg(short = 'i', long)]
    pub gds: PathBuf,
    /// Name of the cell to import
    #[arg(short, long)]
    pub cell: String,
    /// New name for the imported cell
    #[arg(short, long)]
    pub rename: Option<String>,
    /// Port-descriptor file, one `name, x, y, angle, type` per line
    #[arg(short, long)]
    pub ports: Option<PathBuf>,
    /// Output GDSII file
    #[arg(short, long)]
    pub out: PathBuf,
    /// Technology file (JSON, YAML, or TOML)
    #[arg(short, long)]
    pub tech: Option<PathBuf>,
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let options = ProgramOptions::parse();
    _main(&options)
}

pub fn _main(options: &ProgramOptions) -> Result<(), Box<dyn Error>> {
    crate::init_logging(options.verbose);

    let tech = match &options.tech {
        Some(path) => Technology::from_file(path)?,
        None => Technology::default(),
    };
    let mut importer = tech.importer();
    let cell = importer.load(
        &options.cell,
        &options.gds,
        options.rename.as_deref(),
        options.ports.as_deref(),
    )?;

    let name = report(&cell)?;

    let mut lib = tech.library(&name);
    lib.add_with_dependencies(&cell)?;
    lib.save_gds(&options.out)?;
    info!("Wrote {} cells to {}", lib.cells.len(), options.out.display());
    Ok(())
}

/// Print the ports and dependency order of `cell`. Returns its name.
fn report(cell: &Ptr<Cell>) -> LayoutResult<String> {
    let name = {
        let cell = cell.read()?;
        println!("{}: {} ports", cell.name, cell.ports.len());
        for (port_name, port) in cell.ports.iter() {
            let pos = port.position();
            println!(
                "  {} ({}) at ({}, {}), angle {}",
                port_name,
                port.port_type(),
                pos.x,
                pos.y,
                port.angle()
            );
        }
        cell.name.clone()
    };
    println!("dependency order:");
    for dep in order(&[cell.clone()])?.iter() {
        println!("  {}", dep.read()?.name);
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcell21::{Element, Instance, Layer, LayoutError, Library, Point, Rect, Units};

    /// Write a two-level library, `top` instantiating `leaf`, to `path`
    fn write_lib(path: &std::path::Path) -> Result<(), Box<dyn Error>> {
        let mut leaf = Cell::new("leaf");
        leaf.add_element(Element::new(
            Layer::new(1, 0),
            Rect::new(Point::new(0., 0.), Point::new(10., 5.)),
        ));
        let leaf = Ptr::new(leaf);
        let mut top = Cell::new("top");
        top.add_instance(Instance {
            loc: Point::new(20., 0.),
            ..Instance::new("l", &leaf)
        });
        top.add_instance(Instance::new("r", &leaf));
        let mut lib = Library::new("src", Units::default());
        lib.add_with_dependencies(&Ptr::new(top))?;
        lib.save_gds(path)?;
        Ok(())
    }
    fn num_instances(cell: &Ptr<Cell>) -> LayoutResult<usize> {
        Ok(cell.read()?.insts.len())
    }
    fn options(gds: PathBuf, out: PathBuf) -> ProgramOptions {
        ProgramOptions {
            gds,
            cell: "top".into(),
            rename: None,
            ports: None,
            out,
            tech: None,
            verbose: false,
        }
    }

    #[test]
    fn test_rename_with_ports() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("src.gds");
        write_lib(&src)?;
        let ports = dir.path().join("top.ports");
        std::fs::write(&ports, "a, 0, 2.5, 3.141592653589793, op\nb, 30, 2.5, 0, op\n")?;
        let out = dir.path().join("out.gds");
        _main(&ProgramOptions {
            rename: Some("mytop".into()),
            ports: Some(ports),
            ..options(src, out.clone())
        })?;

        let lib = Library::open_gds(&out)?;
        assert_eq!(lib.name, "mytop");
        let top = lib.cell("mytop")?.unwrap();
        assert_eq!(num_instances(&top)?, 2);
        assert!(lib.cell("top")?.is_none());
        assert_eq!(lib.cells.len(), 2);
        Ok(())
    }
    #[test]
    fn test_not_found() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("src.gds");
        write_lib(&src)?;
        let out = dir.path().join("out.gds");
        let result = _main(&ProgramOptions {
            cell: "nope".into(),
            ..options(src, out.clone())
        });
        let err = result.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<LayoutError>(),
            Some(LayoutError::ImportNotFound { .. })
        ));
        assert!(!out.exists());
        Ok(())
    }
    #[test]
    fn test_port_outside() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("src.gds");
        write_lib(&src)?;
        let ports = dir.path().join("top.ports");
        std::fs::write(&ports, "a, 100, 0, 0, op\n")?;
        let out = dir.path().join("out.gds");
        let result = _main(&ProgramOptions {
            ports: Some(ports),
            ..options(src, out)
        });
        let err = result.err().unwrap();
        assert!(matches!(
            err.downcast_ref::<LayoutError>(),
            Some(LayoutError::PortDescriptorMismatch(_))
        ));
        Ok(())
    }
}
