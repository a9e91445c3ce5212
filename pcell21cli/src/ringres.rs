//!
//! # ringres
//!
//! Build a circuit of two ring resonators, the second offset and rotated a quarter turn,
//! with the first's `out` port routed to the second's. Write it to GDSII.
//!

// Std-Lib
use std::error::Error;
use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;

// Crates.io
use clap::Parser;
use log::info;

// Workspace
use pcell21::utils::Ptr;
use pcell21::{Circuit, CircuitSpec, Technology};

// Local imports
use crate::ring::{ring_resonator, RingResonator};

#[derive(Parser, Debug)]
#[command(name = "ringres", about = "Ring-resonator circuit to GDSII")]
pub struct ProgramOptions {
    /// Output GDSII file
    #[arg(short = 'o', long)]
    pub gds: PathBuf,
    /// Technology file (JSON, YAML, or TOML)
    #[arg(short = 't', long)]
    pub tech: Option<PathBuf>,
    /// Ring radius
    #[arg(short, long, default_value_t = 10.)]
    pub radius: f64,
    /// Ring-to-bus gap
    #[arg(short, long, default_value_t = 0.2)]
    pub gap: f64,
    /// Waveguide width
    #[arg(short, long, default_value_t = 0.45)]
    pub width: f64,
    /// Name of the top-level circuit cell
    #[arg(short, long, default_value = "top")]
    pub name: String,
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
        Some(path) => {
            info!("Loading technology from {}", path.display());
            Technology::from_file(path)?
        }
        None => Technology::default(),
    };
    let params = RingResonator {
        radius: options.radius,
        gap: options.gap,
        width: options.width,
        port_type: tech.optical_trace.port_type.clone(),
        ..Default::default()
    };
    let ring = Ptr::new(ring_resonator(&params)?);

    let spec = CircuitSpec::new(&options.name)
        .pcell("dev1", &ring)
        .pcell("dev2", &ring)
        .translate("dev2", (100., 50.))
        .rotate("dev2", FRAC_PI_2)
        .link("dev1", "out", "dev2", "out");
    let circuit = Circuit::with_template(&spec, &tech.optical_trace)?;
    for (name, port) in circuit.ports.iter() {
        info!(
            "Port {}: ({:.3}, {:.3}) at {:.4} rad",
            name,
            port.position().x,
            port.position().y,
            port.angle()
        );
    }

    let mut lib = tech.library(&options.name);
    lib.add_with_dependencies(&circuit.cell)?;
    lib.save_gds(&options.gds)?;
    info!("Wrote {} cells to {}", lib.cells.len(), options.gds.display());
    Ok(())
}
