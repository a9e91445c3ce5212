//!
//! # Parametric Cells
//!
//! Reusable layout cells with typed, oriented [Port]s, composed into [Circuit]s
//! whose links are routed automatically with bend-radius-limited [Trace]s.
//!
//! Cells are plain data, shared through [utils::Ptr]s. A [Circuit] places instances of them,
//! transforms their ports into its own frame, routes each declared link, and exposes
//! the ports which remain unlinked, under the name `instance.port`.
//! The result is itself a cell, and can be placed in further circuits.
//!
//! Libraries of cells are written to and read from GDSII through [gds21],
//! in dependency order, via [Library::to_gds] and [Library::save_gds].
//! Cells from existing GDSII files are loaded, optionally renamed, with [Importer].
//!

// Internal modules & re-exports
pub use gds21;
pub use pcell21utils as utils;

pub mod bbox;
pub use bbox::*;
pub mod circuit;
pub use circuit::*;
pub mod data;
pub use data::*;
pub mod deps;
pub use deps::{dependencies, order};
pub mod error;
pub use error::*;
pub mod gds;
pub use gds::{GdsExporter, GdsImporter};
pub mod geom;
pub use geom::*;
pub mod import;
pub use import::*;
pub mod port;
pub use port::*;
pub mod route;
pub mod tech;
pub use tech::*;
pub mod trace;
pub use trace::{Centerline, Trace, TraceTemplate};
