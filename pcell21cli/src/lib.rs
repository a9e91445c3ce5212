//!
//! # PCell21 Command-Line Programs
//!
//! Example parametric cells, and the programs which exercise them:
//!
//! * `ringres` builds a pair of linked ring resonators and writes them to GDSII.
//! * `gdsimport` loads a cell from a GDSII file, optionally renamed and with ports
//!   from a port-descriptor file, and re-writes it with its dependencies.
//!

pub mod gdsimport;
pub mod ring;
pub mod ringres;

/// Initialize logging, at `debug` level if `verbose`, else `info`.
/// Environment settings (`RUST_LOG`) take precedence.
pub(crate) fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(level);
    // Fails only if already initialized, e.g. by an earlier test
    let _ = env_logger::Builder::from_env(env).try_init();
}
