//! # gdsimport
//!
//! Import, rename, and re-export a GDSII cell. See [pcell21cli::gdsimport].

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pcell21cli::gdsimport::main()
}
