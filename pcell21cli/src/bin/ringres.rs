//! # ringres
//!
//! Ring-resonator circuit to GDSII. See [pcell21cli::ringres].

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pcell21cli::ringres::main()
}
