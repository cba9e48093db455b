//! vexc CLI - standalone binary.
//!
//! A thin wrapper around [`vexc_cli::run_cli`], handling error display
//! and exit codes. All command logic lives in the library crate.

fn main() {
    if let Err(e) = vexc_cli::run_cli() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
