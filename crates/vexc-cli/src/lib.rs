//! Command-line driver for the `vexc` pipeline.
//!
//! Thin: it has no logic of its own beyond argument parsing and output
//! formatting. All compilation work is delegated to the `vexc` crate.

pub mod cli;

pub use cli::run_cli;
