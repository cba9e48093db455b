//! Command-line argument parsing and dispatch for `vexc`.
//!
//! Built on [`clap`] with derive macros, mirroring the workspace's one
//! other CLI-shaped consumer. Each [`Commands`] variant maps to a
//! handler function that calls into the `vexc` library crate and
//! renders whatever diagnostics come back.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use vexc::{render_json, render_text, Severity};

/// Command-line interface for the `vexc` source-to-source translator.
#[derive(Parser)]
#[command(name = "vexc")]
#[command(about = "Translates Vex source into Target source", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transpile a Vex entry file (and any local packages it imports)
    /// to Target source.
    Build {
        /// Path to the entry `.vx` file.
        entry: PathBuf,

        /// Write the generated Target source here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Render diagnostics as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Run every phase through analysis and report diagnostics,
    /// without emitting Target source.
    Check {
        /// Path to the entry `.vx` file.
        entry: PathBuf,

        /// Render diagnostics as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

/// Parses `std::env::args` and executes the requested subcommand.
pub fn run_cli() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { entry, output, json } => cmd_build(&entry, output.as_deref(), json),
        Commands::Check { entry, json } => cmd_check(&entry, json),
    }
}

fn cmd_build(entry: &std::path::Path, output: Option<&std::path::Path>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (code, diagnostics) = vexc::compile_project(entry);
    print_diagnostics(&diagnostics, json);

    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        std::process::exit(1);
    }

    match output {
        Some(path) => fs::write(path, code)?,
        None => print!("{}", code),
    }
    Ok(())
}

fn cmd_check(entry: &std::path::Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (_code, diagnostics) = vexc::compile_project(entry);
    print_diagnostics(&diagnostics, json);

    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        std::process::exit(1);
    }
    println!("Check passed");
    Ok(())
}

fn print_diagnostics(diagnostics: &[vexc::Diagnostic], json: bool) {
    if diagnostics.is_empty() {
        return;
    }
    if json {
        println!("{}", render_json(diagnostics));
    } else {
        eprintln!("{}", render_text(diagnostics));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &std::path::Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn parses_build_with_output_and_json_flags() {
        let cli = Cli::try_parse_from(["vexc", "build", "main.vx", "-o", "out.go", "--json"]).unwrap();
        match cli.command {
            Commands::Build { entry, output, json } => {
                assert_eq!(entry, PathBuf::from("main.vx"));
                assert_eq!(output, Some(PathBuf::from("out.go")));
                assert!(json);
            }
            _ => panic!("expected Build"),
        }
    }

    #[test]
    fn parses_check_command() {
        let cli = Cli::try_parse_from(["vexc", "check", "main.vx"]).unwrap();
        assert!(matches!(cli.command, Commands::Check { .. }));
    }

    #[test]
    fn build_writes_generated_source_to_requested_file() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("main.vx");
        write(&entry, "(+ 1 2)");
        let out = dir.path().join("out.go");

        cmd_build(&entry, Some(&out), false).unwrap();
        let contents = fs::read_to_string(&out).unwrap();
        assert!(contents.contains("package main"));
    }
}
