//! The orchestrator (C9): binds every other phase together behind the
//! two contractual entry points named in the specification -
//! `transpile` for a single source string and `compile_project` for a
//! multi-file, package-resolving build - plus a diagnostics renderer
//! shared by both.

pub mod heuristics;
pub mod project;
pub mod render;
pub mod transpile;

pub use heuristics::is_external_import;
pub use project::compile_project;
pub use render::{render_json, render_text};
pub use transpile::transpile;

pub use vexc_base::{Diagnostic, Severity};
pub use vexc_resolve::CombinedProgram;
