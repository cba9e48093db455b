//! Lowers an expanded, type-annotated `vexc_syntax::Program` to Target
//! (Go) source text: the final phase of the pipeline (C8). Consumes
//! `vexc-analyze`'s `AnalysisContext` for per-node inferred types and
//! the resolver's `ignore_imports`/`exports` maps for cross-package
//! call lowering, so this crate never needs its own copy of either.

pub mod context;
pub mod emit;
pub mod types;

pub use context::{CodegenContext, ImportEntry};
pub use emit::generate_program;
pub use types::{render_type, zero_value};
