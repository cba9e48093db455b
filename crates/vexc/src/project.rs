use std::path::Path;

use vexc_analyze::analyze;
use vexc_base::{Diagnostic, Interner, Severity};
use vexc_macro::{load_core_macros, MacroRegistry};
use vexc_resolve::resolve_program;
use vexc_syntax::parse;

/// Compiles a multi-file project from its entry path, per the
/// contractual `resolve_program(entry_path) -> CombinedProgram` /
/// `compile_project` split in §1: first invokes C6 to discover,
/// order, and concatenate local packages, then hands the combined,
/// already-expanded program to analysis and code generation with the
/// resolver's `ignore_imports`/`exports`/`pkg_schemes` in scope (§4.7).
pub fn compile_project(entry_path: &Path) -> (String, Vec<Diagnostic>) {
    let mut registry = MacroRegistry::new();
    let mut diagnostics = Vec::new();
    if let Err(diag) = load_core_macros(&mut registry, None) {
        diagnostics.push(diag);
    }

    let combined = match resolve_program(entry_path, &mut registry) {
        Ok(combined) => combined,
        Err(diag) => {
            diagnostics.push(diag);
            return (String::new(), diagnostics);
        }
    };

    // Packages and the entry file were already macro-expanded per
    // file while the resolver walked the dependency graph (see
    // `vexc-resolve::discovery::load_and_expand_file`), so the
    // combined source is ready for analysis without a second
    // expansion pass.
    let program = match parse(&combined.combined_source, entry_path) {
        Ok(program) => program,
        Err(diag) => {
            diagnostics.push(diag);
            return (String::new(), diagnostics);
        }
    };

    let (analysis_diags, actx) = analyze(
        &program,
        Interner::new(),
        combined.exports.clone(),
        combined.pkg_schemes.clone(),
        combined.ignore_imports.clone(),
    );
    diagnostics.extend(analysis_diags);
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        return (String::new(), diagnostics);
    }

    let (code, codegen_diags) = vexc_codegen::generate_program(&program, &actx, "main");
    diagnostics.extend(codegen_diags);
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        return (String::new(), diagnostics);
    }

    (code, diagnostics)
}
