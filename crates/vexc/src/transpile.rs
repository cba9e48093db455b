use std::collections::{HashMap, HashSet};

use vexc_analyze::analyze;
use vexc_base::{Diagnostic, Interner, Severity};
use vexc_macro::{load_core_macros, load_stdlib_module, MacroRegistry};
use vexc_resolve::discovery::scan_imports_and_exports;
use vexc_syntax::parse;

/// Compiles a single Vex source string to Target source, per the
/// contractual `transpile(source) -> target_code` entry point (§1).
/// Sequences C1 -> C5 -> C7 -> C8 (§4.7 step 3), surfacing every
/// phase's diagnostics and stopping short of code generation if any
/// phase reports an `Error`-severity diagnostic (§4.7 step 4, §7).
pub fn transpile(source: &str) -> (String, Vec<Diagnostic>) {
    let program = match parse(source, "<source>") {
        Ok(program) => program,
        Err(diag) => return (String::new(), vec![diag]),
    };

    let mut registry = MacroRegistry::new();
    let mut diagnostics = Vec::new();
    if let Err(diag) = load_core_macros(&mut registry, None) {
        diagnostics.push(diag);
    }

    // Pre-scan for `vex.*` stdlib module imports and load them before
    // expansion begins; their macros are the payload, so mark them so
    // C8 never emits them as Target imports.
    let (imports, _) = scan_imports_and_exports(&program);
    let mut ignore_imports: HashSet<String> = HashSet::new();
    for item in &imports {
        if item.path.starts_with("vex.") {
            if let Err(diag) = load_stdlib_module(&mut registry, &item.path, None) {
                diagnostics.push(diag);
            }
            ignore_imports.insert(item.path.clone());
        }
    }

    let expanded = match vexc_macro::expand_program(&program, &mut registry) {
        Ok(expanded) => expanded,
        Err(diag) => {
            diagnostics.push(diag);
            return (String::new(), diagnostics);
        }
    };

    let (analysis_diags, actx) =
        analyze(&expanded, Interner::new(), HashMap::new(), HashMap::new(), ignore_imports);
    diagnostics.extend(analysis_diags);
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        return (String::new(), diagnostics);
    }

    let (code, codegen_diags) = vexc_codegen::generate_program(&expanded, &actx, "main");
    diagnostics.extend(codegen_diags);
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        return (String::new(), diagnostics);
    }

    (code, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transpiles_a_simple_arithmetic_program() {
        let (code, diags) = transpile("(+ 1 2)");
        assert!(diags.is_empty());
        assert!(code.contains("(1 + 2)"));
        assert!(code.contains("package main"));
    }

    #[test]
    fn parse_error_yields_empty_output_and_a_diagnostic() {
        let (code, diags) = transpile("(+ 1 2");
        assert!(code.is_empty());
        assert!(!diags.is_empty());
    }

    #[test]
    fn type_error_stops_before_codegen() {
        let (code, diags) = transpile(r#"(if 1 2 3)"#);
        assert!(code.is_empty());
        assert!(diags.iter().any(|d| d.code == "VEX-TYPE-NONBOOL-CONDITION"));
    }

    #[test]
    fn branch_mismatch_is_reported_and_blocks_codegen() {
        let (code, diags) = transpile(r#"(def result (if (> 5 3) "yes" 0))"#);
        assert!(code.is_empty());
        assert!(diags.iter().any(|d| d.code == "VEX-TYPE-BRANCH-MISMATCH"));
    }
}
