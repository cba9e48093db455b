//! Semantic analysis: symbol collection, type inference, type-compatibility
//! validation, and semantic validation over an already macro-expanded
//! `vexc_syntax::Program`. Accepts cross-package export/scheme data as plain
//! maps so it never has to depend on `vexc-resolve` directly.

pub mod collect;
pub mod context;
pub mod infer;
pub mod semantic;
pub mod validate;

use std::collections::{HashMap, HashSet};

use vexc_base::Diagnostic;
use vexc_syntax::Program;
use vexc_types::Scheme;

pub use collect::collect_symbols;
pub use context::{node_key, AnalysisContext};
pub use infer::{infer, infer_program};
pub use semantic::validate_semantics;
pub use validate::validate_program;

/// Runs all four passes over `program` in order, stopping short of
/// later passes' diagnostics only in the sense that pass 3 and 4 both
/// read pass 2's recorded types/bindings rather than recomputing them.
/// All four passes' diagnostics are still collected and returned
/// together - nothing here gate-stops on severity, that's the
/// orchestrator's job once every crate's diagnostics are in hand.
pub fn analyze(
    program: &Program,
    interner: vexc_base::Interner,
    exports: HashMap<String, HashSet<String>>,
    pkg_schemes: HashMap<String, HashMap<String, Scheme>>,
    ignore_imports: HashSet<String>,
) -> (Vec<Diagnostic>, AnalysisContext) {
    let mut ctx = AnalysisContext::new(interner, exports, pkg_schemes, ignore_imports);
    let mut diagnostics = Vec::new();

    collect_symbols(program, &mut ctx);
    infer_program(program, &mut ctx);
    diagnostics.extend(validate_program(program, &ctx));
    diagnostics.extend(validate_semantics(program, &mut ctx));

    (diagnostics, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexc_syntax::parse;

    #[test]
    fn analyze_runs_all_four_passes() {
        let program = parse("(def x 1) (set! x 2) (+ x \"y\")", "t.vx").unwrap();
        let (diags, ctx) = analyze(
            &program,
            vexc_base::Interner::new(),
            HashMap::new(),
            HashMap::new(),
            HashSet::new(),
        );
        assert!(diags.iter().any(|d| d.code == "VEX-TYPE-NONNUMERIC"));
        let sym = ctx.interner.intern("x");
        assert!(vexc_types::Namespace::resolve(&ctx.namespaces.global, sym).is_some());
    }

    #[test]
    fn analyze_reports_immutable_parameter_mutation() {
        let program = parse("(def f (fn [x] (set! x 2)))", "t.vx").unwrap();
        let (diags, _ctx) = analyze(
            &program,
            vexc_base::Interner::new(),
            HashMap::new(),
            HashMap::new(),
            HashSet::new(),
        );
        assert!(diags.iter().any(|d| d.code == "VEX-SEM-IMMUTABLE"));
    }

    #[test]
    fn analyze_clean_program_has_no_diagnostics() {
        let program = parse("(def x 1) (def y (+ x 2))", "t.vx").unwrap();
        let (diags, _ctx) = analyze(
            &program,
            vexc_base::Interner::new(),
            HashMap::new(),
            HashMap::new(),
            HashSet::new(),
        );
        assert!(diags.is_empty());
    }
}
