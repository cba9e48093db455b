use std::cell::RefCell;
use std::rc::Rc;

use vexc_base::Diagnostic;
use vexc_syntax::{Node, Program, TerminalKind};
use vexc_types::{Namespace, Type};

use crate::context::AnalysisContext;

/// Pass 4: semantic validation not expressible as a type-compatibility
/// rule - `set!` mutability/definedness, and cross-package export
/// visibility. Re-threads the same scope-introducing forms
/// (`fn`/`let`) pass 2 did: top-level bindings persist in the global
/// namespace, but a parameter's mutability only exists for the
/// duration of its own body, so this pass has to rebuild that nesting
/// rather than read it back from `ctx`.
pub fn validate_semantics(program: &Program, ctx: &mut AnalysisContext) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let global = ctx.namespaces.global.clone();
    for node in program {
        walk(node, &global, ctx, &mut out);
    }
    out
}

fn walk(node: &Node, ns: &Rc<RefCell<Namespace>>, ctx: &mut AnalysisContext, out: &mut Vec<Diagnostic>) {
    let content = node.content();
    match node.list_head() {
        Some("set!") => {
            check_set(node, ns, ctx, out);
            for child in &content[1..] {
                walk(child, ns, ctx, out);
            }
            return;
        }
        Some("fn") => {
            let child_ns = Namespace::new_child(ns, "fn-body");
            if let Some(params) = content.get(1) {
                for p in params.content().iter().filter_map(Node::as_terminal_text) {
                    let sym = ctx.interner.intern(p);
                    Namespace::bind(&child_ns, sym, Type::Unknown(u32::MAX), false, false);
                }
            }
            if let Some(body) = content.get(2) {
                walk(body, &child_ns, ctx, out);
            }
            return;
        }
        Some("let") => {
            if let Some(value) = content.get(2) {
                walk(value, ns, ctx, out);
            }
            let child_ns = Namespace::new_child(ns, "let-body");
            if let Some(name) = content.get(1).and_then(Node::as_terminal_text) {
                let sym = ctx.interner.intern(name);
                Namespace::bind(&child_ns, sym, Type::Unknown(u32::MAX), false, false);
            }
            if let Some(body) = content.get(3) {
                walk(body, &child_ns, ctx, out);
            }
            return;
        }
        Some(head) => {
            if let Some((pkg, name)) = head.split_once('/') {
                check_qualified_access_at(node.position(), pkg, name, ctx, out);
            }
        }
        None => {}
    }

    if let Node::Terminal { text, position, kind } = node {
        if *kind == TerminalKind::Symbol {
            if let Some((pkg, name)) = text.split_once('/') {
                check_qualified_access_at(position.clone(), pkg, name, ctx, out);
            }
        }
    }

    for child in content {
        if child.is_list() || child.is_array() {
            walk(child, ns, ctx, out);
        }
    }
}

fn check_set(node: &Node, ns: &Rc<RefCell<Namespace>>, ctx: &AnalysisContext, out: &mut Vec<Diagnostic>) {
    let content = node.content();
    let Some(name) = content.get(1).and_then(Node::as_terminal_text) else { return };

    let Some(sym) = ctx.interner.lookup(name) else {
        out.push(
            Diagnostic::error("VEX-SEM-UNDEFINED", node.position())
                .with_param("pass", "4")
                .with_message(format!("'{}' is not defined", name)),
        );
        return;
    };

    match Namespace::resolve(ns, sym) {
        None => {
            out.push(
                Diagnostic::error("VEX-SEM-UNDEFINED", node.position())
                    .with_param("pass", "4")
                    .with_message(format!("'{}' is not defined", name)),
            );
        }
        Some(binding) if !binding.is_mutable => {
            out.push(
                Diagnostic::error("VEX-SEM-IMMUTABLE", node.position())
                    .with_param("pass", "4")
                    .with_message(format!("cannot 'set!' immutable binding '{}'", name)),
            );
        }
        _ => {}
    }
}

fn check_qualified_access_at(
    position: vexc_base::Position,
    pkg: &str,
    name: &str,
    ctx: &AnalysisContext,
    out: &mut Vec<Diagnostic>,
) {
    let Some(exported) = ctx.exports.get(pkg) else {
        // Not a known local package - either an external target import
        // or not imported at all; codegen/resolver already cover that.
        return;
    };
    if !exported.contains(name) {
        out.push(
            Diagnostic::error("VEX-PKG-NOT-EXPORTED", position)
                .with_param("pass", "4")
                .with_param("package", pkg.to_string())
                .with_param("name", name.to_string())
                .with_suggestion(format!("Export it with (export [{}]) in that package.", name))
                .with_message(format!("'{}' is not exported by package '{}'", name, pkg)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::collect_symbols;
    use crate::infer::infer_program;
    use std::collections::{HashMap, HashSet};
    use vexc_base::Interner;
    use vexc_syntax::parse;

    fn analyzed(src: &str, exports: HashMap<String, HashSet<String>>) -> (vexc_syntax::Program, AnalysisContext) {
        let program = parse(src, "t.vx").unwrap();
        let mut ctx = AnalysisContext::new(Interner::new(), exports, HashMap::new(), HashSet::new());
        collect_symbols(&program, &mut ctx);
        infer_program(&program, &mut ctx);
        (program, ctx)
    }

    #[test]
    fn set_on_def_bound_name_is_allowed() {
        let (program, mut ctx) = analyzed("(def x 1) (set! x 2)", HashMap::new());
        assert!(validate_semantics(&program, &mut ctx).is_empty());
    }

    #[test]
    fn set_on_undefined_name_is_reported() {
        let (program, mut ctx) = analyzed("(set! ghost 2)", HashMap::new());
        let diags = validate_semantics(&program, &mut ctx);
        assert!(diags.iter().any(|d| d.code == "VEX-SEM-UNDEFINED"));
    }

    #[test]
    fn set_on_fn_parameter_is_immutable() {
        let (program, mut ctx) = analyzed("(def f (fn [x] (set! x 2)))", HashMap::new());
        let diags = validate_semantics(&program, &mut ctx);
        assert!(diags.iter().any(|d| d.code == "VEX-SEM-IMMUTABLE"));
    }

    #[test]
    fn unexported_qualified_access_is_reported() {
        let mut exports = HashMap::new();
        exports.insert("a".to_string(), HashSet::new());
        let (program, mut ctx) = analyzed("(a/secret 1)", exports);
        let diags = validate_semantics(&program, &mut ctx);
        assert!(diags.iter().any(|d| d.code == "VEX-PKG-NOT-EXPORTED"));
    }

    #[test]
    fn exported_qualified_access_is_allowed() {
        let mut exports = HashMap::new();
        exports.insert("a".to_string(), ["id".to_string()].into_iter().collect());
        let (program, mut ctx) = analyzed("(a/id 1)", exports);
        assert!(validate_semantics(&program, &mut ctx).is_empty());
    }
}
