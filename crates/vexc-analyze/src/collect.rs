use std::rc::Rc;

use vexc_syntax::{Node, Program};
use vexc_types::{Namespace, Type};

use crate::context::AnalysisContext;

/// Pass 1: pre-binds every top-level `(def name value)` to a fresh
/// `Unknown` and every `(deftype name body)` as a named placeholder,
/// recursing into nested lists so defs buried inside `fn`/`if`/`do`
/// bodies are collected too.
pub fn collect_symbols(program: &Program, ctx: &mut AnalysisContext) {
    let global = ctx.namespaces.global.clone();
    for node in program {
        collect_node(node, &global, ctx);
    }
}

fn collect_node(node: &Node, ns: &Rc<std::cell::RefCell<Namespace>>, ctx: &mut AnalysisContext) {
    if let Some(head) = node.list_head() {
        let content = node.content();
        match head {
            "def" => {
                if let Some(name) = content.get(1).and_then(Node::as_terminal_text) {
                    let sym = ctx.interner.intern(name);
                    let fresh = ctx.table.fresh();
                    Namespace::bind(ns, sym, fresh, true, false);
                }
            }
            "deftype" => {
                if let Some(name) = content.get(1).and_then(Node::as_terminal_text) {
                    let sym = ctx.interner.intern(name);
                    Namespace::bind(ns, sym, Type::Named(name.to_string()), false, false);
                }
            }
            _ => {}
        }
    }
    for child in node.content() {
        if child.is_list() || child.is_array() {
            collect_node(child, ns, ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use vexc_base::Interner;
    use vexc_syntax::parse;

    fn ctx() -> AnalysisContext {
        AnalysisContext::new(Interner::new(), HashMap::new(), HashMap::new(), HashSet::new())
    }

    #[test]
    fn binds_top_level_def_as_fresh_unknown() {
        let program = parse("(def x 1)", "t.vx").unwrap();
        let mut ctx = ctx();
        collect_symbols(&program, &mut ctx);
        let sym = ctx.interner.intern("x");
        let binding = Namespace::resolve(&ctx.namespaces.global, sym).unwrap();
        assert!(matches!(binding.ty, Type::Unknown(_)));
        assert!(binding.is_mutable);
    }

    #[test]
    fn collects_nested_defs() {
        let program = parse("(do (def inner 1))", "t.vx").unwrap();
        let mut ctx = ctx();
        collect_symbols(&program, &mut ctx);
        let sym = ctx.interner.intern("inner");
        assert!(Namespace::resolve(&ctx.namespaces.global, sym).is_some());
    }

    #[test]
    fn binds_deftype_as_named_placeholder() {
        let program = parse("(deftype Point (x y))", "t.vx").unwrap();
        let mut ctx = ctx();
        collect_symbols(&program, &mut ctx);
        let sym = ctx.interner.intern("Point");
        let binding = Namespace::resolve(&ctx.namespaces.global, sym).unwrap();
        assert_eq!(binding.ty, Type::Named("Point".to_string()));
    }
}
