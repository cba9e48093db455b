use std::cell::RefCell;
use std::rc::Rc;

use vexc_syntax::{Node, Program};
use vexc_types::{Namespace, Scheme, Type};

use crate::context::AnalysisContext;

const ARITHMETIC_OPS: &[&str] = &["+", "-", "*", "/"];
const COMPARISON_OPS: &[&str] = &["<", ">", "<=", ">=", "=", "!="];

/// Pass 2: constraint-based Hindley-Milner inference over the
/// post-expansion program. Records every node's inferred type into
/// `ctx.node_types`; unification failures are swallowed here (the
/// binding or node simply keeps whatever type it already had) because
/// turning them into diagnostics is pass 3's job, not this one's.
pub fn infer_program(program: &Program, ctx: &mut AnalysisContext) {
    let global = ctx.namespaces.global.clone();
    for node in program {
        infer(node, &global, ctx);
    }
}

pub fn infer(node: &Node, ns: &Rc<RefCell<Namespace>>, ctx: &mut AnalysisContext) -> Type {
    let ty = infer_uncached(node, ns, ctx);
    ctx.record_type(node, ty.clone());
    ty
}

fn infer_uncached(node: &Node, ns: &Rc<RefCell<Namespace>>, ctx: &mut AnalysisContext) -> Type {
    match node {
        Node::Terminal { text, .. } => infer_terminal(text, ns, ctx),
        Node::Array(_) => {
            let elem = ctx.table.fresh();
            let mut common = elem;
            for child in node.content() {
                let t = infer(child, ns, ctx);
                let _ = ctx.table.unify(&common, &t, "array element");
                common = ctx.table.apply(&common);
            }
            Type::List(Box::new(common))
        }
        Node::List(_) => infer_list(node, ns, ctx),
    }
}

fn infer_terminal(text: &str, ns: &Rc<RefCell<Namespace>>, ctx: &mut AnalysisContext) -> Type {
    if text.starts_with('"') {
        return Type::String;
    }
    if text == "true" || text == "false" {
        return Type::Bool;
    }
    if vexc_syntax::lexer::is_number_text(text) {
        return if text.contains('.') { Type::Float } else { Type::Int };
    }
    if let Some(binding) = ctx.namespaces.resolve_qualified(ns, &ctx.interner, text) {
        return binding.ty;
    }
    ctx.table.fresh()
}

fn infer_list(node: &Node, ns: &Rc<RefCell<Namespace>>, ctx: &mut AnalysisContext) -> Type {
    let content = node.content();
    let Some(head) = content.first().and_then(Node::as_terminal_text) else {
        return ctx.table.fresh();
    };

    match head {
        "def" => {
            let name = content.get(1).and_then(Node::as_terminal_text);
            let value_ty = content.get(2).map(|v| infer(v, ns, ctx)).unwrap_or_else(|| ctx.table.fresh());
            if let Some(name) = name {
                let sym = ctx.interner.intern(name);
                if let Some(prebound) = Namespace::local_resolve(ns, sym) {
                    let _ = ctx.table.unify(&prebound.ty, &value_ty, "def initializer");
                }
                let resolved = ctx.table.apply(&value_ty);
                let is_fn = matches!(resolved, Type::Function(..));
                Namespace::bind(ns, sym, resolved, true, is_fn);
            }
            ctx.table.fresh()
        }
        "deftype" => ctx.table.fresh(),
        "set!" => {
            let value_ty = content.get(2).map(|v| infer(v, ns, ctx)).unwrap_or_else(|| ctx.table.fresh());
            if let Some(name) = content.get(1).and_then(Node::as_terminal_text) {
                if let Some(sym) = ctx.interner.lookup(name) {
                    if let Some(binding) = Namespace::resolve(ns, sym) {
                        let _ = ctx.table.unify(&binding.ty, &value_ty, "set! assignment");
                    }
                }
            }
            ctx.table.fresh()
        }
        "fn" => {
            let params_node = content.get(1);
            let child = Namespace::new_child(ns, "fn-body");
            let mut param_types = Vec::new();
            if let Some(params_node) = params_node {
                for p in params_node.content().iter().filter_map(Node::as_terminal_text) {
                    let t = ctx.table.fresh();
                    let sym = ctx.interner.intern(p);
                    Namespace::bind(&child, sym, t.clone(), false, false);
                    param_types.push(t);
                }
            }
            let body_ty = content.get(2).map(|b| infer(b, &child, ctx)).unwrap_or_else(|| ctx.table.fresh());
            Type::Function(param_types.iter().map(|t| ctx.table.apply(t)).collect(), Box::new(ctx.table.apply(&body_ty)))
        }
        "if" => {
            let cond_ty = content.get(1).map(|c| infer(c, ns, ctx)).unwrap_or_else(|| ctx.table.fresh());
            let _ = ctx.table.unify(&cond_ty, &Type::Bool, "if condition");
            let then_ty = content.get(2).map(|t| infer(t, ns, ctx)).unwrap_or_else(|| ctx.table.fresh());
            let else_ty = content.get(3).map(|e| infer(e, ns, ctx)).unwrap_or_else(|| ctx.table.fresh());
            let _ = ctx.table.unify(&then_ty, &else_ty, "if branches");
            ctx.table.apply(&then_ty)
        }
        "when" => {
            let cond_ty = content.get(1).map(|c| infer(c, ns, ctx)).unwrap_or_else(|| ctx.table.fresh());
            let _ = ctx.table.unify(&cond_ty, &Type::Bool, "when condition");
            content.get(2).map(|b| infer(b, ns, ctx)).unwrap_or_else(|| ctx.table.fresh())
        }
        "unless" => {
            let cond_ty = content.get(1).map(|c| infer(c, ns, ctx)).unwrap_or_else(|| ctx.table.fresh());
            let _ = ctx.table.unify(&cond_ty, &Type::Bool, "unless condition");
            content.get(2).map(|b| infer(b, ns, ctx)).unwrap_or_else(|| ctx.table.fresh())
        }
        "do" => {
            let mut last = ctx.table.fresh();
            for e in &content[1..] {
                last = infer(e, ns, ctx);
            }
            last
        }
        "let" => {
            // Desugars to `((fn [name] body) value)`: a single
            // immutable binding group, no mutual recursion.
            let name = content.get(1).and_then(Node::as_terminal_text);
            let value_ty = content.get(2).map(|v| infer(v, ns, ctx)).unwrap_or_else(|| ctx.table.fresh());
            let child = Namespace::new_child(ns, "let-body");
            if let Some(name) = name {
                let sym = ctx.interner.intern(name);
                Namespace::bind(&child, sym, value_ty, false, false);
            }
            content.get(3).map(|b| infer(b, &child, ctx)).unwrap_or_else(|| ctx.table.fresh())
        }
        op if ARITHMETIC_OPS.contains(&op) => {
            let mut common = ctx.table.fresh();
            let mut saw_float = false;
            for arg in &content[1..] {
                let t = infer(arg, ns, ctx);
                let _ = ctx.table.unify(&common, &t, "arithmetic operand");
                common = ctx.table.apply(&common);
                if ctx.table.apply(&t) == Type::Float {
                    saw_float = true;
                }
            }
            // unify's Int/Float case deliberately doesn't rewrite either
            // side, so a leading Int operand leaves `common` as Int even
            // after a later Float operand unifies against it - promote
            // explicitly per the int-to-float promotion rule.
            if saw_float && common == Type::Int {
                common = Type::Float;
            }
            common
        }
        op if COMPARISON_OPS.contains(&op) => {
            let mut common = ctx.table.fresh();
            for arg in &content[1..] {
                let t = infer(arg, ns, ctx);
                let _ = ctx.table.unify(&common, &t, "comparison operand");
                common = ctx.table.apply(&common);
            }
            Type::Bool
        }
        head if head.starts_with('.') => {
            // Method call `(.Method receiver args...)`: receiver and
            // arguments are inferred for their constraints; result is
            // left open since Target's method signatures aren't modeled.
            for arg in &content[1..] {
                infer(arg, ns, ctx);
            }
            ctx.table.fresh()
        }
        _ => infer_call(head, content, ns, ctx),
    }
}

fn infer_call(head: &str, content: &[Node], ns: &Rc<RefCell<Namespace>>, ctx: &mut AnalysisContext) -> Type {
    let args = &content[1..];
    let arg_types: Vec<Type> = args.iter().map(|a| infer(a, ns, ctx)).collect();

    if let Some((pkg, name)) = head.split_once('/') {
        if let Some(schemes) = ctx.pkg_schemes.get(pkg) {
            if let Some(scheme) = schemes.get(name).cloned() {
                let fn_ty = instantiate(&scheme, ctx);
                return apply_call(&fn_ty, &arg_types, ctx);
            }
        }
    }

    if let Some(binding) = ctx.namespaces.resolve_qualified(ns, &ctx.interner, head) {
        return apply_call(&binding.ty, &arg_types, ctx);
    }

    ctx.table.fresh()
}

fn apply_call(fn_ty: &Type, arg_types: &[Type], ctx: &mut AnalysisContext) -> Type {
    match ctx.table.apply(fn_ty) {
        Type::Function(params, result) => {
            for (p, a) in params.iter().zip(arg_types.iter()) {
                let _ = ctx.table.unify(p, a, "call argument");
            }
            ctx.table.apply(&result)
        }
        _ => ctx.table.fresh(),
    }
}

/// Instantiates a `Scheme`'s quantified variables with fresh
/// `Unknown`s, for a cross-package callsite's callee type.
fn instantiate(scheme: &Scheme, ctx: &mut AnalysisContext) -> Type {
    let mut subst = std::collections::HashMap::new();
    for &q in &scheme.quantified {
        subst.insert(q, ctx.table.fresh());
    }
    substitute_vars(&scheme.body, &subst)
}

fn substitute_vars(ty: &Type, subst: &std::collections::HashMap<u32, Type>) -> Type {
    match ty {
        Type::Unknown(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::List(elem) => Type::List(Box::new(substitute_vars(elem, subst))),
        Type::Map(k, v) => Type::Map(Box::new(substitute_vars(k, subst)), Box::new(substitute_vars(v, subst))),
        Type::Function(params, result) => Type::Function(
            params.iter().map(|p| substitute_vars(p, subst)).collect(),
            Box::new(substitute_vars(result, subst)),
        ),
        other => other.clone(),
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
    fn infers_arithmetic_result_type() {
        let program = parse("(+ 1 2)", "t.vx").unwrap();
        let mut ctx = ctx();
        let global = ctx.namespaces.global.clone();
        let ty = infer(&program[0], &global, &mut ctx);
        assert_eq!(ctx.table.apply(&ty), Type::Int);
    }

    #[test]
    fn int_and_float_arithmetic_is_permitted() {
        let program = parse("(+ 1 2.5)", "t.vx").unwrap();
        let mut ctx = ctx();
        let global = ctx.namespaces.global.clone();
        infer(&program[0], &global, &mut ctx);
    }

    #[test]
    fn comparison_yields_bool() {
        let program = parse("(< 1 2)", "t.vx").unwrap();
        let mut ctx = ctx();
        let global = ctx.namespaces.global.clone();
        let ty = infer(&program[0], &global, &mut ctx);
        assert_eq!(ty, Type::Bool);
    }

    #[test]
    fn if_unifies_branch_types() {
        let program = parse("(if true 1 2)", "t.vx").unwrap();
        let mut ctx = ctx();
        let global = ctx.namespaces.global.clone();
        let ty = infer(&program[0], &global, &mut ctx);
        assert_eq!(ctx.table.apply(&ty), Type::Int);
    }

    #[test]
    fn let_binds_name_for_the_body() {
        let program = parse("(let x 5 (+ x 1))", "t.vx").unwrap();
        let mut ctx = ctx();
        let global = ctx.namespaces.global.clone();
        let ty = infer(&program[0], &global, &mut ctx);
        assert_eq!(ctx.table.apply(&ty), Type::Int);
    }

    #[test]
    fn do_yields_the_last_expressions_type() {
        let program = parse(r#"(do 1 "x" true)"#, "t.vx").unwrap();
        let mut ctx = ctx();
        let global = ctx.namespaces.global.clone();
        let ty = infer(&program[0], &global, &mut ctx);
        assert_eq!(ty, Type::Bool);
    }

    #[test]
    fn fn_literal_has_function_type() {
        let program = parse("(fn [x] x)", "t.vx").unwrap();
        let mut ctx = ctx();
        let global = ctx.namespaces.global.clone();
        let ty = infer(&program[0], &global, &mut ctx);
        assert!(matches!(ty, Type::Function(..)));
    }

    #[test]
    fn cross_package_call_instantiates_scheme() {
        let program = parse("(a/id 1)", "t.vx").unwrap();
        let mut schemes = HashMap::new();
        let mut pkg_schemes = HashMap::new();
        schemes.insert(
            "id".to_string(),
            Scheme::generalize(Type::Function(vec![Type::Unknown(0)], Box::new(Type::Unknown(0)))),
        );
        pkg_schemes.insert("a".to_string(), schemes);
        let mut ctx = AnalysisContext::new(Interner::new(), HashMap::new(), pkg_schemes, HashSet::new());
        let global = ctx.namespaces.global.clone();
        let ty = infer(&program[0], &global, &mut ctx);
        assert_eq!(ctx.table.apply(&ty), Type::Int);
    }
}
