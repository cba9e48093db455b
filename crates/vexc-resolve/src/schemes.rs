use std::collections::HashMap;

use vexc_syntax::{Node, Program};
use vexc_types::{Scheme, Type, UnificationTable};

const ARITHMETIC_OPS: &[&str] = &["+", "-", "*", "/"];
const COMPARISON_OPS: &[&str] = &["<", ">", "<=", ">=", "=", "!="];

/// A reduced, standalone Hindley-Milner pass used only to populate
/// `pkg_schemes` for cross-package callsites. Deliberately not the
/// full four-pass analyzer: it never emits diagnostics, skips forms it
/// doesn't recognize (leaving them `Unknown`), and has no namespace
/// chain, only a flat per-package environment - good enough to type
/// a package's exported defs without coupling this crate to the
/// analyzer crate.
struct LightInference {
    table: UnificationTable,
}

impl LightInference {
    fn new() -> Self {
        LightInference { table: UnificationTable::new() }
    }

    fn infer(&mut self, node: &Node, env: &mut HashMap<String, Type>) -> Type {
        match node {
            Node::Terminal { text, .. } => self.infer_terminal(text, env),
            Node::Array(_) => {
                let elem = self.table.fresh();
                for child in node.content() {
                    let t = self.infer(child, env);
                    let _ = self.table.unify(&elem, &t, "array element");
                }
                Type::List(Box::new(self.table.apply(&elem)))
            }
            Node::List(_) => self.infer_list(node, env),
        }
    }

    fn infer_terminal(&mut self, text: &str, env: &HashMap<String, Type>) -> Type {
        if text.starts_with('"') {
            return Type::String;
        }
        if text == "true" || text == "false" {
            return Type::Bool;
        }
        if vexc_syntax::lexer::is_number_text(text) {
            return if text.contains('.') { Type::Float } else { Type::Int };
        }
        env.get(text).cloned().unwrap_or_else(|| self.table.fresh())
    }

    fn infer_list(&mut self, node: &Node, env: &mut HashMap<String, Type>) -> Type {
        let content = node.content();
        let Some(head) = content.first().and_then(Node::as_terminal_text) else {
            return self.table.fresh();
        };

        match head {
            "def" => {
                let name = content.get(1).and_then(Node::as_terminal_text).unwrap_or("").to_string();
                let value_ty = content.get(2).map(|v| self.infer(v, env)).unwrap_or(Type::Unknown(0));
                env.insert(name, value_ty);
                self.table.fresh()
            }
            "fn" => {
                let params_node = content.get(1);
                let mut child_env = env.clone();
                let mut param_types = Vec::new();
                if let Some(params_node) = params_node {
                    for p in params_node.content().iter().filter_map(Node::as_terminal_text) {
                        let t = self.table.fresh();
                        child_env.insert(p.to_string(), t.clone());
                        param_types.push(t);
                    }
                }
                let body_ty = content
                    .get(2)
                    .map(|b| self.infer(b, &mut child_env))
                    .unwrap_or_else(|| self.table.fresh());
                Type::Function(param_types, Box::new(body_ty))
            }
            "if" => {
                let then_ty = content.get(2).map(|n| self.infer(n, env)).unwrap_or_else(|| self.table.fresh());
                let else_ty = content.get(3).map(|n| self.infer(n, env)).unwrap_or_else(|| self.table.fresh());
                let _ = self.table.unify(&then_ty, &else_ty, "if branches");
                self.table.apply(&then_ty)
            }
            op if ARITHMETIC_OPS.contains(&op) => {
                let mut common = self.table.fresh();
                for arg in &content[1..] {
                    let t = self.infer(arg, env);
                    let _ = self.table.unify(&common, &t, "arithmetic operand");
                    common = self.table.apply(&common);
                }
                common
            }
            op if COMPARISON_OPS.contains(&op) => {
                let mut common = self.table.fresh();
                for arg in &content[1..] {
                    let t = self.infer(arg, env);
                    let _ = self.table.unify(&common, &t, "comparison operand");
                    common = self.table.apply(&common);
                }
                Type::Bool
            }
            _ => {
                // Bare call: `(f a1 a2 ...)`. Infer arguments for their
                // side constraints, result left open since this pass
                // has no access to the callee's own scheme yet.
                for arg in &content[1..] {
                    self.infer(arg, env);
                }
                self.table.fresh()
            }
        }
    }
}

/// Infers a `Scheme` for every name in `exports` that has a top-level
/// `(def name value)` in `program`, generalizing over the free type
/// variables left in its inferred type. Names not found get no entry
/// (the analyzer proper will report the missing definition).
pub fn infer_package_schemes(program: &Program, exports: &std::collections::HashSet<String>) -> HashMap<String, Scheme> {
    let mut inference = LightInference::new();
    let mut env = HashMap::new();
    let mut raw: HashMap<String, Type> = HashMap::new();

    for node in program {
        if node.list_head() == Some("def") {
            let content = node.content();
            if let Some(name) = content.get(1).and_then(Node::as_terminal_text) {
                let value_ty = content.get(2).map(|v| inference.infer(v, &mut env)).unwrap_or(Type::Unknown(0));
                let value_ty = inference.table.apply(&value_ty);
                env.insert(name.to_string(), value_ty.clone());
                raw.insert(name.to_string(), value_ty);
            }
        }
    }

    raw.into_iter()
        .filter(|(name, _)| exports.contains(name))
        .map(|(name, ty)| (name, Scheme::generalize(inference.table.apply(&ty))))
        .collect()
}
