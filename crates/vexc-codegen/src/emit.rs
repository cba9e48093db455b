use vexc_analyze::AnalysisContext;
use vexc_base::Diagnostic;
use vexc_syntax::{Node, Program};
use vexc_types::Type;

use crate::context::CodegenContext;
use crate::types::{render_type, zero_value};

const ARITHMETIC_OPS: &[&str] = &["+", "-", "*", "/"];
const COMPARISON_OPS: &[&str] = &["<", ">", "<=", ">=", "=", "!="];
const BUILTIN_LIST_OPS: &[&str] = &["first", "rest", "cons", "count", "empty?"];

fn comparison_token(op: &str) -> &'static str {
    match op {
        "<" => "<",
        ">" => ">",
        "<=" => "<=",
        ">=" => ">=",
        "=" => "==",
        "!=" => "!=",
        _ => unreachable!("comparison_token called with non-comparison op"),
    }
}

fn indent(depth: usize) -> String {
    "\t".repeat(depth)
}

fn unquote(text: &str) -> String {
    text.trim_matches('"').to_string()
}

/// Lowers the macro-expanded, type-annotated `program` to a single
/// Target (Go) source string. `package_name` is the `package ...`
/// clause; `analysis` supplies inferred types plus the resolver's
/// `ignore_imports`/`exports` for cross-package call lowering.
/// Diagnostics are accumulated rather than aborting emission early, to
/// match every other phase's "surface everything, emit nothing on
/// error" policy (the orchestrator checks `has_errors` before using
/// the returned string).
pub fn generate_program(program: &Program, analysis: &AnalysisContext, package_name: &str) -> (String, Vec<Diagnostic>) {
    let mut cgctx = CodegenContext::new(analysis);
    let mut diagnostics = Vec::new();

    collect_imports(program, &mut cgctx);

    let body_nodes: Vec<&Node> = program
        .iter()
        .filter(|n| !matches!(n.list_head(), Some("import") | Some("export") | Some("macro")))
        .collect();

    let mut body_lines = Vec::new();
    for (i, node) in body_nodes.iter().enumerate() {
        let is_last = i + 1 == body_nodes.len();
        body_lines.push(emit_stmt(node, &cgctx, 1, is_last, &mut diagnostics));
    }

    let mut out = String::new();
    out.push_str(&format!("package {}\n\n", package_name));
    if !cgctx.imports.is_empty() {
        out.push_str("import (\n");
        for entry in &cgctx.imports {
            match &entry.alias {
                Some(alias) => out.push_str(&format!("\t{} \"{}\"\n", alias, entry.path)),
                None => out.push_str(&format!("\t\"{}\"\n", entry.path)),
            }
        }
        out.push_str(")\n\n");
    }
    out.push_str("func main() {\n");
    for line in &body_lines {
        out.push_str(&indent(1));
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("}\n");

    (out, diagnostics)
}

/// Scans top-level `(import [...])` forms and registers every path not
/// covered by `ignore_imports` (local packages the resolver already
/// folded into the combined source) as a Target import.
fn collect_imports(program: &Program, cgctx: &mut CodegenContext) {
    for node in program {
        if node.list_head() != Some("import") {
            continue;
        }
        let Some(array) = node.content().get(1) else { continue };
        for item in array.content() {
            match item {
                Node::Terminal { text, .. } => {
                    let path = unquote(text);
                    if !cgctx.analysis.ignore_imports.contains(&path) {
                        cgctx.add_import(path, None);
                    }
                }
                Node::Array(_) => {
                    let parts = item.content();
                    let Some(path) = parts.first().and_then(Node::as_terminal_text).map(unquote) else { continue };
                    if !cgctx.analysis.ignore_imports.contains(&path) {
                        let alias = parts.get(1).and_then(Node::as_terminal_text).map(str::to_string);
                        cgctx.add_import(path, alias);
                    }
                }
                Node::List(_) => {}
            }
        }
    }
}

/// True for forms that lower to a Target function/method call
/// statement - valid as a bare statement regardless of position,
/// unlike a standalone arithmetic or literal expression.
fn is_call_form(node: &Node) -> bool {
    match node.list_head() {
        Some(head) => {
            !ARITHMETIC_OPS.contains(&head)
                && !COMPARISON_OPS.contains(&head)
                && !matches!(head, "if" | "when" | "unless" | "do" | "let" | "def" | "deftype" | "set!" | "fn")
        }
        None => false,
    }
}

/// Lowers one top-level or nested form in statement position. Special
/// forms that have their own Target statement shape (`def`, `set!`,
/// `if`, `do`, `let`, calls) are emitted as such; anything else falls
/// back to a value expression, discarded with `_ = ...` only when
/// `is_last` - the implicit-return rule for the final top-level form.
fn emit_stmt(node: &Node, ctx: &CodegenContext, depth: usize, is_last: bool, diags: &mut Vec<Diagnostic>) -> String {
    let content = node.content();
    match node.list_head() {
        Some("def") => emit_def(node, content, ctx, diags),
        Some("deftype") => String::new(),
        Some("set!") => emit_set(content, ctx, diags),
        Some("if") => emit_if_stmt(node, content, ctx, depth, diags),
        Some("when") => emit_when_stmt(content, ctx, depth, false, diags),
        Some("unless") => emit_when_stmt(content, ctx, depth, true, diags),
        Some("do") => emit_do_stmt(content, ctx, depth, is_last, diags),
        Some("let") => emit_let_stmt(content, ctx, depth, is_last, diags),
        _ if is_call_form(node) => emit_expr(node, ctx, diags),
        _ => {
            let expr = emit_expr(node, ctx, diags);
            if is_last {
                format!("_ = {}", expr)
            } else {
                expr
            }
        }
    }
}

fn emit_def(node: &Node, content: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let Some(name) = content.get(1).and_then(Node::as_terminal_text) else {
        diags.push(
            Diagnostic::error("VEX-CODEGEN-MALFORMED-DEF", node.position())
                .with_message("'def' is missing a name"),
        );
        return String::new();
    };
    let ty = content.get(2).map(|n| ctx.type_of(n)).unwrap_or(Type::Unknown(u32::MAX));
    let value = content.get(2).map(|v| emit_expr(v, ctx, diags)).unwrap_or_else(|| "nil".to_string());
    format!("var {} {} = {}", name, render_type(&ty), value)
}

fn emit_set(content: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let name = content.get(1).and_then(Node::as_terminal_text).unwrap_or("_");
    let value = content.get(2).map(|v| emit_expr(v, ctx, diags)).unwrap_or_else(|| "nil".to_string());
    format!("{} = {}", name, value)
}

fn emit_if_stmt(_node: &Node, content: &[Node], ctx: &CodegenContext, depth: usize, diags: &mut Vec<Diagnostic>) -> String {
    let cond = content.get(1).map(|c| emit_expr(c, ctx, diags)).unwrap_or_else(|| "false".to_string());
    let then_branch = match content.get(2) {
        Some(t) => emit_stmt(t, ctx, depth + 1, false, diags),
        None => String::new(),
    };
    let mut out = format!("if {} {{\n{}{}\n{}}}", cond, indent(depth + 1), then_branch, indent(depth));
    if let Some(els) = content.get(3) {
        let else_branch = emit_stmt(els, ctx, depth + 1, false, diags);
        out.push_str(&format!(" else {{\n{}{}\n{}}}", indent(depth + 1), else_branch, indent(depth)));
    }
    out
}

fn emit_when_stmt(content: &[Node], ctx: &CodegenContext, depth: usize, negate: bool, diags: &mut Vec<Diagnostic>) -> String {
    let cond = content.get(1).map(|c| emit_expr(c, ctx, diags)).unwrap_or_else(|| "false".to_string());
    let cond = if negate { format!("!({})", cond) } else { cond };
    let body = match content.get(2) {
        Some(b) => emit_stmt(b, ctx, depth + 1, false, diags),
        None => String::new(),
    };
    format!("if {} {{\n{}{}\n{}}}", cond, indent(depth + 1), body, indent(depth))
}

fn emit_do_stmt(content: &[Node], ctx: &CodegenContext, depth: usize, is_last: bool, diags: &mut Vec<Diagnostic>) -> String {
    let exprs = &content[1..];
    let mut lines = Vec::new();
    for (i, e) in exprs.iter().enumerate() {
        let last = is_last && i + 1 == exprs.len();
        lines.push(emit_stmt(e, ctx, depth, last, diags));
    }
    lines.join(&format!("\n{}", indent(depth)))
}

fn emit_let_stmt(content: &[Node], ctx: &CodegenContext, depth: usize, is_last: bool, diags: &mut Vec<Diagnostic>) -> String {
    let name = content.get(1).and_then(Node::as_terminal_text).unwrap_or("_");
    let value = content.get(2).map(|v| emit_expr(v, ctx, diags)).unwrap_or_else(|| "nil".to_string());
    let mut out = format!("{} := {}", name, value);
    if let Some(body) = content.get(3) {
        out.push('\n');
        out.push_str(&indent(depth));
        out.push_str(&emit_stmt(body, ctx, depth, is_last, diags));
    }
    out
}

/// Lowers one form in expression position - the counterpart to
/// `emit_stmt` used for call arguments, `def` initializers, array
/// elements, and branches of an `if` used as a value.
fn emit_expr(node: &Node, ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    match node {
        Node::Terminal { text, .. } => emit_terminal(text),
        Node::Array(_) => emit_array(node, ctx, diags),
        Node::List(_) => emit_list_expr(node, ctx, diags),
    }
}

fn emit_terminal(text: &str) -> String {
    text.to_string()
}

fn emit_array(node: &Node, ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let ty = ctx.type_of(node);
    let elem_ty = match &ty {
        Type::List(elem) => render_type(elem),
        _ => "any".to_string(),
    };
    let elems: Vec<String> = node.content().iter().map(|e| emit_expr(e, ctx, diags)).collect();
    format!("[]{}{{{}}}", elem_ty, elems.join(", "))
}

fn emit_list_expr(node: &Node, ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let content = node.content();
    let Some(head) = content.first().and_then(Node::as_terminal_text) else {
        diags.push(
            Diagnostic::error("VEX-CODEGEN-EMPTY-FORM", node.position())
                .with_message("empty list in expression position"),
        );
        return "nil".to_string();
    };

    match head {
        "if" => emit_if_expr(node, content, ctx, diags),
        "when" => emit_when_expr(content, ctx, false, diags),
        "unless" => emit_when_expr(content, ctx, true, diags),
        "do" => emit_do_expr(node, content, ctx, diags),
        "let" => emit_let_expr(content, ctx, diags),
        "fn" => emit_fn_expr(content, ctx, diags),
        op if ARITHMETIC_OPS.contains(&op) => emit_fold(op, &content[1..], ctx, diags),
        op if COMPARISON_OPS.contains(&op) => emit_comparison(op, &content[1..], ctx, diags),
        head if head.starts_with('.') => emit_method_call(head, &content[1..], ctx, diags),
        head if BUILTIN_LIST_OPS.contains(&head) => emit_builtin(head, &content[1..], ctx, diags),
        _ => emit_call(node, head, &content[1..], ctx, diags),
    }
}

fn emit_if_expr(node: &Node, content: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let cond = content.get(1).map(|c| emit_expr(c, ctx, diags)).unwrap_or_else(|| "false".to_string());
    let result_ty = render_type(&ctx.type_of(node));
    let then_expr = content.get(2).map(|t| emit_expr(t, ctx, diags)).unwrap_or_else(|| "nil".to_string());
    let else_expr = content.get(3).map(|e| emit_expr(e, ctx, diags)).unwrap_or_else(|| "nil".to_string());
    format!(
        "func() {result_ty} {{\n\t\tif {cond} {{\n\t\t\treturn {then_expr}\n\t\t}} else {{\n\t\t\treturn {else_expr}\n\t\t}}\n\t}}()"
    )
}

fn emit_when_expr(content: &[Node], ctx: &CodegenContext, negate: bool, diags: &mut Vec<Diagnostic>) -> String {
    let cond = content.get(1).map(|c| emit_expr(c, ctx, diags)).unwrap_or_else(|| "false".to_string());
    let cond = if negate { format!("!({})", cond) } else { cond };
    let then_ty = content.get(2).map(|t| ctx.type_of(t)).unwrap_or(Type::Unknown(u32::MAX));
    let result_ty = render_type(&then_ty);
    let then_expr = content.get(2).map(|t| emit_expr(t, ctx, diags)).unwrap_or_else(|| "nil".to_string());
    let absent = zero_value(&then_ty);
    format!(
        "func() {result_ty} {{\n\t\tif {cond} {{\n\t\t\treturn {then_expr}\n\t\t}}\n\t\treturn {absent}\n\t}}()"
    )
}

fn emit_do_expr(node: &Node, content: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let exprs = &content[1..];
    let result_ty = render_type(&ctx.type_of(node));
    let mut lines = Vec::new();
    for (i, e) in exprs.iter().enumerate() {
        if i + 1 == exprs.len() {
            lines.push(format!("return {}", emit_expr(e, ctx, diags)));
        } else {
            lines.push(emit_stmt(e, ctx, 2, false, diags));
        }
    }
    format!("func() {} {{\n\t\t{}\n\t}}()", result_ty, lines.join("\n\t\t"))
}

fn emit_let_expr(content: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let name = content.get(1).and_then(Node::as_terminal_text).unwrap_or("_");
    let value = content.get(2).map(|v| emit_expr(v, ctx, diags)).unwrap_or_else(|| "nil".to_string());
    let body_ty = content.get(3).map(|b| ctx.type_of(b)).unwrap_or(Type::Unknown(u32::MAX));
    let result_ty = render_type(&body_ty);
    let body = content.get(3).map(|b| emit_expr(b, ctx, diags)).unwrap_or_else(|| "nil".to_string());
    format!("func() {} {{\n\t\t{} := {}\n\t\treturn {}\n\t}}()", result_ty, name, value, body)
}

fn emit_fn_expr(content: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let params_node = content.get(1);
    let mut rendered_params = Vec::new();
    if let Some(params_node) = params_node {
        for p in params_node.content() {
            if let Some(name) = p.as_terminal_text() {
                let ty = render_type(&ctx.type_of(p));
                rendered_params.push(format!("{} {}", name, ty));
            }
        }
    }
    let body_ty = content.get(2).map(|b| ctx.type_of(b)).unwrap_or(Type::Unknown(u32::MAX));
    let result_ty = render_type(&body_ty);
    let body = content.get(2).map(|b| emit_expr(b, ctx, diags)).unwrap_or_else(|| "nil".to_string());
    format!("func({}) {} {{\n\t\treturn {}\n\t}}", rendered_params.join(", "), result_ty, body)
}

fn emit_fold(op: &str, args: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let parts: Vec<String> = args.iter().map(|a| emit_expr(a, ctx, diags)).collect();
    let Some((first, rest)) = parts.split_first() else {
        return "0".to_string();
    };
    let mut acc = first.clone();
    for part in rest {
        acc = format!("({} {} {})", acc, op, part);
    }
    acc
}

fn emit_comparison(op: &str, args: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let parts: Vec<String> = args.iter().map(|a| emit_expr(a, ctx, diags)).collect();
    let token = comparison_token(op);
    if parts.len() < 2 {
        return "true".to_string();
    }
    let mut acc = format!("({} {} {})", parts[0], token, parts[1]);
    for window in parts.windows(2).skip(1) {
        acc = format!("({} && ({} {} {}))", acc, window[0], token, window[1]);
    }
    acc
}

fn emit_method_call(head: &str, args: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let method = &head[1..];
    let Some((receiver, rest)) = args.split_first() else {
        return format!("nil.{}()", method);
    };
    let receiver_expr = emit_expr(receiver, ctx, diags);
    let arg_exprs: Vec<String> = rest.iter().map(|a| emit_expr(a, ctx, diags)).collect();
    format!("{}.{}({})", receiver_expr, method, arg_exprs.join(", "))
}

fn emit_builtin(head: &str, args: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let arg_exprs: Vec<String> = args.iter().map(|a| emit_expr(a, ctx, diags)).collect();
    match head {
        "first" => format!("{}[0]", arg_exprs.first().cloned().unwrap_or_default()),
        "rest" => format!("{}[1:]", arg_exprs.first().cloned().unwrap_or_default()),
        "cons" => format!(
            "append([]any{{{}}}, {}...)",
            arg_exprs.first().cloned().unwrap_or_default(),
            arg_exprs.get(1).cloned().unwrap_or_default()
        ),
        "count" => format!("len({})", arg_exprs.first().cloned().unwrap_or_default()),
        "empty?" => format!("len({}) == 0", arg_exprs.first().cloned().unwrap_or_default()),
        _ => unreachable!("emit_builtin called with non-builtin head"),
    }
}

/// Lowers a call. A `pkg/name` head is split: if `pkg` is a local
/// package the resolver already folded into the combined source, the
/// call is emitted unqualified; otherwise it becomes `pkg.name(...)`.
/// A `pkg/name` call where `pkg` is local but `name` isn't in its
/// export set is a codegen-time failure - pass 4 already reports this
/// as `VEX-PKG-NOT-EXPORTED`, but emission re-checks since a caller
/// may invoke codegen directly on an already-expanded tree without
/// running the full analyzer.
fn emit_call(node: &Node, head: &str, args: &[Node], ctx: &CodegenContext, diags: &mut Vec<Diagnostic>) -> String {
    let arg_exprs: Vec<String> = args.iter().map(|a| emit_expr(a, ctx, diags)).collect();
    let joined = arg_exprs.join(", ");

    if let Some((pkg, name)) = head.split_once('/') {
        if ctx.analysis.ignore_imports.contains(pkg) {
            if let Some(exported) = ctx.analysis.exports.get(pkg) {
                if !exported.contains(name) {
                    diags.push(
                        Diagnostic::error("VEX-CODEGEN-NOT-EXPORTED", node.position())
                            .with_param("package", pkg.to_string())
                            .with_param("name", name.to_string())
                            .with_message(format!("'{}' is not exported by package '{}'", name, pkg)),
                    );
                }
            }
            return format!("{}({})", name, joined);
        }
        return format!("{}.{}({})", pkg, name, joined);
    }

    format!("{}({})", head, joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use vexc_analyze::{analyze, AnalysisContext};
    use vexc_base::Interner;
    use vexc_syntax::parse;

    fn generate(src: &str) -> (String, Vec<Diagnostic>, AnalysisContext) {
        let program = parse(src, "t.vx").unwrap();
        let (_diags, actx) = analyze(&program, Interner::new(), HashMap::new(), HashMap::new(), HashSet::new());
        let (out, diags) = generate_program(&program, &actx, "main");
        (out, diags, actx)
    }

    #[test]
    fn s1_arithmetic_expression_with_no_extra_imports() {
        let (out, diags, _) = generate("(+ 1 2)");
        assert!(diags.is_empty());
        assert!(out.contains("(1 + 2)"));
        assert!(!out.contains("import"));
    }

    #[test]
    fn s2_def_initializer_and_call_reference_x() {
        let (out, diags, _) = generate(r#"(def x (+ 5 3)) (println x)"#);
        assert!(diags.is_empty());
        assert!(out.contains("var x int = (5 + 3)"));
        assert!(out.contains("println(x)"));
    }

    #[test]
    fn s3_duplicate_imports_are_deduplicated() {
        let program = parse(r#"(import ["fmt"]) (import ["fmt"])"#, "t.vx").unwrap();
        let (_diags, actx) = analyze(&program, Interner::new(), HashMap::new(), HashMap::new(), HashSet::new());
        let (out, _) = generate_program(&program, &actx, "main");
        assert_eq!(out.matches("\"fmt\"").count(), 1);
    }

    #[test]
    fn if_expression_in_a_def_becomes_an_iife() {
        let (out, diags, _) = generate(r#"(def result (if (> 5 3) "yes" "no"))"#);
        assert!(diags.is_empty());
        assert!(out.contains("func() string"));
        assert!(out.contains("\"yes\""));
        assert!(out.contains("\"no\""));
    }

    #[test]
    fn cross_package_call_to_ignored_import_is_unqualified() {
        let program = parse("(a/id 1)", "t.vx").unwrap();
        let mut exports = HashMap::new();
        exports.insert("a".to_string(), ["id".to_string()].into_iter().collect());
        let mut ignore = HashSet::new();
        ignore.insert("a".to_string());
        let (_diags, actx) = analyze(&program, Interner::new(), exports, HashMap::new(), ignore);
        let (out, diags) = generate_program(&program, &actx, "main");
        assert!(diags.is_empty());
        assert!(out.contains("id(1)"));
        assert!(!out.contains("a.id"));
    }

    #[test]
    fn cross_package_call_to_external_import_is_qualified() {
        let program = parse("(http/get 1)", "t.vx").unwrap();
        let (_diags, actx) = analyze(&program, Interner::new(), HashMap::new(), HashMap::new(), HashSet::new());
        let (out, diags) = generate_program(&program, &actx, "main");
        assert!(diags.is_empty());
        assert!(out.contains("http.get(1)"));
    }

    #[test]
    fn method_call_emits_receiver_dot_method() {
        let (out, diags, _) = generate(r#"(def buf "x") (.WriteString buf "y")"#);
        assert!(diags.is_empty());
        assert!(out.contains("buf.WriteString(\"y\")"));
    }

    #[test]
    fn array_literal_emits_target_slice() {
        let (out, diags, _) = generate("(def xs [1 2 3])");
        assert!(diags.is_empty());
        assert!(out.contains("[]int{1, 2, 3}"));
    }

    #[test]
    fn builtin_list_ops_lower_to_slice_operations() {
        let (out, diags, _) = generate("(def xs [1 2 3]) (count xs)");
        assert!(diags.is_empty());
        assert!(out.contains("len(xs)"));
    }
}
