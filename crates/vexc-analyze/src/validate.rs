use vexc_base::Diagnostic;
use vexc_syntax::{Node, Program};
use vexc_types::Type;

use crate::context::AnalysisContext;

const ARITHMETIC_OPS: &[&str] = &["+", "-", "*", "/"];
const SPECIAL_FORMS: &[&str] = &[
    "def", "deftype", "set!", "fn", "if", "when", "unless", "do", "let", "import", "export", "macro",
];
const COMPARISON_OPS: &[&str] = &["<", ">", "<=", ">=", "=", "!="];

/// Pass 3: re-walks the tree pass 2 already typed, checking the five
/// type-compatibility rules against the types recorded in
/// `ctx.node_types`. Reads, never recomputes, inference - pass 2
/// already resolved everything it could.
pub fn validate_program(program: &Program, ctx: &AnalysisContext) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for node in program {
        validate_node(node, ctx, &mut out);
    }
    out
}

fn validate_node(node: &Node, ctx: &AnalysisContext, out: &mut Vec<Diagnostic>) {
    if let Some(head) = node.list_head() {
        let content = node.content();
        match head {
            op if ARITHMETIC_OPS.contains(&op) => {
                for arg in &content[1..] {
                    let ty = ctx.table.apply(&ctx.type_of(arg));
                    if !ty.is_numeric() && !matches!(ty, Type::Unknown(_)) {
                        out.push(
                            Diagnostic::error("VEX-TYPE-NONNUMERIC", arg.position())
                                .with_param("pass", "3")
                                .with_param("found", ty.to_string())
                                .with_message(format!("arithmetic operand must be numeric, found {}", ty)),
                        );
                    }
                }
            }
            "if" => {
                if let Some(cond) = content.get(1) {
                    let ty = ctx.table.apply(&ctx.type_of(cond));
                    if ty != Type::Bool && !matches!(ty, Type::Unknown(_)) {
                        out.push(
                            Diagnostic::error("VEX-TYPE-NONBOOL-CONDITION", cond.position())
                                .with_param("pass", "3")
                                .with_param("found", ty.to_string())
                                .with_message(format!("'if' condition must be bool, found {}", ty)),
                        );
                    }
                }
                if let (Some(then), Some(els)) = (content.get(2), content.get(3)) {
                    let then_ty = ctx.table.apply(&ctx.type_of(then));
                    let else_ty = ctx.table.apply(&ctx.type_of(els));
                    if then_ty != else_ty && !matches!(then_ty, Type::Unknown(_)) && !matches!(else_ty, Type::Unknown(_)) {
                        out.push(
                            Diagnostic::error("VEX-TYPE-BRANCH-MISMATCH", node.position())
                                .with_param("pass", "3")
                                .with_param("then", then_ty.to_string())
                                .with_param("else", else_ty.to_string())
                                .with_message(format!(
                                    "'if' branches have incompatible types: {} vs {}",
                                    then_ty, else_ty
                                )),
                        );
                    }
                }
            }
            head if !SPECIAL_FORMS.contains(&head)
                && !COMPARISON_OPS.contains(&head)
                && !head.starts_with('.') =>
            {
                validate_call(node, head, content, ctx, out);
            }
            _ => {}
        }
    }

    if node.is_array() {
        let mut element_ty: Option<Type> = None;
        for child in node.content() {
            let ty = ctx.table.apply(&ctx.type_of(child));
            if matches!(ty, Type::Unknown(_)) {
                continue;
            }
            match &element_ty {
                None => element_ty = Some(ty),
                Some(expected) if *expected != ty => {
                    out.push(
                        Diagnostic::error("VEX-TYPE-ARRAY-MISMATCH", child.position())
                            .with_param("pass", "3")
                            .with_param("expected", expected.to_string())
                            .with_param("found", ty.to_string())
                            .with_message(format!("array elements must share a type: expected {}, found {}", expected, ty)),
                    );
                }
                _ => {}
            }
        }
    }

    for child in node.content() {
        if child.is_list() || child.is_array() {
            validate_node(child, ctx, out);
        }
    }
}

/// Checks a non-builtin call's argument count and argument types
/// against the callee's function type - read from a top-level/global
/// binding or, for a qualified `pkg/name` head, from `pkg_schemes`.
/// Locally-scoped callees (a function passed as a parameter) aren't
/// resolvable here since pass 3 doesn't retain pass 2's transient
/// per-`fn` child namespaces; such calls are simply not checked.
fn validate_call(node: &Node, head: &str, content: &[Node], ctx: &AnalysisContext, out: &mut Vec<Diagnostic>) {
    let fn_ty = if let Some((pkg, name)) = head.split_once('/') {
        ctx.pkg_schemes.get(pkg).and_then(|schemes| schemes.get(name)).map(|s| s.body.clone())
    } else {
        ctx.namespaces
            .resolve_qualified(&ctx.namespaces.global, &ctx.interner, head)
            .map(|b| b.ty)
    };

    let Some(Type::Function(params, _)) = fn_ty.map(|t| ctx.table.apply(&t)) else {
        return;
    };

    let args = &content[1..];
    if args.len() != params.len() {
        out.push(
            Diagnostic::error("VEX-TYPE-CALL-ARITY", node.position())
                .with_param("pass", "3")
                .with_param("expected", params.len().to_string())
                .with_param("found", args.len().to_string())
                .with_message(format!("'{}' expects {} argument(s), found {}", head, params.len(), args.len())),
        );
        return;
    }

    for (param_ty, arg) in params.iter().zip(args.iter()) {
        let arg_ty = ctx.table.apply(&ctx.type_of(arg));
        if *param_ty != arg_ty && !matches!(arg_ty, Type::Unknown(_)) && !matches!(param_ty, Type::Unknown(_)) {
            out.push(
                Diagnostic::error("VEX-TYPE-CALL-ARG", arg.position())
                    .with_param("pass", "3")
                    .with_param("expected", param_ty.to_string())
                    .with_param("found", arg_ty.to_string())
                    .with_message(format!("argument to '{}' has type {}, expected {}", head, arg_ty, param_ty)),
            );
        }
    }
}
