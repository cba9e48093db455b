use vexc_base::Diagnostic;
use vexc_syntax::{reconstruct_text, Node, Program};

use crate::registry::MacroRegistry;

/// Bounds runaway recursive expansion (e.g. a macro whose body contains
/// a call to itself with no shrinking argument).
const MAX_PASSES: usize = 10;

/// Extracts `(name, params, body)` from a `(macro name [params] body)`
/// node, returning `None` if the form is malformed (callers that need
/// a diagnostic for that should check shape before calling this).
pub fn parse_macro_def(node: &Node) -> Option<(String, Vec<String>, &Node)> {
    let content = node.content();
    // content[0] is the `macro` keyword itself.
    let name_node = content.get(1)?;
    let params_node = content.get(2)?;
    let body_node = content.get(3)?;

    let name = name_node.as_terminal_text()?.to_string();
    if !params_node.is_array() {
        return None;
    }
    let params = params_node
        .content()
        .iter()
        .filter_map(Node::as_terminal_text)
        .map(str::to_string)
        .collect();
    Some((name, params, body_node))
}

/// Identifier characters for the whole-word boundary rule: a parameter
/// matches only when its occurrence in the macro body is not adjacent
/// to one of these on either side.
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '?' | '!')
}

/// Textually substitutes `{param_i -> value_i}` into `body`, honoring
/// whole-word boundaries and never touching occurrences inside
/// double-quoted strings. This is the deliberately non-hygienic
/// substitution described by the macro model: simple and robust across
/// any target, at the cost of the library macros having to be careful
/// about name collisions themselves.
pub fn substitute_params(body: &str, params: &[String], values: &[String]) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    let mut in_string = false;

    'outer: while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }

        if is_ident_char(c) {
            let prev_ok = i == 0 || !is_ident_char(chars[i - 1]);
            if prev_ok {
                for (param, value) in params.iter().zip(values.iter()) {
                    let plen = param.chars().count();
                    if i + plen <= chars.len() {
                        let candidate: String = chars[i..i + plen].iter().collect();
                        if &candidate == param {
                            let next_ok = i + plen >= chars.len() || !is_ident_char(chars[i + plen]);
                            if next_ok {
                                out.push_str(value);
                                i += plen;
                                continue 'outer;
                            }
                        }
                    }
                }
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

/// Expands every macro call in `program` to a fixpoint, recording
/// `(macro ...)` definitions into `registry` as they're encountered and
/// eliding them from the output.
pub fn expand_program(program: &Program, registry: &mut MacroRegistry) -> Result<Program, Diagnostic> {
    let mut out = Vec::new();
    for node in program {
        out.extend(expand_node(node, registry, 0)?);
    }
    Ok(out)
}

fn expand_node(node: &Node, registry: &mut MacroRegistry, depth: usize) -> Result<Vec<Node>, Diagnostic> {
    if node.list_head() == Some("macro") {
        if let Some((name, params, body)) = parse_macro_def(node) {
            registry.register(
                crate::registry::Macro { name, params, body_text: reconstruct_text(body) },
                node.position(),
            )?;
        }
        return Ok(Vec::new());
    }

    if node.is_list() {
        if let Some(head) = node.list_head() {
            if registry.contains(head) {
                return expand_macro_call(node, head, registry, depth);
            }
        }
    }

    match node {
        Node::Terminal { .. } => Ok(vec![node.clone()]),
        Node::List(children) | Node::Array(children) => {
            let mut new_children = Vec::with_capacity(children.len());
            for child in children {
                new_children.extend(expand_node(child, registry, depth)?);
            }
            Ok(vec![if node.is_list() { Node::List(new_children) } else { Node::Array(new_children) }])
        }
    }
}

fn expand_macro_call(
    node: &Node,
    name: &str,
    registry: &mut MacroRegistry,
    depth: usize,
) -> Result<Vec<Node>, Diagnostic> {
    if depth >= MAX_PASSES {
        return Err(Diagnostic::error("VEX-MACRO-RECURSION", node.position())
            .with_message(format!("macro '{}' exceeded the maximum expansion pass count", name)));
    }

    let args = &node.content()[1..];
    // Innermost-first: expand each argument before the call itself.
    let mut expanded_args = Vec::with_capacity(args.len());
    for arg in args {
        let mut expanded = expand_node(arg, registry, depth + 1)?;
        if expanded.len() != 1 {
            // An argument that expanded to zero or multiple nodes has
            // no single textual form to splice; collapse by wrapping.
            expanded = vec![Node::List(expanded)];
        }
        expanded_args.push(expanded.into_iter().next().unwrap());
    }

    let macro_def = registry
        .get(name)
        .cloned()
        .expect("presence checked by caller");

    if expanded_args.len() != macro_def.params.len() {
        return Err(Diagnostic::error("VEX-MACRO-ARITY", node.position()).with_message(format!(
            "macro '{}' expects {} argument(s), found {}",
            name,
            macro_def.params.len(),
            expanded_args.len()
        )));
    }

    let arg_texts: Vec<String> = expanded_args.iter().map(reconstruct_text).collect();
    let substituted = substitute_params(&macro_def.body_text, &macro_def.params, &arg_texts);

    let reparsed = vexc_syntax::parse(&substituted, node.position().file_name().to_path_buf())?;

    let mut result = Vec::new();
    for n in &reparsed {
        result.extend(expand_node(n, registry, depth + 1)?);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexc_syntax::parse;

    fn expand_src(src: &str, registry: &mut MacroRegistry) -> Program {
        let program = parse(src, "t.vx").unwrap();
        expand_program(&program, registry).unwrap()
    }

    #[test]
    fn registers_and_expands_macro_call() {
        let mut registry = MacroRegistry::new();
        let program = expand_src("(macro twice [x] (+ x x)) (twice 7)", &mut registry);
        assert_eq!(program.len(), 1);
        assert_eq!(reconstruct_text(&program[0]), "(+ 7 7)");
    }

    #[test]
    fn expansion_on_program_with_no_macro_calls_is_identity() {
        let mut registry = MacroRegistry::new();
        let src = "(+ 1 2)";
        let before = parse(src, "t.vx").unwrap();
        let after = expand_program(&before, &mut registry).unwrap();
        assert_eq!(reconstruct_text(&before[0]), reconstruct_text(&after[0]));
    }

    #[test]
    fn arity_mismatch_is_an_error() {
        let mut registry = MacroRegistry::new();
        let program = parse("(macro twice [x] (+ x x)) (twice 1 2)", "t.vx").unwrap();
        let err = expand_program(&program, &mut registry).unwrap_err();
        assert_eq!(err.code, "VEX-MACRO-ARITY");
    }

    #[test]
    fn substitution_respects_word_boundaries_and_strings() {
        let mut registry = MacroRegistry::new();
        let program = parse(
            r#"(macro test [x] (+ x x)) (test "Hello x, welcome!")"#,
            "t.vx",
        )
        .unwrap();
        let out = expand_program(&program, &mut registry).unwrap();
        assert_eq!(reconstruct_text(&out[0]), r#"(+ "Hello x, welcome!" "Hello x, welcome!")"#);
    }

    #[test]
    fn arguments_are_expanded_before_the_enclosing_call() {
        let mut registry = MacroRegistry::new();
        let program = parse(
            "(macro twice [x] (+ x x)) (twice (twice 3))",
            "t.vx",
        )
        .unwrap();
        let out = expand_program(&program, &mut registry).unwrap();
        assert_eq!(reconstruct_text(&out[0]), "(+ (+ 3 3) (+ 3 3))");
    }
}
