use vexc_base::Position;

/// Kind of a `Terminal` leaf, per the data model in the specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Symbol,
    Number,
    String,
    Punct,
}

/// Concrete syntax tree node. Immutable after construction. `List` and
/// `Array` include the literal delimiter tokens as their first and
/// last children, so any downstream pass can uniformly treat a node's
/// "content" as `children[1..len-1]`.
#[derive(Debug, Clone)]
pub enum Node {
    List(Vec<Node>),
    Array(Vec<Node>),
    Terminal { text: String, kind: TerminalKind, position: Position },
}

/// A parsed source file: an ordered sequence of top-level nodes.
pub type Program = Vec<Node>;

impl Node {
    /// The node's own position, or (for lists/arrays) its opening
    /// delimiter's position.
    pub fn position(&self) -> Position {
        match self {
            Node::Terminal { position, .. } => position.clone(),
            Node::List(children) | Node::Array(children) => children
                .first()
                .map(Node::position)
                .unwrap_or_else(Position::synthetic),
        }
    }

    /// Children excluding the delimiter tokens, i.e. `children[1..len-1]`.
    pub fn content(&self) -> &[Node] {
        match self {
            Node::List(children) | Node::Array(children) => {
                if children.len() >= 2 {
                    &children[1..children.len() - 1]
                } else {
                    &[]
                }
            }
            Node::Terminal { .. } => &[],
        }
    }

    pub fn as_terminal_text(&self) -> Option<&str> {
        match self {
            Node::Terminal { text, .. } => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Node::List(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Node::Array(_))
    }

    /// The head symbol of a list, e.g. `(macro ...)` -> `Some("macro")`.
    pub fn list_head(&self) -> Option<&str> {
        let content = self.content();
        content.first().and_then(Node::as_terminal_text)
    }
}

/// Serializes a node back to Vex source text, per the reconstruction
/// rule used when splicing a macro argument into a macro body: tokens
/// are joined with single spaces except no space after an opening
/// bracket and no space before a closing bracket; strings are
/// preserved verbatim with their quotes.
pub fn reconstruct_text(node: &Node) -> String {
    let mut out = String::new();
    reconstruct_into(node, &mut out);
    out
}

pub fn reconstruct_program_text(program: &[Node]) -> String {
    program
        .iter()
        .map(reconstruct_text)
        .collect::<Vec<_>>()
        .join(" ")
}

fn reconstruct_into(node: &Node, out: &mut String) {
    match node {
        Node::Terminal { text, .. } => out.push_str(text),
        Node::List(children) | Node::Array(children) => {
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    let prev_is_open = matches!(
                        children[i - 1],
                        Node::Terminal { ref text, .. } if text == "(" || text == "["
                    );
                    let this_is_close = matches!(
                        child,
                        Node::Terminal { ref text, .. } if text == ")" || text == "]"
                    );
                    if !prev_is_open && !this_is_close {
                        out.push(' ');
                    }
                }
                reconstruct_into(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn content_strips_delimiters() {
        let program = parse("(+ 1 2)", "t.vx").unwrap();
        let content = program[0].content();
        assert_eq!(content.len(), 3);
    }

    #[test]
    fn reconstruct_round_trips_simple_list() {
        let program = parse("(+ 1 2)", "t.vx").unwrap();
        assert_eq!(reconstruct_text(&program[0]), "(+ 1 2)");
    }

    #[test]
    fn reconstruct_preserves_strings_verbatim() {
        let program = parse(r#"(print "hello world")"#, "t.vx").unwrap();
        assert_eq!(reconstruct_text(&program[0]), r#"(print "hello world")"#);
    }

    #[test]
    fn reconstruct_handles_nested_arrays() {
        let program = parse("(def xs [1 2 3])", "t.vx").unwrap();
        assert_eq!(reconstruct_text(&program[0]), "(def xs [1 2 3])");
    }
}
