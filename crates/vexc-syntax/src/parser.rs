use std::fs;
use std::path::Path;

use vexc_base::Diagnostic;

use crate::cst::{Node, Program, TerminalKind};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn parse_program(&mut self) -> Result<Program, Diagnostic> {
        let mut nodes = Vec::new();
        while !self.at_eof() {
            nodes.push(self.parse_node()?);
        }
        Ok(nodes)
    }

    fn parse_node(&mut self) -> Result<Node, Diagnostic> {
        match self.peek().kind {
            TokenKind::LParen => self.parse_bracketed(TokenKind::RParen, "(", ")", true),
            TokenKind::LBracket => self.parse_bracketed(TokenKind::RBracket, "[", "]", false),
            TokenKind::RParen | TokenKind::RBracket => {
                let tok = self.advance();
                Err(Diagnostic::error("VEX-PARSE-UNMATCHED-PAREN", tok.position)
                    .with_message(format!("unexpected closing delimiter '{}'", tok.text)))
            }
            TokenKind::Eof => {
                let tok = self.peek().clone();
                Err(Diagnostic::error("VEX-PARSE-UNEXPECTED-EOF", tok.position)
                    .with_message("unexpected end of file"))
            }
            TokenKind::Symbol => {
                let tok = self.advance();
                Ok(Node::Terminal { text: tok.text, kind: TerminalKind::Symbol, position: tok.position })
            }
            TokenKind::Number => {
                let tok = self.advance();
                Ok(Node::Terminal { text: tok.text, kind: TerminalKind::Number, position: tok.position })
            }
            TokenKind::String => {
                let tok = self.advance();
                Ok(Node::Terminal { text: tok.text, kind: TerminalKind::String, position: tok.position })
            }
        }
    }

    fn parse_bracketed(
        &mut self,
        close_kind: TokenKind,
        open_text: &str,
        close_text: &str,
        is_list: bool,
    ) -> Result<Node, Diagnostic> {
        let open = self.advance();
        let mut children = vec![Node::Terminal {
            text: open_text.to_string(),
            kind: TerminalKind::Punct,
            position: open.position.clone(),
        }];

        loop {
            match self.peek().kind {
                TokenKind::Eof => {
                    return Err(Diagnostic::error("VEX-PARSE-UNMATCHED-PAREN", open.position)
                        .with_message(format!("unmatched '{}': file ended before '{}'", open_text, close_text)));
                }
                k if k == close_kind => {
                    let close = self.advance();
                    children.push(Node::Terminal {
                        text: close_text.to_string(),
                        kind: TerminalKind::Punct,
                        position: close.position,
                    });
                    break;
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    let tok = self.advance();
                    return Err(Diagnostic::error("VEX-PARSE-UNMATCHED-PAREN", tok.position)
                        .with_message(format!(
                            "mismatched delimiter: expected '{}' but found '{}'",
                            close_text, tok.text
                        )));
                }
                _ => children.push(self.parse_node()?),
            }
        }

        Ok(if is_list { Node::List(children) } else { Node::Array(children) })
    }
}

/// Parses `source` (attributed to `file` for diagnostics) into a
/// `Program`. Fails with a `VEX-PARSE-...` diagnostic carrying the
/// first offending token's position.
pub fn parse(source: &str, file: impl Into<std::path::PathBuf>) -> Result<Program, Diagnostic> {
    let file = file.into();
    let (tokens, diagnostics) = Lexer::new(source, file).tokenize();
    if let Some(first) = diagnostics.into_iter().next() {
        return Err(first);
    }
    let mut parser = Parser { tokens, pos: 0 };
    parser.parse_program()
}

/// Reads `path` and parses its contents.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Program, Diagnostic> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| {
        Diagnostic::error("VEX-IO", vexc_base::Position::synthetic())
            .with_message(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse(&source, path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::Node;

    #[test]
    fn parses_nested_list() {
        let program = parse("(+ 1 (- 2 3))", "t.vx").unwrap();
        assert_eq!(program.len(), 1);
        assert!(matches!(program[0], Node::List(_)));
        assert_eq!(program[0].content().len(), 3);
    }

    #[test]
    fn parses_array_literal() {
        let program = parse("[1 2 3]", "t.vx").unwrap();
        assert!(matches!(program[0], Node::Array(_)));
    }

    #[test]
    fn unmatched_open_paren_is_an_error() {
        let err = parse("(+ 1 2", "t.vx").unwrap_err();
        assert_eq!(err.code, "VEX-PARSE-UNMATCHED-PAREN");
    }

    #[test]
    fn unmatched_close_paren_is_an_error() {
        let err = parse("(+ 1 2))", "t.vx").unwrap_err();
        assert_eq!(err.code, "VEX-PARSE-UNMATCHED-PAREN");
    }

    #[test]
    fn mismatched_bracket_kinds_is_an_error() {
        let err = parse("(+ 1 2]", "t.vx").unwrap_err();
        assert_eq!(err.code, "VEX-PARSE-UNMATCHED-PAREN");
    }

    #[test]
    fn delimiters_are_first_and_last_children() {
        let program = parse("(a b)", "t.vx").unwrap();
        let Node::List(children) = &program[0] else { panic!("expected list") };
        assert_eq!(children.first().unwrap().as_terminal_text(), Some("("));
        assert_eq!(children.last().unwrap().as_terminal_text(), Some(")"));
    }

    #[test]
    fn multiple_top_level_forms() {
        let program = parse("(def a 1) (def b 2)", "t.vx").unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn round_trip_modulo_whitespace() {
        // Invariant 1: parse -> reconstruct -> parse yields an equal CST
        // (modulo whitespace/comments); we check structural equality by
        // comparing reconstructed text twice.
        use crate::cst::reconstruct_text;
        let program = parse("(if (> x 1) \"a\" \"b\")", "t.vx").unwrap();
        let text = reconstruct_text(&program[0]);
        let reparsed = parse(&text, "t.vx").unwrap();
        assert_eq!(reconstruct_text(&reparsed[0]), text);
    }
}
