use std::path::PathBuf;
use std::sync::Arc;

use vexc_base::{Diagnostic, Position};

use crate::token::{Token, TokenKind};

/// Converts source text to a flat token stream. Whitespace and `;` line
/// comments are consumed here and never reach the parser.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    file: Arc<PathBuf>,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: impl Into<PathBuf>) -> Self {
        Lexer {
            source,
            bytes: source.as_bytes(),
            file: Arc::new(file.into()),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn position(&self) -> Position {
        Position::new(self.file.clone(), self.line, self.column)
    }

    fn is_delimiter(c: u8) -> bool {
        matches!(c, b'(' | b')' | b'[' | b']' | b'"' | b';')
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    self.advance();
                }
                Some(b';') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Tokenize the entire source, returning accumulated diagnostics for
    /// malformed strings. A trailing `Eof` token is always appended.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        let mut diagnostics = Vec::new();

        loop {
            self.skip_whitespace_and_comments();
            let start_pos = self.position();
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    text: String::new(),
                    position: start_pos,
                });
                break;
            };

            match c {
                b'(' => {
                    self.advance();
                    tokens.push(Token { kind: TokenKind::LParen, text: "(".into(), position: start_pos });
                }
                b')' => {
                    self.advance();
                    tokens.push(Token { kind: TokenKind::RParen, text: ")".into(), position: start_pos });
                }
                b'[' => {
                    self.advance();
                    tokens.push(Token { kind: TokenKind::LBracket, text: "[".into(), position: start_pos });
                }
                b']' => {
                    self.advance();
                    tokens.push(Token { kind: TokenKind::RBracket, text: "]".into(), position: start_pos });
                }
                b'"' => match self.scan_string(start_pos.clone()) {
                    Ok(tok) => tokens.push(tok),
                    Err(diag) => {
                        diagnostics.push(diag);
                        // Best-effort recovery: skip to end of line.
                        while let Some(c) = self.peek() {
                            if c == b'\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                },
                _ => tokens.push(self.scan_atom(start_pos)),
            }
        }

        (tokens, diagnostics)
    }

    fn scan_string(&mut self, start_pos: Position) -> Result<Token, Diagnostic> {
        let mut text = String::from("\"");
        self.advance(); // opening quote
        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(Diagnostic::error("VEX-PARSE-BAD-STRING", start_pos)
                        .with_message("unterminated string literal"));
                }
                Some(b'"') => {
                    self.advance();
                    text.push('"');
                    break;
                }
                Some(b'\\') => {
                    self.advance();
                    text.push('\\');
                    match self.advance() {
                        Some(escaped) => text.push(escaped as char),
                        None => {
                            return Err(Diagnostic::error("VEX-PARSE-BAD-STRING", start_pos)
                                .with_message("unterminated escape sequence in string literal"));
                        }
                    }
                }
                Some(c) => {
                    self.advance();
                    text.push(c as char);
                }
            }
        }
        Ok(Token { kind: TokenKind::String, text, position: start_pos })
    }

    fn scan_atom(&mut self, start_pos: Position) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || Self::is_delimiter(c) {
                break;
            }
            self.advance();
        }
        let text = self.source[start..self.pos].to_string();
        let kind = if is_number_text(&text) { TokenKind::Number } else { TokenKind::Symbol };
        Token { kind, text, position: start_pos }
    }

    #[allow(dead_code)]
    fn lookahead_is(&self, offset: usize, c: u8) -> bool {
        self.peek_at(offset) == Some(c)
    }
}

/// A terminal is a number iff every character is a digit, a dot, or a
/// leading `-`, with at most one dot (per the lexer's numeric
/// recognition rule).
pub fn is_number_text(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let mut chars = text.chars().peekable();
    let mut saw_digit = false;
    let mut saw_dot = false;
    if chars.peek() == Some(&'-') {
        chars.next();
    }
    if chars.peek().is_none() {
        return false;
    }
    for c in chars {
        if c.is_ascii_digit() {
            saw_digit = true;
        } else if c == '.' {
            if saw_dot {
                return false;
            }
            saw_dot = true;
        } else {
            return false;
        }
    }
    saw_digit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, diags) = Lexer::new(src, "test.vx").tokenize();
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_simple_list() {
        assert_eq!(
            kinds("(+ 1 2)"),
            vec![
                TokenKind::LParen,
                TokenKind::Symbol,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn recognizes_negative_and_decimal_numbers() {
        assert!(is_number_text("-5"));
        assert!(is_number_text("3.14"));
        assert!(is_number_text("-3.14"));
        assert!(!is_number_text("3.1.4"));
        assert!(!is_number_text("-"));
        assert!(!is_number_text("x?"));
    }

    #[test]
    fn line_comments_are_skipped() {
        let (tokens, _) = Lexer::new("; a comment\n(def x 1)", "test.vx").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::LParen);
    }

    #[test]
    fn unterminated_string_is_a_diagnostic() {
        let (_, diags) = Lexer::new("(\"abc)", "test.vx").tokenize();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "VEX-PARSE-BAD-STRING");
    }

    #[test]
    fn array_brackets_tokenize() {
        assert_eq!(
            kinds("[1 2 3]"),
            vec![
                TokenKind::LBracket,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }
}
