//! Minimal ANSI coloring for diagnostic rendering. No terminal-capability
//! detection - callers that want plain text pipe through a renderer that
//! doesn't use this module (e.g. the JSON renderer).

pub struct Style;

impl Style {
    pub fn bold_red(s: &str) -> String {
        format!("\x1b[1;31m{}\x1b[0m", s)
    }

    pub fn red(s: &str) -> String {
        format!("\x1b[31m{}\x1b[0m", s)
    }

    pub fn yellow(s: &str) -> String {
        format!("\x1b[33m{}\x1b[0m", s)
    }

    pub fn cyan(s: &str) -> String {
        format!("\x1b[36m{}\x1b[0m", s)
    }

    pub fn green(s: &str) -> String {
        format!("\x1b[32m{}\x1b[0m", s)
    }

    pub fn blue(s: &str) -> String {
        format!("\x1b[34m{}\x1b[0m", s)
    }
}
