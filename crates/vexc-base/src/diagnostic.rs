use std::collections::BTreeMap;
use std::fmt;

use crate::position::Position;
use crate::style::Style;

/// Severity of a diagnostic. `Warning` never blocks the pipeline on its
/// own; `Error` does (see the orchestrator's phase gates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single structured error or warning produced anywhere in the
/// pipeline. Every phase emits these instead of failing fast, so a
/// compile run can surface many problems at once.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub position: Position,
    /// Free-form key/value context (`Expected`, `Got`, `Offender`, ...).
    /// A `BTreeMap` keeps text rendering and JSON output deterministic.
    pub params: BTreeMap<&'static str, String>,
    pub message: Option<String>,
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(code: &'static str, severity: Severity, position: Position) -> Self {
        Diagnostic {
            code,
            severity,
            position,
            params: BTreeMap::new(),
            message: None,
            suggestion: None,
        }
    }

    pub fn error(code: &'static str, position: Position) -> Self {
        Self::new(code, Severity::Error, position)
    }

    pub fn warning(code: &'static str, position: Position) -> Self {
        Self::new(code, Severity::Warning, position)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_param(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.params.insert(key, value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The stable JSON shape machine consumers render: same fields the
    /// text renderer reads from, just structured instead of joined with
    /// colons and indentation.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity_str = match self.severity {
            Severity::Error => Style::bold_red("error"),
            Severity::Warning => Style::yellow("warning"),
        };
        write!(
            f,
            "{}: {}: [{}]: {}",
            self.position,
            severity_str,
            self.code,
            self.message.as_deref().unwrap_or("")
        )?;
        for (key, value) in &self.params {
            write!(f, "\n  {}: {}", key, value)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  {}: {}", Style::cyan("suggestion"), suggestion)?;
        }
        Ok(())
    }
}

/// A sink that accumulates diagnostics across phases without aborting
/// the pipeline, per the error-handling design's "accumulate" policy.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(other);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.diagnostics.iter().map(Diagnostic::to_json).collect())
    }
}
