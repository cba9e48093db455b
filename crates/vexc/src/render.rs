use vexc_base::Diagnostic;

/// Renders a diagnostic list as the text form described in §6: each
/// diagnostic's own `Display` impl already produces
/// `path:line:col: severity: [CODE]: message` plus indented
/// `Expected`/`Got`/`Offender`/`Suggestion` lines; this just joins
/// them with a blank line between diagnostics.
pub fn render_text(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n\n")
}

/// Renders the same diagnostic list as the JSON form for machine
/// consumers, sharing the one structured `Diagnostic` type the text
/// renderer reads from.
pub fn render_json(diagnostics: &[Diagnostic]) -> serde_json::Value {
    serde_json::Value::Array(diagnostics.iter().map(Diagnostic::to_json).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vexc_base::Position;

    #[test]
    fn text_rendering_joins_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::error("VEX-PARSE-EOF", Position::synthetic()).with_message("a"),
            Diagnostic::error("VEX-TYPE-NONNUMERIC", Position::synthetic()).with_message("b"),
        ];
        let text = render_text(&diags);
        assert!(text.contains("VEX-PARSE-EOF"));
        assert!(text.contains("VEX-TYPE-NONNUMERIC"));
    }

    #[test]
    fn json_rendering_produces_an_array_of_equal_length() {
        let diags = vec![Diagnostic::warning("VEX-CODEGEN-UNSUPPORTED", Position::synthetic())];
        let json = render_json(&diags);
        assert_eq!(json.as_array().unwrap().len(), 1);
    }
}
