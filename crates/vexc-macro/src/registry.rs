use std::collections::{HashMap, HashSet};

use vexc_base::{Diagnostic, Position};

/// A named textual rewrite rule from a parameterized S-expression to
/// another S-expression. `body_text` is the reconstructed source of
/// the macro body, re-parsed on every expansion - this keeps macro
/// text independent of any particular AST's pointer identity.
#[derive(Debug, Clone)]
pub struct Macro {
    pub name: String,
    pub params: Vec<String>,
    pub body_text: String,
}

/// Reserved words that can never be macro names.
pub const RESERVED_WORDS: &[&str] =
    &["if", "def", "fn", "let", "do", "when", "unless", "macro", "import", "export"];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

#[derive(Debug, Default)]
pub struct MacroRegistry {
    macros: HashMap<String, Macro>,
    loaded_modules: HashSet<String>,
    /// Library macros are registered with validation disabled (trusted
    /// stdlib content); this flag is toggled around `load_*` calls.
    validate: bool,
}

impl MacroRegistry {
    pub fn new() -> Self {
        MacroRegistry { macros: HashMap::new(), loaded_modules: HashSet::new(), validate: true }
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn is_module_loaded(&self, module: &str) -> bool {
        self.loaded_modules.contains(module)
    }

    pub fn mark_module_loaded(&mut self, module: &str) {
        self.loaded_modules.insert(module.to_string());
    }

    pub fn set_validate(&mut self, validate: bool) {
        self.validate = validate;
    }

    /// Registers a macro, applying the validation contract unless
    /// validation has been temporarily disabled for trusted library
    /// loading.
    pub fn register(&mut self, macro_def: Macro, position: Position) -> Result<(), Diagnostic> {
        if self.validate {
            if macro_def.name.is_empty() {
                return Err(Diagnostic::error("VEX-MACRO-INVALID-NAME", position)
                    .with_message("macro name must not be empty"));
            }
            if is_reserved(&macro_def.name) {
                return Err(Diagnostic::error("VEX-MACRO-RESERVED-NAME", position)
                    .with_message(format!("'{}' is a reserved word and cannot be a macro name", macro_def.name)));
            }
            let mut seen = HashSet::new();
            for p in &macro_def.params {
                if p.is_empty() {
                    return Err(Diagnostic::error("VEX-MACRO-INVALID-PARAM", position)
                        .with_message("macro parameter names must not be empty"));
                }
                if !seen.insert(p.clone()) {
                    return Err(Diagnostic::error("VEX-MACRO-DUP-PARAM", position)
                        .with_message(format!("duplicate parameter name '{}'", p)));
                }
            }
            if macro_def.body_text.trim().is_empty() {
                return Err(Diagnostic::error("VEX-MACRO-EMPTY-BODY", position)
                    .with_message(format!("macro '{}' has an empty body", macro_def.name)));
            }
            if self.macros.contains_key(&macro_def.name) {
                return Err(Diagnostic::error("VEX-MACRO-REDEFINED", position)
                    .with_message(format!("macro '{}' is already registered", macro_def.name)));
            }
        }
        self.macros.insert(macro_def.name.clone(), macro_def);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Position {
        Position::synthetic()
    }

    #[test]
    fn rejects_reserved_name() {
        let mut reg = MacroRegistry::new();
        let m = Macro { name: "if".into(), params: vec![], body_text: "1".into() };
        let err = reg.register(m, pos()).unwrap_err();
        assert_eq!(err.code, "VEX-MACRO-RESERVED-NAME");
    }

    #[test]
    fn rejects_duplicate_params() {
        let mut reg = MacroRegistry::new();
        let m = Macro { name: "twice".into(), params: vec!["x".into(), "x".into()], body_text: "(+ x x)".into() };
        let err = reg.register(m, pos()).unwrap_err();
        assert_eq!(err.code, "VEX-MACRO-DUP-PARAM");
    }

    #[test]
    fn rejects_redefinition() {
        let mut reg = MacroRegistry::new();
        let m1 = Macro { name: "twice".into(), params: vec!["x".into()], body_text: "(+ x x)".into() };
        let m2 = m1.clone();
        reg.register(m1, pos()).unwrap();
        let err = reg.register(m2, pos()).unwrap_err();
        assert_eq!(err.code, "VEX-MACRO-REDEFINED");
    }

    #[test]
    fn library_loading_skips_validation() {
        let mut reg = MacroRegistry::new();
        reg.set_validate(false);
        let m = Macro { name: "if".into(), params: vec![], body_text: "1".into() };
        assert!(reg.register(m, pos()).is_ok());
    }

    #[test]
    fn accepts_well_formed_macro() {
        let mut reg = MacroRegistry::new();
        let m = Macro { name: "twice".into(), params: vec!["x".into()], body_text: "(+ x x)".into() };
        reg.register(m, pos()).unwrap();
        assert!(reg.contains("twice"));
    }
}
