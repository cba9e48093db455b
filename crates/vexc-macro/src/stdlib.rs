use std::path::{Path, PathBuf};

use vexc_base::Diagnostic;
use vexc_syntax::Node;

use crate::registry::{Macro, MacroRegistry};

/// The always-available module; loaded unconditionally before a
/// compilation begins expanding user code.
pub const CORE_MODULE: &str = "vex.core";

/// Candidate directories searched for a stdlib module, in order:
/// an explicit override, `stdlib/<module-path>` relative to the
/// current directory, then a few ancestor-relative fallbacks so the
/// compiler works whether it's invoked from the workspace root or a
/// nested package directory.
fn candidate_dirs(module_path: &str, explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(explicit) = explicit {
        dirs.push(explicit.to_path_buf());
    }
    dirs.push(PathBuf::from("stdlib").join(module_path));
    for ancestors in 1..=4 {
        let mut p = PathBuf::new();
        for _ in 0..ancestors {
            p.push("..");
        }
        dirs.push(p.join("stdlib").join(module_path));
    }
    dirs
}

/// `vex.core` -> `vex/core`.
fn module_path(name: &str) -> String {
    name.replace('.', "/")
}

/// Loads every top-level `(macro name [params] body)` form found in
/// `.vx` files under the module's directory and registers them.
/// Idempotent per module: a second attempt on an already-loaded
/// module is a no-op. Validation is disabled while loading - library
/// macros are trusted.
pub fn load_stdlib_module(
    registry: &mut MacroRegistry,
    name: &str,
    explicit_dir: Option<&Path>,
) -> Result<(), Diagnostic> {
    if registry.is_module_loaded(name) {
        return Ok(());
    }

    let path = module_path(name);
    let dir = candidate_dirs(&path, explicit_dir)
        .into_iter()
        .find(|p| p.is_dir());

    let Some(dir) = dir else {
        // A missing stdlib module is not fatal: modules are loaded only
        // when imported, and an import of a nonexistent module is
        // reported by the resolver, not here.
        return Ok(());
    };

    let mut entries: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(|e| {
            Diagnostic::error("VEX-IO", vexc_base::Position::synthetic())
                .with_message(format!("failed to read stdlib module {}: {}", name, e))
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("vx"))
        .collect();
    entries.sort();

    registry.set_validate(false);
    for file in entries {
        let program = vexc_syntax::parse_file(&file)?;
        register_macro_defs(registry, &program)?;
    }
    registry.set_validate(true);

    registry.mark_module_loaded(name);
    Ok(())
}

pub fn load_core_macros(registry: &mut MacroRegistry, explicit_dir: Option<&Path>) -> Result<(), Diagnostic> {
    load_stdlib_module(registry, CORE_MODULE, explicit_dir)
}

/// Scans top-level forms for `(macro name [params] body)` and
/// registers each one, without expanding anything.
fn register_macro_defs(registry: &mut MacroRegistry, program: &[Node]) -> Result<(), Diagnostic> {
    for node in program {
        if node.list_head() == Some("macro") {
            if let Some((name, params, body)) = crate::expander::parse_macro_def(node) {
                let position = node.position();
                registry.register(
                    Macro { name, params, body_text: vexc_syntax::reconstruct_text(body) },
                    position,
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loading_missing_module_is_not_an_error() {
        let mut registry = MacroRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let result = load_stdlib_module(&mut registry, "vex.nonexistent", Some(dir.path()));
        assert!(result.is_ok());
    }

    #[test]
    fn loading_registers_macros_from_vx_files() {
        let mut registry = MacroRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("core.vx")).unwrap();
        writeln!(f, "(macro twice [x] (+ x x))").unwrap();
        load_stdlib_module(&mut registry, "vex.core", Some(dir.path())).unwrap();
        assert!(registry.contains("twice"));
    }

    #[test]
    fn loading_is_idempotent_per_module() {
        let mut registry = MacroRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("core.vx")).unwrap();
        writeln!(f, "(macro twice [x] (+ x x))").unwrap();
        drop(f);
        load_stdlib_module(&mut registry, "vex.core", Some(dir.path())).unwrap();
        // Second load must not re-register (which would error on
        // redefinition if validation were left on).
        load_stdlib_module(&mut registry, "vex.core", Some(dir.path())).unwrap();
        assert!(registry.contains("twice"));
    }
}
