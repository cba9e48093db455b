use std::collections::{HashMap, HashSet};
use std::path::Path;

use vexc_base::{Diagnostic, Position};
use vexc_macro::MacroRegistry;
use vexc_syntax::reconstruct_program_text;
use vexc_types::Scheme;

use crate::discovery::{self, Package};
use crate::graph;
use crate::manifest::Manifest;
use crate::schemes::infer_package_schemes;

/// The resolver's output, handed to the analyzer and code generator
/// for a multi-file build: concatenated source in dependency order,
/// which locally-resolved names should not be emitted as target
/// imports, each package's exported names, and a pre-inferred scheme
/// per exported name for type-checking cross-package callsites.
#[derive(Debug, Clone)]
pub struct CombinedProgram {
    pub combined_source: String,
    pub ignore_imports: HashSet<String>,
    pub exports: HashMap<String, HashSet<String>>,
    pub pkg_schemes: HashMap<String, HashMap<String, Scheme>>,
}

/// Resolves an entry file's full dependency graph into one
/// `CombinedProgram`. `registry` should already carry any stdlib
/// modules (`vex.*`) the caller wants loaded before expansion begins;
/// this crate does not load them itself (see crate docs).
pub fn resolve_program(entry_path: &Path, registry: &mut MacroRegistry) -> Result<CombinedProgram, Diagnostic> {
    let entry_dir = entry_path.parent().unwrap_or_else(|| Path::new("."));
    let root = discovery::find_project_root(entry_dir);

    if let Some(manifest) = Manifest::load(&root)? {
        validate_declared_packages(&root, &manifest)?;
    }

    let entry_program = discovery::load_and_expand_file(entry_path, registry)?;
    let (entry_imports, _) = discovery::scan_imports_and_exports(&entry_program);

    let mut packages: HashMap<String, Package> = HashMap::new();
    let mut edges: HashMap<String, Vec<String>> = HashMap::new();
    let mut root_names = Vec::new();

    for item in &entry_imports {
        if is_local(&root, &item.path) {
            root_names.push(item.path.clone());
            discover_recursive(&item.path, &root, registry, &mut packages, &mut edges)?;
        }
    }

    let order = graph::topo_sort(&root_names, &edges)?;

    let ignore_imports: HashSet<String> = packages.keys().cloned().collect();
    let exports: HashMap<String, HashSet<String>> =
        packages.iter().map(|(name, pkg)| (name.clone(), pkg.exports.clone())).collect();
    let pkg_schemes: HashMap<String, HashMap<String, Scheme>> = packages
        .iter()
        .map(|(name, pkg)| (name.clone(), infer_package_schemes(&pkg.program, &pkg.exports)))
        .collect();

    let mut combined = Vec::new();
    for name in &order {
        combined.extend(packages[name].program.clone());
    }
    combined.extend(entry_program);

    Ok(CombinedProgram {
        combined_source: reconstruct_program_text(&combined),
        ignore_imports,
        exports,
        pkg_schemes,
    })
}

fn is_local(root: &Path, name: &str) -> bool {
    root.join(name).is_dir()
}

fn discover_recursive(
    name: &str,
    root: &Path,
    registry: &mut MacroRegistry,
    packages: &mut HashMap<String, Package>,
    edges: &mut HashMap<String, Vec<String>>,
) -> Result<(), Diagnostic> {
    if packages.contains_key(name) {
        return Ok(());
    }

    let dir = root.join(name);
    if !dir.is_dir() {
        return Err(Diagnostic::error("VEX-PKG-NOT-FOUND", Position::synthetic())
            .with_message(format!("package '{}' not found under {}", name, root.display())));
    }

    let program = discovery::load_package_dir(&dir, registry)?;
    let (imports, exports) = discovery::scan_imports_and_exports(&program);

    let mut local_deps = Vec::new();
    for item in &imports {
        if is_local(root, &item.path) {
            local_deps.push(item.path.clone());
        }
    }
    edges.insert(name.to_string(), local_deps.clone());

    packages.insert(
        name.to_string(),
        Package { name: name.to_string(), dir: dir.clone(), program, imports, exports },
    );

    for dep in &local_deps {
        discover_recursive(dep, root, registry, packages, edges)?;
    }
    Ok(())
}

fn validate_declared_packages(root: &Path, manifest: &Manifest) -> Result<(), Diagnostic> {
    for name in &manifest.packages {
        if !root.join(name).is_dir() {
            return Err(Diagnostic::error("VEX-PKG-NOT-FOUND", Position::synthetic())
                .with_message(format!("package '{}' declared in vex.pkg but not found under {}", name, root.display())));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn resolves_a_single_local_dependency() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("b").join("b.vx"), "(export [id]) (def id (fn [x] x))");
        write(&dir.path().join("main.vx"), r#"(import ["b"]) (b/id 1)"#);

        let mut registry = MacroRegistry::new();
        let combined = resolve_program(&dir.path().join("main.vx"), &mut registry).unwrap();

        assert!(combined.ignore_imports.contains("b"));
        assert!(combined.exports["b"].contains("id"));
        assert!(combined.combined_source.contains("b/id") || combined.combined_source.contains("id"));
    }

    #[test]
    fn detects_a_transitive_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("a").join("a.vx"), r#"(import ["b"]) (export [f]) (def f 1)"#);
        write(&dir.path().join("b").join("b.vx"), r#"(import ["a"]) (export [g]) (def g 1)"#);
        write(&dir.path().join("main.vx"), r#"(import ["a"])"#);

        let mut registry = MacroRegistry::new();
        let err = resolve_program(&dir.path().join("main.vx"), &mut registry).unwrap_err();
        assert_eq!(err.code, "VEX-PKG-CYCLE");
    }

    #[test]
    fn external_import_is_not_treated_as_local() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("main.vx"), r#"(import ["net/http"]) (http/get "x")"#);

        let mut registry = MacroRegistry::new();
        let combined = resolve_program(&dir.path().join("main.vx"), &mut registry).unwrap();
        assert!(combined.ignore_imports.is_empty());
    }

    #[test]
    fn manifest_declared_missing_package_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("vex.pkg"), "name = \"demo\"\npackages = [\"missing\"]\n");
        write(&dir.path().join("main.vx"), "(def x 1)");

        let mut registry = MacroRegistry::new();
        let err = resolve_program(&dir.path().join("main.vx"), &mut registry).unwrap_err();
        assert_eq!(err.code, "VEX-PKG-NOT-FOUND");
    }
}
