use std::collections::HashSet;
use std::path::{Path, PathBuf};

use vexc_base::{Diagnostic, Position};
use vexc_macro::MacroRegistry;
use vexc_syntax::{Node, Program};

/// One entry of an `(import [...])` array: a bare string names a path
/// taken as-is; an aliased pair `["path" alias]` additionally renames
/// it for code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    pub path: String,
    pub alias: Option<String>,
}

/// A discovered local package: every `.vx` file directly under its
/// directory, concatenated in filename order and macro-expanded.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub dir: PathBuf,
    pub program: Program,
    pub imports: Vec<ImportItem>,
    pub exports: HashSet<String>,
}

/// Walks upward from `start_dir` looking for a `vex.pkg` marker;
/// returns `start_dir` itself if none is found, per 4.3's fallback.
pub fn find_project_root(start_dir: &Path) -> PathBuf {
    let mut dir = start_dir;
    loop {
        if dir.join("vex.pkg").is_file() {
            return dir.to_path_buf();
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return start_dir.to_path_buf(),
        }
    }
}

/// Parses the `[...]` content of an `(import [...])` form into its
/// items. Bare strings and aliased `["path" alias]` pairs are both
/// accepted; anything else is skipped (malformed forms surface later,
/// as an unresolved-symbol failure during analysis or codegen).
pub fn parse_import_items(import_array: &Node) -> Vec<ImportItem> {
    import_array
        .content()
        .iter()
        .filter_map(|item| match item {
            Node::Terminal { text, .. } => Some(ImportItem { path: unquote(text), alias: None }),
            Node::Array(_) => {
                let parts = item.content();
                let path = parts.first()?.as_terminal_text().map(unquote)?;
                let alias = parts.get(1).and_then(Node::as_terminal_text).map(str::to_string);
                Some(ImportItem { path, alias })
            }
            Node::List(_) => None,
        })
        .collect()
}

fn unquote(text: &str) -> String {
    text.trim_matches('"').to_string()
}

/// Scans a package's top-level forms for `(import [...])` and
/// `(export [...])`, returning the combined import list and export
/// name set. Both forms may appear any number of times at top level.
pub fn scan_imports_and_exports(program: &Program) -> (Vec<ImportItem>, HashSet<String>) {
    let mut imports = Vec::new();
    let mut exports = HashSet::new();
    for node in program {
        match node.list_head() {
            Some("import") => {
                if let Some(array) = node.content().get(1) {
                    imports.extend(parse_import_items(array));
                }
            }
            Some("export") => {
                if let Some(array) = node.content().get(1) {
                    for name in array.content().iter().filter_map(Node::as_terminal_text) {
                        exports.insert(name.to_string());
                    }
                }
            }
            _ => {}
        }
    }
    (imports, exports)
}

/// Loads and macro-expands every `.vx` file directly under `dir`, in
/// filename order, into one concatenated program. `registry` is shared
/// across the whole resolution so library macro definitions seen in
/// one package are visible while loading the next.
pub fn load_package_dir(dir: &Path, registry: &mut MacroRegistry) -> Result<Program, Diagnostic> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| {
            Diagnostic::error("VEX-IO", Position::synthetic())
                .with_message(format!("failed to read package directory {}: {}", dir.display(), e))
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("vx"))
        .collect();
    files.sort();

    let mut combined = Program::new();
    for file in files {
        let raw = vexc_syntax::parse_file(&file)?;
        combined.extend(vexc_macro::expand_program(&raw, registry)?);
    }
    Ok(combined)
}

/// Loads a single file (the entry point, or any one `.vx` file) and
/// macro-expands it.
pub fn load_and_expand_file(path: &Path, registry: &mut MacroRegistry) -> Result<Program, Diagnostic> {
    let raw = vexc_syntax::parse_file(path)?;
    vexc_macro::expand_program(&raw, registry)
}
