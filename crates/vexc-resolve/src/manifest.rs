use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use vexc_base::{Diagnostic, Position};

/// The optional `vex.pkg` project manifest. Its presence marks a
/// directory as a project root; its absence just means the entry
/// file's own directory is treated as the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default = "default_entry")]
    pub entry: String,
    #[serde(default)]
    pub packages: Vec<String>,
}

fn default_entry() -> String {
    "main.vx".to_string()
}

impl Manifest {
    /// Looks for `vex.pkg` directly inside `dir`. Returns `Ok(None)` if
    /// it isn't there; a present-but-unreadable-or-malformed manifest
    /// is a `VEX-IO` diagnostic, matching the resolver's other
    /// filesystem failure modes.
    pub fn load(dir: &Path) -> Result<Option<Self>, Diagnostic> {
        let path = dir.join("vex.pkg");
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| {
            Diagnostic::error("VEX-IO", Position::synthetic())
                .with_message(format!("failed to read {}: {}", path.display(), e))
        })?;
        let manifest: Manifest = toml::from_str(&content).map_err(|e| {
            Diagnostic::error("VEX-IO", Position::synthetic())
                .with_message(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(manifest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manifest_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Manifest::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn parses_minimal_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vex.pkg"), "name = \"demo\"\n").unwrap();
        let manifest = Manifest::load(dir.path()).unwrap().unwrap();
        assert_eq!(manifest.name, "demo");
        assert_eq!(manifest.entry, "main.vx");
    }

    #[test]
    fn parses_full_manifest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("vex.pkg"),
            "name = \"demo\"\nentry = \"src/app.vx\"\npackages = [\"a\", \"b\"]\n",
        )
        .unwrap();
        let manifest = Manifest::load(dir.path()).unwrap().unwrap();
        assert_eq!(manifest.entry, "src/app.vx");
        assert_eq!(manifest.packages, vec!["a", "b"]);
    }

    #[test]
    fn malformed_manifest_is_vex_io() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vex.pkg"), "not valid toml =====").unwrap();
        let err = Manifest::load(dir.path()).unwrap_err();
        assert_eq!(err.code, "VEX-IO");
    }
}
