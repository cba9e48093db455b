use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A location in a source file, 1-indexed in both line and column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Position {
    pub file: Arc<PathBuf>,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: Arc<PathBuf>, line: u32, column: u32) -> Self {
        Position { file, line, column }
    }

    /// A position with no real source behind it, used for synthesized
    /// nodes produced during macro expansion before re-parsing.
    pub fn synthetic() -> Self {
        Position {
            file: Arc::new(PathBuf::from("<synthetic>")),
            line: 0,
            column: 0,
        }
    }

    pub fn file_name(&self) -> &Path {
        self.file.as_path()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}
