use std::collections::BTreeSet;

use vexc_analyze::AnalysisContext;
use vexc_types::Type;

/// A single deduplicated target import: `path`, plus an optional alias
/// from `["path" alias]` import syntax.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImportEntry {
    pub path: String,
    pub alias: Option<String>,
}

/// Threads the already-built `AnalysisContext` (for `ctx.type_of`/
/// `ctx.table.apply`) plus the set of target imports collected while
/// lowering `(import ...)` forms. One `CodegenContext` per `generate_program`
/// call, discarded once the source string is assembled.
pub struct CodegenContext<'a> {
    pub analysis: &'a AnalysisContext,
    pub imports: BTreeSet<ImportEntry>,
}

impl<'a> CodegenContext<'a> {
    pub fn new(analysis: &'a AnalysisContext) -> Self {
        CodegenContext { analysis, imports: BTreeSet::new() }
    }

    pub fn type_of(&self, node: &vexc_syntax::Node) -> Type {
        self.analysis.table.apply(&self.analysis.type_of(node))
    }

    pub fn add_import(&mut self, path: impl Into<String>, alias: Option<String>) {
        self.imports.insert(ImportEntry { path: path.into(), alias });
    }
}
