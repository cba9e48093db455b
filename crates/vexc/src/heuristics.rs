/// Well-known prefixes for Target standard library imports, used only
/// to distinguish them from third-party module paths for downstream
/// packaging (a CLI wrapper deciding whether a dependency needs to be
/// fetched) - out of the core pipeline's own concerns.
const STDLIB_PREFIXES: &[&str] = &["fmt", "os", "io", "strings", "strconv", "errors", "sort", "time", "sync", "net"];

/// Heuristically classifies an import path as external to the Target
/// toolchain's standard library: it contains a dot (a module host,
/// e.g. `github.com/...`) or isn't one of the well-known standard
/// prefixes. Per §7 of the orchestrator design, this is advisory only
/// - it never gates compilation, only informs a CLI wrapper's own
/// dependency-fetching decisions.
pub fn is_external_import(path: &str) -> bool {
    if path.contains('.') {
        return true;
    }
    let root = path.split('/').next().unwrap_or(path);
    !STDLIB_PREFIXES.contains(&root)
}
