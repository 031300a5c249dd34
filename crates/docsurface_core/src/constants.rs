//! Constants for file extensions and resolution strategies.
//!
//! Two extension sets matter here and they are deliberately different:
//!
//! - **Source extensions** (`.ts`, `.tsx`, `.mts`, `.cts`) decide what counts
//!   as a traceable entry point and what may appear in a traced file set.
//! - **Resolve extensions** are everything the resolver is willing to land
//!   on while walking the graph, including declaration files and plain
//!   JavaScript, so edges through those files are still followed.

/// TypeScript source suffixes. Declaration files (`.d.ts`) end in one of
/// these too and must be rejected separately with [`is_declaration_file`].
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Extensions to try when resolving module imports (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] =
    &["ts", "tsx", "d.ts", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Index file names to try when resolving directory imports
pub const INDEX_FILES: &[&str] = &[
    "index.ts",
    "index.tsx",
    "index.d.ts",
    "index.mts",
    "index.cts",
    "index.js",
    "index.jsx",
    "index.mjs",
    "index.cjs",
];

/// Declaration suffixes paired with the source suffixes they shadow.
pub const DECLARATION_SUFFIXES: &[(&str, &[&str])] =
    &[(".d.ts", &["ts", "tsx"]), (".d.mts", &["mts"]), (".d.cts", &["cts"])];

/// Compiled-output suffixes that TypeScript ESM imports name in place of the
/// source file (`import "./x.js"` refers to `x.ts`).
pub const JS_TO_TS_EXTENSIONS: &[(&str, &[&str])] = &[
    ("js", &["ts", "tsx"]),
    ("jsx", &["tsx"]),
    ("mjs", &["mts"]),
    ("cjs", &["cts"]),
];

/// Directory name marking the dependency boundary.
pub const DEPENDENCY_DIR: &str = "node_modules";

/// Path substrings that identify test files and test-only directories.
pub const DEFAULT_TEST_PATTERNS: &[&str] =
    &[".test.", ".spec.", "__tests__/", "__mocks__/", "/test/", "/tests/"];

/// Returns true for `.d.ts`, `.d.mts` and `.d.cts` files.
pub fn is_declaration_file(path: &str) -> bool {
    DECLARATION_SUFFIXES.iter().any(|(suffix, _)| path.ends_with(suffix))
}

/// Returns true if `path` names a TypeScript source file (not a declaration).
pub fn has_source_extension(path: &str) -> bool {
    if is_declaration_file(path) {
        return false;
    }
    match path.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && SOURCE_EXTENSIONS.contains(&ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_extensions_are_typescript_only() {
        assert_eq!(SOURCE_EXTENSIONS.len(), 4);
        assert!(!SOURCE_EXTENSIONS.contains(&"js"));
        assert!(!SOURCE_EXTENSIONS.contains(&"d.ts"));
    }

    #[test]
    fn test_index_files_cover_resolve_extensions() {
        assert_eq!(INDEX_FILES.len(), RESOLVE_EXTENSIONS.len());
        for ext in RESOLVE_EXTENSIONS {
            let expected = format!("index.{}", ext);
            assert!(INDEX_FILES.contains(&expected.as_str()), "INDEX_FILES missing '{}'", expected);
        }
    }

    #[test]
    fn test_has_source_extension() {
        assert!(has_source_extension("./src/index.ts"));
        assert!(has_source_extension("src/App.tsx"));
        assert!(has_source_extension("lib/mod.mts"));
        assert!(has_source_extension("lib/mod.cts"));
        assert!(!has_source_extension("./dist/index.js"));
        assert!(!has_source_extension("./dist/index.d.ts"));
        assert!(!has_source_extension("./dist/index.d.mts"));
        assert!(!has_source_extension("README"));
        assert!(!has_source_extension(".ts"));
    }

    #[test]
    fn test_is_declaration_file() {
        assert!(is_declaration_file("types.d.ts"));
        assert!(is_declaration_file("types.d.cts"));
        assert!(!is_declaration_file("types.ts"));
        assert!(!is_declaration_file("d.ts.js"));
    }
}
