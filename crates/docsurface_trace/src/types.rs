use docsurface_core::{EntryPoint, ExtractedEntries, ResolutionError};
use serde::Serialize;
use std::path::PathBuf;

/// Where the module-resolution options of a trace came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ConfigSource {
    File(PathBuf),
    /// No tsconfig was found; no aliases, no baseUrl.
    Default,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceResult {
    /// Filtered, deduplicated, sorted reachable source files.
    pub files: Vec<PathBuf>,
    /// Entry files that existed and were traced, canonicalized.
    pub entries: Vec<PathBuf>,
    pub errors: Vec<ResolutionError>,
    /// Number of modules walked, before filtering.
    pub modules_visited: usize,
}

impl TraceResult {
    pub fn failed(error: ResolutionError) -> Self {
        Self { errors: vec![error], ..Self::default() }
    }
}

/// A package traced from its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageTrace {
    pub manifest_path: PathBuf,
    pub package_root: PathBuf,
    pub name: Option<String>,
    /// Subpaths whose targets are compiled output only.
    pub unresolved: Vec<String>,
    #[serde(skip)]
    pub extracted: ExtractedEntries,
    #[serde(skip)]
    pub entry_points: Vec<EntryPoint>,
    #[serde(flatten)]
    pub result: TraceResult,
}
