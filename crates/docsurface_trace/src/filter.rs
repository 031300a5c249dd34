use log::trace;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use docsurface_core::has_source_extension;

use crate::config::TraceConfig;

/// Decides which traced files belong in the returned set.
///
/// Patterns are matched against the path relative to the package root with
/// a leading `/`, so `/test/` means a `test` directory inside the package
/// and never the directory the repository happens to live in.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    root: PathBuf,
    test_patterns: Vec<String>,
    exclude: Vec<String>,
}

impl SourceFilter {
    pub fn new(root: PathBuf, test_patterns: Vec<String>, exclude: Vec<String>) -> Self {
        Self { root, test_patterns, exclude }
    }

    pub fn from_config(root: PathBuf, config: &TraceConfig) -> Self {
        Self::new(root, config.test_patterns.clone(), config.exclude.clone())
    }

    pub fn is_source_file(&self, path: &Path) -> bool {
        let full = path.to_string_lossy().replace('\\', "/");
        if !has_source_extension(&full) {
            return false;
        }

        let rel = match path.strip_prefix(&self.root) {
            Ok(rel) => format!("/{}", rel.to_string_lossy().replace('\\', "/")),
            Err(_) => full,
        };
        if let Some(p) = self.test_patterns.iter().find(|p| rel.contains(p.as_str())) {
            trace!("Excluding test file {} (matched '{}')", rel, p);
            return false;
        }
        if let Some(p) = self.exclude.iter().find(|p| rel.contains(p.as_str())) {
            trace!("Excluding {} (matched '{}')", rel, p);
            return false;
        }
        true
    }

    /// Filters, deduplicates and sorts by the path's string form.
    pub fn apply<I>(&self, paths: I) -> Vec<PathBuf>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let kept: BTreeMap<String, PathBuf> = paths
            .into_iter()
            .filter(|p| self.is_source_file(p))
            .map(|p| (p.to_string_lossy().to_string(), p))
            .collect();
        kept.into_values().collect()
    }
}
