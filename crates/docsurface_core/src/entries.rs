//! Entry point extraction from a package manifest.
//!
//! Turns `exports` (or the legacy `module`/`main` fields) into one source
//! file per export subpath. Subpaths that only point at compiled output are
//! reported as unresolved so callers can tell "no source file" apart from
//! "no export".

use log::{debug, trace};
use path_clean::PathClean;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::{
    constants::has_source_extension,
    manifest::{ExportMap, Manifest},
};

/// Conditions that may name the source of truth, highest priority first.
/// Any other condition is only consulted after all of these.
pub const CONDITION_PRIORITY: &[&str] = &["source", "types", "typescript", "development", "default"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedEntries {
    /// Export subpath -> target path as written in the manifest.
    pub entries: BTreeMap<String, String>,
    /// Subpaths whose targets exist but are not source files.
    pub unresolved: Vec<String>,
}

/// A resolved entry point: export subpath plus absolute source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub subpath: String,
    pub path: PathBuf,
}

impl ExtractedEntries {
    fn record(&mut self, subpath: &str, target: &str) {
        if self.entries.contains_key(subpath) {
            trace!("Subpath '{}' already has an entry, keeping the first", subpath);
            return;
        }
        self.unresolved.retain(|s| s != subpath);
        self.entries.insert(subpath.to_string(), target.to_string());
    }

    fn mark_unresolved(&mut self, subpath: &str) {
        if !self.entries.contains_key(subpath) && !self.unresolved.iter().any(|s| s == subpath) {
            self.unresolved.push(subpath.to_string());
        }
    }

    /// Entry targets joined onto the package root, ordered by subpath.
    pub fn absolute(&self, package_root: &Path) -> Vec<EntryPoint> {
        self.entries
            .iter()
            .map(|(subpath, target)| EntryPoint {
                subpath: subpath.clone(),
                path: package_root.join(target).clean(),
            })
            .collect()
    }
}

/// Outcome of searching one export-map node for a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Search<'a> {
    Source(&'a str),
    /// Only compiled or declaration targets were found.
    NonSource,
    Nothing,
}

pub fn extract_entries(manifest: &Manifest) -> ExtractedEntries {
    let mut out = ExtractedEntries::default();

    match &manifest.exports {
        None => {
            let Some(target) = manifest.module.as_deref().or(manifest.main.as_deref()) else {
                debug!("Manifest declares no exports, module or main");
                return out;
            };
            trace!("Falling back to legacy entry field: '{}'", target);
            if has_source_extension(target) {
                out.record(".", target);
            } else {
                out.mark_unresolved(".");
            }
        }
        Some(map) => walk(map, ".", &mut out),
    }

    debug!("Extracted {} entries, {} unresolved", out.entries.len(), out.unresolved.len());
    out
}

fn walk(map: &ExportMap, subpath: &str, out: &mut ExtractedEntries) {
    if let ExportMap::Subpaths(items) = map {
        for (key, value) in items {
            walk(value, key, out);
        }
        return;
    }

    let found = search(map);
    if subpath.contains('*') {
        // Pattern exports do not name a single file.
        if found != Search::Nothing {
            trace!("Pattern subpath '{}' is not traceable", subpath);
            out.mark_unresolved(subpath);
        }
        return;
    }

    match found {
        Search::Source(target) => {
            trace!("Subpath '{}' -> '{}'", subpath, target);
            out.record(subpath, target);
        }
        Search::NonSource => {
            trace!("Subpath '{}' has no source target", subpath);
            out.mark_unresolved(subpath);
        }
        Search::Nothing => {}
    }
}

fn search(map: &ExportMap) -> Search<'_> {
    match map {
        ExportMap::Target(target) if has_source_extension(target) => Search::Source(target.as_str()),
        ExportMap::Target(target) if target.is_empty() => Search::Nothing,
        ExportMap::Target(_) => Search::NonSource,
        ExportMap::Blocked => Search::Nothing,
        ExportMap::Fallbacks(items) => first_source(items.iter()),
        ExportMap::Conditions(conditions) => {
            let prioritized = CONDITION_PRIORITY.iter().filter_map(|name| {
                conditions.iter().find(|(k, _)| k.as_str() == *name).map(|(_, v)| v)
            });
            let rest = conditions
                .iter()
                .filter(|(k, _)| !CONDITION_PRIORITY.contains(&k.as_str()))
                .map(|(_, v)| v);
            first_source(prioritized.chain(rest))
        }
        ExportMap::Subpaths(_) => Search::Nothing,
    }
}

fn first_source<'a>(candidates: impl Iterator<Item = &'a ExportMap>) -> Search<'a> {
    let mut result = Search::Nothing;
    for candidate in candidates {
        match search(candidate) {
            found @ Search::Source(_) => return found,
            Search::NonSource => result = Search::NonSource,
            Search::Nothing => {}
        }
    }
    result
}
