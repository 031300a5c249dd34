use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use std::path::{Path, PathBuf};

use crate::{
    constants::{
        DECLARATION_SUFFIXES, DEPENDENCY_DIR, INDEX_FILES, JS_TO_TS_EXTENSIONS,
        RESOLVE_EXTENSIONS,
    },
    tsconfig::CompilerOptions,
};

/// Module resolution state for one trace: the compiler options in effect
/// plus a cache of `(importing file, request)` lookups.
#[derive(Debug)]
pub struct ResolveContext {
    root: PathBuf,
    options: CompilerOptions,
    cache: DashMap<(PathBuf, String), Option<PathBuf>>,
}

impl ResolveContext {
    pub fn new(root: PathBuf, options: CompilerOptions) -> Self {
        Self { root, options, cache: DashMap::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cached_resolutions(&self) -> usize {
        self.cache.len()
    }

    /// Resolves `request` as imported from `from_file` to an internal file.
    ///
    /// Returns `None` for bare specifiers without a matching alias, for
    /// anything under `node_modules`, for declaration files without a
    /// source sibling and for requests that do not exist on disk.
    pub fn resolve(&self, from_file: &Path, request: &str) -> Option<PathBuf> {
        let key = (from_file.to_path_buf(), request.to_string());
        if let Some(v) = self.cache.get(&key) {
            trace!("Cache hit for resolve: '{}' from {}", request, from_file.display());
            return v.clone();
        }
        trace!("Resolving: '{}' from {}", request, from_file.display());

        let resolved = if request.starts_with('.') || request.starts_with('/') {
            trace!("Resolving as relative import: '{}'", request);
            let base = from_file.parent().unwrap_or(&self.root);
            let p = clean(base.join(request));
            resolve_candidate(&p)
        } else {
            self.resolve_alias(request)
        };

        if resolved.is_some() {
            debug!("Resolved '{}' from {} to {:?}", request, from_file.display(), resolved);
        } else {
            trace!("Failed to resolve '{}' from {}", request, from_file.display());
        }
        self.cache.insert(key, resolved.clone());
        resolved
    }

    fn resolve_alias(&self, request: &str) -> Option<PathBuf> {
        trace!("Checking tsconfig path aliases for '{}'", request);
        // Only the most specific matching pattern is consulted.
        let Some(alias) = self.options.paths.iter().find(|a| a.capture(request).is_some()) else {
            trace!("Treating '{}' as external", request);
            return None;
        };
        trace!("Matched alias '{}' for request '{}'", alias.pattern, request);
        alias.candidates(request).iter().find_map(|candidate| resolve_candidate(candidate))
    }
}

fn resolve_candidate(p: &Path) -> Option<PathBuf> {
    if is_in_dependency_dir(p) {
        trace!("Skipping dependency path: {}", p.display());
        return None;
    }
    let found = resolve_file(p)?;
    if is_in_dependency_dir(&found) {
        trace!("Resolved into dependency path: {}", found.display());
        return None;
    }
    source_for_declaration(found)
}

fn resolve_file(p: &Path) -> Option<PathBuf> {
    // `./x.js` in TypeScript ESM means `./x.ts`
    if let Some(ext) = p.extension().and_then(|e| e.to_str())
        && let Some((_, ts_exts)) = JS_TO_TS_EXTENSIONS.iter().find(|(js, _)| *js == ext)
    {
        for ts_ext in *ts_exts {
            let candidate = p.with_extension(ts_ext);
            if candidate.is_file() {
                return Some(canonical(candidate));
            }
        }
    }

    // Try exact path first
    if p.is_file() {
        return Some(canonical(p.to_path_buf()));
    }

    // Try adding extensions
    for ext in RESOLVE_EXTENSIONS {
        let candidate = PathBuf::from(format!("{}.{}", p.display(), ext));
        if candidate.is_file() {
            return Some(canonical(candidate));
        }
    }

    // Try index files
    if p.is_dir() {
        for index_file in INDEX_FILES {
            let candidate = p.join(index_file);
            if candidate.is_file() {
                return Some(canonical(candidate));
            }
        }
    }

    None
}

/// Maps a declaration file to its co-located source file. Non-declaration
/// paths pass through unchanged.
pub fn source_for_declaration(path: PathBuf) -> Option<PathBuf> {
    let s = path.to_string_lossy().to_string();
    let Some((suffix, source_exts)) =
        DECLARATION_SUFFIXES.iter().find(|(suffix, _)| s.ends_with(suffix))
    else {
        return Some(path);
    };

    let stem = &s[..s.len() - suffix.len()];
    for ext in *source_exts {
        let candidate = PathBuf::from(format!("{}.{}", stem, ext));
        if candidate.is_file() {
            trace!("Redirected declaration {} to {}", path.display(), candidate.display());
            return Some(canonical(candidate));
        }
    }
    trace!("Dropping declaration-only file: {}", path.display());
    None
}

pub fn is_in_dependency_dir(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == DEPENDENCY_DIR)
}

fn canonical(p: PathBuf) -> PathBuf {
    p.canonicalize().unwrap_or(p)
}
