use dashmap::DashMap;
use log::{debug, info, trace, warn};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use docsurface_core::{
    CompilerOptions, ResolutionError, ResolveContext, Specifier, find_tsconfig, imports_for,
    load_compiler_options,
};

use crate::{
    config::TraceConfig,
    filter::SourceFilter,
    types::{ConfigSource, TraceResult},
};

/// Traces reachability over the import graph of one package.
///
/// A tracer owns its resolution context and caches. Separate tracers share
/// nothing, so packages can be traced independently and in parallel.
#[derive(Debug)]
pub struct Tracer {
    context: ResolveContext,
    config_source: ConfigSource,
    filter: SourceFilter,
    import_cache: DashMap<PathBuf, Vec<Specifier>>,
}

impl Tracer {
    /// Loads the module-resolution config for `config.root`.
    ///
    /// A missing tsconfig falls back to defaults. A tsconfig that exists but
    /// cannot be used is an error, because resolving with the wrong aliases
    /// would silently produce a wrong file set. The same goes for an explicit
    /// `--tsconfig` that does not exist.
    pub fn new(config: &TraceConfig) -> Result<Self, ResolutionError> {
        let root = config.root.canonicalize().unwrap_or_else(|_| config.root.clone());
        debug!("Initializing tracer for {}", root.display());

        let tsconfig = match &config.tsconfig {
            Some(explicit) => {
                let path = root.join(explicit);
                if !path.is_file() {
                    warn!("Explicit tsconfig not found: {}", path.display());
                    return Err(ResolutionError::ConfigParse {
                        path,
                        message: "explicitly requested tsconfig does not exist".to_string(),
                    });
                }
                Some(path)
            }
            None => find_tsconfig(&root),
        };
        let (options, config_source) = match tsconfig {
            Some(path) => {
                let options = load_compiler_options(&path)?;
                (options, ConfigSource::File(path))
            }
            None => {
                debug!("Using default module resolution for {}", root.display());
                (CompilerOptions::default(), ConfigSource::Default)
            }
        };

        Ok(Self {
            filter: SourceFilter::from_config(root.clone(), config),
            context: ResolveContext::new(root, options),
            config_source,
            import_cache: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        self.context.root()
    }

    pub fn config_source(&self) -> &ConfigSource {
        &self.config_source
    }

    pub fn filter(&self) -> &SourceFilter {
        &self.filter
    }

    pub fn trace_from_entries(&self, entries: &[PathBuf]) -> TraceResult {
        info!("Tracing {} entries under {}", entries.len(), self.root().display());
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut errors = Vec::new();
        let mut traced_entries = Vec::new();

        for entry in entries {
            let entry = if entry.is_absolute() { entry.clone() } else { self.root().join(entry) };
            if !entry.is_file() {
                warn!("Entry not found: {}", entry.display());
                errors.push(ResolutionError::EntryNotFound {
                    message: "Entry file does not exist".to_string(),
                    path: entry,
                });
                continue;
            }
            let entry = entry.canonicalize().unwrap_or(entry);
            if !traced_entries.contains(&entry) {
                traced_entries.push(entry.clone());
            }
            self.visit(&entry, &mut visited, &mut errors);
        }

        let modules_visited = visited.len();
        let files = self.filter.apply(visited);
        debug!(
            "Traced {} modules, {} source files, {} errors (cache: imports={}, resolutions={})",
            modules_visited,
            files.len(),
            errors.len(),
            self.import_cache.len(),
            self.context.cached_resolutions()
        );

        TraceResult { files, entries: traced_entries, errors, modules_visited }
    }

    /// Depth-first walk. `file` is marked visited before its imports are
    /// followed so cycles stop at the first revisit.
    fn visit(&self, file: &Path, visited: &mut HashSet<PathBuf>, errors: &mut Vec<ResolutionError>) {
        if !visited.insert(file.to_path_buf()) {
            trace!("Already visited: {}", file.display());
            return;
        }
        trace!("Visiting module: {}", file.display());

        let specs = match imports_for(file, &self.import_cache) {
            Ok(specs) => specs,
            Err(e) => {
                warn!("Error parsing imports for {}: {:#}", file.display(), e);
                errors.push(ResolutionError::FileRead {
                    path: file.to_path_buf(),
                    message: format!("{:#}", e),
                });
                return;
            }
        };

        for spec in specs {
            match self.context.resolve(file, &spec.request) {
                Some(next) => self.visit(&next, visited, errors),
                None => trace!("Skipping unresolved or external '{}'", spec.request),
            }
        }
    }
}

/// Builds a tracer for `config` and traces `entries`. A malformed tsconfig
/// aborts this trace and comes back as its only error.
pub fn trace_from_entries(config: &TraceConfig, entries: &[PathBuf]) -> TraceResult {
    match Tracer::new(config) {
        Ok(tracer) => tracer.trace_from_entries(entries),
        Err(e) => {
            warn!("Cannot trace {}: {}", config.root.display(), e);
            TraceResult::failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsurface_core::ResolutionErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path.canonicalize().unwrap()
    }

    fn root_of(temp_dir: &TempDir) -> PathBuf {
        temp_dir.path().canonicalize().unwrap()
    }

    #[test]
    fn test_linear_chain() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        let entry = create_test_file(&root, "entry.ts", "import { h } from './helper';");
        let helper = create_test_file(&root, "helper.ts", "export * from './util';");
        let util = create_test_file(&root, "util.ts", "export const u = 1;");

        let result = trace_from_entries(&TraceConfig::new(&root), &[entry.clone()]);
        assert_eq!(result.files, vec![entry.clone(), helper, util]);
        assert_eq!(result.entries, vec![entry]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_import_equals_require_is_followed() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        let index = create_test_file(&root, "src/index.ts", "import helper = require('./helper');");
        let helper = create_test_file(&root, "src/helper.ts", "export = function helper() {};");

        let result = trace_from_entries(&TraceConfig::new(&root), &[index.clone()]);
        assert_eq!(result.files, vec![helper, index]);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        let a = create_test_file(&root, "a.ts", "import { b } from './b'; export const a = 1;");
        let b = create_test_file(&root, "b.ts", "import { a } from './a'; export const b = 2;");

        let result = trace_from_entries(&TraceConfig::new(&root), &[a.clone()]);
        assert_eq!(result.files, vec![a, b]);
        assert!(result.errors.is_empty());
        assert_eq!(result.modules_visited, 2);
    }

    #[test]
    fn test_missing_entry_is_reported_and_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        let present = create_test_file(&root, "src/index.ts", "");
        let missing = root.join("src/missing.ts");

        let result =
            trace_from_entries(&TraceConfig::new(&root), &[missing.clone(), present.clone()]);
        assert_eq!(result.files, vec![present]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind(), ResolutionErrorKind::EntryNotFound);
        assert_eq!(result.errors[0].path(), missing.as_path());
    }

    #[test]
    fn test_walks_through_excluded_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        let entry = create_test_file(&root, "src/index.ts", "import './legacy.js';");
        create_test_file(&root, "src/legacy.js", "require('./modern');");
        let modern = create_test_file(&root, "src/modern.ts", "");

        let result = trace_from_entries(&TraceConfig::new(&root), &[entry.clone()]);
        assert_eq!(result.files, vec![entry, modern]);
        assert_eq!(result.modules_visited, 3);
    }

    #[test]
    fn test_unreadable_file_stops_subtree() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        let entry = create_test_file(&root, "src/index.ts", "import './broken';");
        // Not valid UTF-8, so reading it as source fails.
        let broken = root.join("src/broken.ts");
        fs::write(&broken, [0xff, 0xfe, 0xfd]).unwrap();
        let broken = broken.canonicalize().unwrap();

        let result = trace_from_entries(&TraceConfig::new(&root), &[entry.clone()]);
        assert_eq!(result.files, vec![entry, broken.clone()]);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind(), ResolutionErrorKind::FileRead);
        assert_eq!(result.errors[0].path(), broken.as_path());
    }

    #[test]
    fn test_missing_tsconfig_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        let tracer = Tracer::new(&TraceConfig::new(&root)).unwrap();
        // The temp dir may sit below a stray tsconfig; only assert when it doesn't.
        if find_tsconfig(&root).is_none() {
            assert_eq!(tracer.config_source(), &ConfigSource::Default);
        }
    }

    #[test]
    fn test_malformed_tsconfig_aborts_trace() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        create_test_file(&root, "tsconfig.json", "{ \"compilerOptions\": ");
        let entry = create_test_file(&root, "src/index.ts", "");

        let result = trace_from_entries(&TraceConfig::new(&root), &[entry]);
        assert!(result.files.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind(), ResolutionErrorKind::ConfigParse);
    }

    #[test]
    fn test_missing_explicit_tsconfig_aborts_trace() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        let entry = create_test_file(&root, "src/index.ts", "");

        let config = TraceConfig {
            tsconfig: Some(PathBuf::from("tsconfig.build.json")),
            ..TraceConfig::new(&root)
        };
        let result = trace_from_entries(&config, &[entry]);
        assert!(result.files.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind(), ResolutionErrorKind::ConfigParse);
        assert_eq!(result.errors[0].path(), root.join("tsconfig.build.json").as_path());
        assert!(result.errors[0].message().contains("does not exist"));
    }

    #[test]
    fn test_alias_edges() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        create_test_file(
            &root,
            "tsconfig.json",
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@/*": ["src/*"] } } }"#,
        );
        let entry = create_test_file(&root, "src/index.ts", "import { x } from '@/lib/x';");
        let x = create_test_file(&root, "src/lib/x.ts", "import React from 'react';");

        let tracer = Tracer::new(&TraceConfig::new(&root)).unwrap();
        assert!(matches!(tracer.config_source(), ConfigSource::File(_)));
        let result = tracer.trace_from_entries(&[entry.clone()]);
        assert_eq!(result.files, vec![entry, x]);
    }

    #[test]
    fn test_relative_entry_is_joined_to_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = root_of(&temp_dir);
        let entry = create_test_file(&root, "src/index.ts", "");

        let result = trace_from_entries(&TraceConfig::new(&root), &[PathBuf::from("src/index.ts")]);
        assert_eq!(result.files, vec![entry]);
    }
}
