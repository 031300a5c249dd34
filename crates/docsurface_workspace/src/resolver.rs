use anyhow::Result;
use log::{debug, info, trace, warn};
use path_clean::PathClean;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use docsurface_core::{Manifest, manifest_path};
use docsurface_trace::trace_manifest;

use crate::{
    config::WorkspaceConfig,
    discovery::detect_layout,
    policy::{find_policy_file, validate_policy_file},
    types::{PackageResult, PackageStatus, StagedGroup, WorkspaceResolution},
};

/// Resolves every package of a repository once and answers file-membership
/// queries against the cached result.
///
/// The resolution is computed on first use and kept until
/// [`clear_cache`](Self::clear_cache) is called. Nothing watches the
/// filesystem.
#[derive(Debug)]
pub struct WorkspaceResolver {
    config: WorkspaceConfig,
    cache: Option<WorkspaceResolution>,
}

impl WorkspaceResolver {
    pub fn new(mut config: WorkspaceConfig) -> Result<Self> {
        config.initialize()?;
        Ok(Self { config, cache: None })
    }

    pub fn root(&self) -> Result<&PathBuf> {
        self.config.root()
    }

    pub fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    pub fn clear_cache(&mut self) {
        debug!("Clearing workspace resolution cache");
        self.cache = None;
    }

    pub fn resolve(&mut self) -> Result<&WorkspaceResolution> {
        let resolution = match self.cache.take() {
            Some(cached) => cached,
            None => self.resolve_uncached()?,
        };
        Ok(self.cache.insert(resolution))
    }

    /// Groups the staged files that belong to an enabled package's public
    /// surface by the policy config that applies to them.
    pub fn filter_staged_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
    ) -> Result<Vec<StagedGroup>> {
        let staged: Vec<PathBuf> =
            paths.iter().map(|p| self.normalize(p.as_ref())).collect::<Result<_>>()?;
        let resolution = self.resolve()?;

        let mut groups = Vec::new();
        for package in &resolution.packages {
            let Some(policy) = package.policy_config.as_ref() else {
                continue;
            };
            let mut files: Vec<PathBuf> =
                staged.iter().filter(|p| package.contains(p)).cloned().collect();
            if files.is_empty() {
                continue;
            }
            files.sort();
            files.dedup();
            trace!("{} staged files need linting in {}", files.len(), package.key);
            groups.push(StagedGroup { files, policy_config_path: policy.clone() });
        }
        debug!("Staged files split into {} policy groups", groups.len());
        Ok(groups)
    }

    pub fn needs_linting(&mut self, path: &Path) -> Result<bool> {
        let path = self.normalize(path)?;
        Ok(self.resolve()?.packages.iter().any(|p| p.contains(&path)))
    }

    /// Policy config of the package whose traced file set contains `path`.
    pub fn policy_config_for(&mut self, path: &Path) -> Result<Option<PathBuf>> {
        let path = self.normalize(path)?;
        Ok(self
            .resolve()?
            .packages
            .iter()
            .find(|p| p.contains(&path))
            .and_then(|p| p.policy_config.clone()))
    }

    /// First package, in discovery order, whose root is a prefix of `path`.
    pub fn package_containing(&mut self, path: &Path) -> Result<Option<&PackageResult>> {
        let path = self.normalize(path)?;
        Ok(self.resolve()?.packages.iter().find(|p| path.starts_with(&p.root)))
    }

    fn normalize(&self, path: &Path) -> Result<PathBuf> {
        let joined =
            if path.is_absolute() { path.to_path_buf() } else { self.config.root()?.join(path) };
        let cleaned = joined.clean();
        Ok(cleaned.canonicalize().unwrap_or(cleaned))
    }

    fn resolve_uncached(&self) -> Result<WorkspaceResolution> {
        let root = self.config.root()?;
        info!("Resolving workspace at {}", root.display());

        let layout = detect_layout(root)?;
        let mut errors = Vec::new();

        let repo_policy = match find_policy_file(root, &self.config.policy_files) {
            Some(path) => match validate_policy_file(&path) {
                Ok(()) => Some(path),
                Err(e) => {
                    warn!("{}", e);
                    // In single-package mode the root package reports it.
                    if layout.is_multi_package {
                        errors.push(e);
                    }
                    None
                }
            },
            None => None,
        };
        debug!("Repository policy config: {:?}", repo_policy);

        let packages: Vec<PackageResult> = layout
            .package_roots
            .par_iter()
            .map(|package_root| self.resolve_package(root, package_root, repo_policy.as_deref()))
            .collect();

        let traced = packages.iter().filter(|p| p.status == PackageStatus::Traced).count();
        info!("Resolved {} packages ({} traced)", packages.len(), traced);

        Ok(WorkspaceResolution {
            packages,
            is_multi_package: layout.is_multi_package,
            repo_policy_config: repo_policy,
            errors,
        })
    }

    fn resolve_package(
        &self,
        repo_root: &Path,
        package_root: &Path,
        repo_policy: Option<&Path>,
    ) -> PackageResult {
        let manifest_file = manifest_path(package_root);
        let mut result = PackageResult {
            key: package_key(repo_root, package_root, None),
            name: None,
            root: package_root.to_path_buf(),
            manifest_path: manifest_file.clone(),
            policy_config: None,
            status: PackageStatus::Invalid,
            files: Vec::new(),
            file_set: Default::default(),
            unresolved: Vec::new(),
            errors: Vec::new(),
        };

        let manifest = match Manifest::load(&manifest_file) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Skipping package at {}: {}", package_root.display(), e);
                result.errors.push(e);
                return result;
            }
        };
        result.key = package_key(repo_root, package_root, manifest.name.as_deref());
        result.name = manifest.name.clone();

        // A package's own policy config wins over the repository's.
        result.policy_config = match find_policy_file(package_root, &self.config.policy_files) {
            Some(own) => match validate_policy_file(&own) {
                Ok(()) => Some(own),
                Err(e) => {
                    warn!("Disabling {}: {}", result.key, e);
                    result.errors.push(e);
                    result.status = PackageStatus::Disabled;
                    return result;
                }
            },
            None => repo_policy.map(Path::to_path_buf),
        };
        if result.policy_config.is_none() {
            debug!("{} has no policy config, skipping", result.key);
            result.status = PackageStatus::Disabled;
            return result;
        }

        if !manifest.has_exports() {
            debug!("{} declares no exports, skipping", result.key);
            result.status = PackageStatus::NoExports;
            return result;
        }

        let trace_config = self.config.trace_config(package_root.to_path_buf());
        let traced = trace_manifest(package_root, &manifest, &trace_config);
        info!("{}: {} files in public surface", result.key, traced.result.files.len());

        result.status = PackageStatus::Traced;
        result.file_set = traced.result.files.iter().cloned().collect();
        result.files = traced.result.files;
        result.unresolved = traced.unresolved;
        result.errors.extend(traced.result.errors);
        result
    }
}

fn package_key(repo_root: &Path, package_root: &Path, name: Option<&str>) -> String {
    if let Some(name) = name {
        return name.to_string();
    }
    match package_root.strip_prefix(repo_root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().replace('\\', "/"),
        Ok(_) => ".".to_string(),
        Err(_) => package_root.to_string_lossy().to_string(),
    }
}
