use serde::Serialize;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use docsurface_core::ResolutionError;

/// Why a package does or does not contribute files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    /// The manifest is missing or malformed.
    Invalid,
    /// No usable policy config applies to the package.
    Disabled,
    /// Enabled, but the manifest declares no exports.
    NoExports,
    Traced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageResult {
    /// Package name, or its path relative to the repository root when unnamed.
    pub key: String,
    pub name: Option<String>,
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    /// Policy config that governs this package: its own, or the repository's.
    pub policy_config: Option<PathBuf>,
    pub status: PackageStatus,
    pub files: Vec<PathBuf>,
    #[serde(skip)]
    pub file_set: HashSet<PathBuf>,
    pub unresolved: Vec<String>,
    pub errors: Vec<ResolutionError>,
}

impl PackageResult {
    pub fn is_enabled(&self) -> bool {
        self.policy_config.is_some() && self.status != PackageStatus::Invalid
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.file_set.contains(path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceResolution {
    /// Packages in discovery order.
    pub packages: Vec<PackageResult>,
    pub is_multi_package: bool,
    pub repo_policy_config: Option<PathBuf>,
    /// Errors not attributable to a single package.
    pub errors: Vec<ResolutionError>,
}

impl WorkspaceResolution {
    /// Repository-level errors followed by each package's, in discovery order.
    pub fn all_errors(&self) -> impl Iterator<Item = &ResolutionError> {
        self.errors.iter().chain(self.packages.iter().flat_map(|p| p.errors.iter()))
    }

    pub fn summary(&self) -> Summary {
        Summary {
            packages: self.packages.len(),
            enabled_packages: self.packages.iter().filter(|p| p.is_enabled()).count(),
            files: self.packages.iter().map(|p| p.files.len()).sum(),
            errors: self.all_errors().count(),
            fatal_errors: self.all_errors().filter(|e| e.is_fatal()).count(),
            has_repo_policy: self.repo_policy_config.is_some(),
        }
    }
}

/// Counts and availability flags for reporting. No formatting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub packages: usize,
    pub enabled_packages: usize,
    pub files: usize,
    pub errors: usize,
    /// Errors that stopped a package or trace outright.
    pub fatal_errors: usize,
    pub has_repo_policy: bool,
}

/// Staged files that need linting under one policy config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedGroup {
    pub files: Vec<PathBuf>,
    pub policy_config_path: PathBuf,
}
