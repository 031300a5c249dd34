use anyhow::{Result, anyhow};
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

use docsurface_trace::TraceConfig;

pub const DEFAULT_POLICY_FILE: &str = "tsdoc.json";

#[derive(Debug, Clone, Parser)]
#[command(name = "resolve")]
#[command(about = "Resolve the public API surface of every package in a repository")]
pub struct WorkspaceConfig {
    /// Root directory of the repository (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// File name that enables documentation linting for a package (repeatable)
    #[arg(long = "policy-file", default_values = [DEFAULT_POLICY_FILE])]
    pub policy_files: Vec<String>,

    /// Path substring excluded from every package's file set (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,
}

impl WorkspaceConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            policy_files: vec![DEFAULT_POLICY_FILE.to_string()],
            exclude: Vec::new(),
        }
    }

    /// Resolve the root directory, falling back to the git root.
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for git root");
            docsurface_core::find_git_root()?
        };
        info!("Using root directory: {}", root.display());
        self.root = Some(root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    /// Trace settings for a package rooted at `package_root`.
    pub fn trace_config(&self, package_root: PathBuf) -> TraceConfig {
        TraceConfig { exclude: self.exclude.clone(), ..TraceConfig::new(package_root) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_defaults() {
        let cfg = WorkspaceConfig::parse_from(["resolve"]);
        assert_eq!(cfg.policy_files, vec![DEFAULT_POLICY_FILE]);
        assert!(cfg.root.is_none());
    }

    #[test]
    fn test_root_before_initialize() {
        let cfg = WorkspaceConfig::parse_from(["resolve"]);
        assert!(cfg.root().is_err());
    }

    #[test]
    fn test_trace_config_passes_excludes() {
        let cfg = WorkspaceConfig::parse_from(["resolve", "--exclude", "generated/"]);
        let trace = cfg.trace_config(PathBuf::from("/repo/pkg"));
        assert_eq!(trace.root, PathBuf::from("/repo/pkg"));
        assert_eq!(trace.exclude, vec!["generated/"]);
        assert!(trace.test_patterns.iter().any(|p| p == ".test."));
    }

    #[test]
    fn test_initialize_canonicalizes_root() {
        let temp_dir = TempDir::new().unwrap();
        let mut cfg = WorkspaceConfig::new(temp_dir.path());
        cfg.initialize().unwrap();
        assert_eq!(cfg.root().unwrap(), &temp_dir.path().canonicalize().unwrap());
    }
}
