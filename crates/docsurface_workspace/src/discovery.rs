//! Workspace package discovery.
//!
//! Understands `pnpm-workspace.yaml` and the `workspaces` field of the root
//! package.json (npm/yarn/bun, array or `{ "packages": [...] }` form). The
//! pnpm file wins when both exist.

use anyhow::{Context, Result};
use ignore::{WalkBuilder, overrides::OverrideBuilder};
use log::{debug, trace, warn};
use serde::Deserialize;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

use docsurface_core::{DEPENDENCY_DIR, MANIFEST_FILE};

pub const PNPM_WORKSPACE_FILE: &str = "pnpm-workspace.yaml";

#[derive(Debug, Default, Deserialize)]
struct PnpmWorkspace {
    #[serde(default)]
    packages: Vec<String>,
}

/// Package roots found in a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub is_multi_package: bool,
    /// Package directories in discovery order.
    pub package_roots: Vec<PathBuf>,
}

/// Detects the repository layout. Fewer than two workspace packages means
/// the repository root itself is the only package.
pub fn detect_layout(root: &Path) -> Result<Layout> {
    let patterns = workspace_patterns(root);
    let package_roots =
        if patterns.is_empty() { Vec::new() } else { discover_packages(root, &patterns)? };

    if package_roots.len() <= 1 {
        debug!("Single-package layout at {}", root.display());
        return Ok(Layout { is_multi_package: false, package_roots: vec![root.to_path_buf()] });
    }

    debug!("Multi-package layout with {} packages", package_roots.len());
    Ok(Layout { is_multi_package: true, package_roots })
}

/// Workspace glob patterns declared at `root`, normalized for matching.
pub fn workspace_patterns(root: &Path) -> Vec<String> {
    let raw = pnpm_patterns(root).or_else(|| manifest_patterns(root)).unwrap_or_default();
    raw.iter()
        .map(|p| normalize_pattern(p))
        .filter(|p| !p.is_empty() && p != "!")
        .collect()
}

fn pnpm_patterns(root: &Path) -> Option<Vec<String>> {
    let path = root.join(PNPM_WORKSPACE_FILE);
    let content = fs::read_to_string(&path).ok()?;
    match serde_yaml::from_str::<Option<PnpmWorkspace>>(&content) {
        Ok(ws) => {
            let ws = ws.unwrap_or_default();
            trace!("pnpm workspace patterns: {:?}", ws.packages);
            Some(ws.packages)
        }
        Err(e) => {
            warn!("Ignoring unparsable {}: {}", path.display(), e);
            None
        }
    }
}

fn manifest_patterns(root: &Path) -> Option<Vec<String>> {
    let content = fs::read_to_string(root.join(MANIFEST_FILE)).ok()?;
    let package: Value = serde_json::from_str(&content).ok()?;

    let patterns: Vec<String> = match package.get("workspaces")? {
        Value::Array(arr) => arr.iter().filter_map(|v| v.as_str().map(String::from)).collect(),
        // { "packages": ["packages/*"] } format (yarn-style)
        Value::Object(obj) => obj
            .get("packages")
            .and_then(|p| p.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default(),
        _ => return None,
    };
    trace!("package.json workspace patterns: {:?}", patterns);
    Some(patterns)
}

fn normalize_pattern(pattern: &str) -> String {
    let (negated, body) = match pattern.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    let body = body.trim().trim_start_matches("./").trim_end_matches('/');
    if negated { format!("!{}", body) } else { body.to_string() }
}

/// Walks the repository and returns every directory that matches the
/// workspace patterns and contains a manifest, sorted by relative path.
fn discover_packages(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut builder = OverrideBuilder::new(root);
    for pattern in patterns {
        builder.add(pattern).with_context(|| format!("Invalid workspace pattern '{}'", pattern))?;
    }
    let overrides = builder.build().context("Failed to compile workspace patterns")?;

    let max_depth = if patterns.iter().any(|p| p.contains("**")) {
        None
    } else {
        patterns.iter().map(|p| p.trim_start_matches('!').split('/').count()).max()
    };
    debug!("Walking {} for workspace packages (max depth {:?})", root.display(), max_depth);

    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .max_depth(max_depth)
        .filter_entry(|e| e.file_name() != DEPENDENCY_DIR)
        .build();

    let mut found = Vec::new();
    for res in walker {
        let dent = match res {
            Ok(dent) => dent,
            Err(e) => {
                warn!("Skipping unreadable path during discovery: {}", e);
                continue;
            }
        };
        if dent.depth() == 0 || !dent.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }
        let dir = dent.path();
        if overrides.matched(dir, true).is_whitelist() && dir.join(MANIFEST_FILE).is_file() {
            trace!("Found workspace package: {}", dir.display());
            found.push(dir.to_path_buf());
        }
    }

    found.sort_by_cached_key(|p| p.strip_prefix(root).unwrap_or(p).to_string_lossy().to_string());
    debug!("Discovered {} workspace packages", found.len());
    Ok(found)
}
