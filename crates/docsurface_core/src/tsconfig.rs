use anyhow::{Result, anyhow};
use log::{debug, trace};
use path_clean::PathClean;
use serde_json::Value;
use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
};

use crate::error::ResolutionError;

pub const TSCONFIG_FILE: &str = "tsconfig.json";

const MAX_EXTENDS_DEPTH: usize = 16;

pub fn find_git_root() -> Result<PathBuf> {
    debug!("Searching for git root");
    let mut current_dir = env::current_dir()?;
    trace!("Starting search from: {:?}", current_dir);

    loop {
        let git_dir = current_dir.join(".git");
        trace!("Checking for .git at: {:?}", git_dir);
        if git_dir.exists() {
            debug!("Found git root at: {:?}", current_dir);
            return Ok(current_dir);
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => {
                debug!("Could not find .git directory in any parent folder");
                return Err(anyhow!("Could not find .git directory in any parent folder"));
            }
        }
    }
}

/// Finds the nearest `tsconfig.json` in `start` or any of its ancestors.
pub fn find_tsconfig(start: &Path) -> Option<PathBuf> {
    let found = start.ancestors().map(|dir| dir.join(TSCONFIG_FILE)).find(|p| p.is_file());
    match &found {
        Some(p) => debug!("Found tsconfig at: {}", p.display()),
        None => debug!("No tsconfig found above {}", start.display()),
    }
    found
}

/// One `compilerOptions.paths` entry with its targets made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAlias {
    /// The alias pattern, e.g. `@app/*` or `config`. At most one `*`.
    pub pattern: String,
    /// Absolute target patterns, tried in order. `*` is substituted.
    pub targets: Vec<String>,
}

impl PathAlias {
    /// Returns the text captured by `*`, or `""` for an exact pattern.
    pub fn capture<'r>(&self, request: &'r str) -> Option<&'r str> {
        match self.pattern.split_once('*') {
            None => (self.pattern == request).then_some(""),
            Some((prefix, suffix)) => {
                if request.len() >= prefix.len() + suffix.len()
                    && request.starts_with(prefix)
                    && request.ends_with(suffix)
                {
                    Some(&request[prefix.len()..request.len() - suffix.len()])
                } else {
                    None
                }
            }
        }
    }

    /// Target paths for `request`, or nothing if the pattern does not match.
    pub fn candidates(&self, request: &str) -> Vec<PathBuf> {
        match self.capture(request) {
            Some(star) => {
                self.targets.iter().map(|t| PathBuf::from(t.replacen('*', star, 1))).collect()
            }
            None => Vec::new(),
        }
    }

    fn is_exact(&self) -> bool {
        !self.pattern.contains('*')
    }

    fn prefix_len(&self) -> usize {
        self.pattern.split_once('*').map_or(self.pattern.len(), |(p, _)| p.len())
    }
}

/// The parts of a tsconfig that influence module resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    pub base_url: Option<PathBuf>,
    /// Sorted so the first matching alias is the most specific one.
    pub paths: Vec<PathAlias>,
}

impl CompilerOptions {
    pub fn new(base_url: Option<PathBuf>, mut paths: Vec<PathAlias>) -> Self {
        // Exact patterns first, then longest prefix. Stable sort keeps manifest order on ties.
        paths.sort_by(|a, b| {
            b.is_exact().cmp(&a.is_exact()).then_with(|| b.prefix_len().cmp(&a.prefix_len()))
        });
        Self { base_url, paths }
    }
}

#[derive(Default)]
struct RawOptions {
    base_url: Option<PathBuf>,
    /// Directory of the config that declared `paths`, plus the raw table.
    paths: Option<(PathBuf, Vec<(String, Vec<String>)>)>,
}

/// Loads `compilerOptions.baseUrl` and `compilerOptions.paths` from a
/// tsconfig, following relative `extends`.
pub fn load_compiler_options(tsconfig: &Path) -> Result<CompilerOptions, ResolutionError> {
    debug!("Reading compiler options from {}", tsconfig.display());
    let mut ancestors = HashSet::new();
    let raw = load_raw(tsconfig, &mut ancestors)?;

    let mut aliases = Vec::new();
    if let Some((declaring_dir, table)) = raw.paths {
        let base = raw.base_url.clone().unwrap_or(declaring_dir);
        for (pattern, targets) in table {
            let targets: Vec<String> = targets
                .iter()
                .map(|t| base.join(t).clean().to_string_lossy().to_string())
                .collect();
            if targets.is_empty() {
                continue;
            }
            trace!("Found tsconfig path alias: '{}' -> {:?}", pattern, targets);
            aliases.push(PathAlias { pattern, targets });
        }
    }

    debug!("Loaded {} tsconfig path aliases", aliases.len());
    Ok(CompilerOptions::new(raw.base_url, aliases))
}

/// `ancestors` holds the configs on the current `extends` path only, so a
/// base shared by two branches is loaded once per branch.
fn load_raw(
    path: &Path,
    ancestors: &mut HashSet<PathBuf>,
) -> Result<RawOptions, ResolutionError> {
    let config_error =
        |message: String| ResolutionError::ConfigParse { path: path.to_path_buf(), message };

    if ancestors.contains(path) {
        return Err(config_error("circular `extends` chain".to_string()));
    }
    if ancestors.len() >= MAX_EXTENDS_DEPTH {
        return Err(config_error("`extends` chain too deep".to_string()));
    }
    ancestors.insert(path.to_path_buf());

    let content = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
    let json: Value =
        serde_json::from_str(&strip_jsonc(&content)).map_err(|e| config_error(e.to_string()))?;
    if !json.is_object() {
        return Err(config_error("tsconfig root must be a JSON object".to_string()));
    }

    let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let mut raw = RawOptions::default();

    for parent in extends_of(&json) {
        if !(parent.starts_with('.') || parent.starts_with('/')) {
            debug!("Ignoring package-based extends '{}' in {}", parent, path.display());
            continue;
        }
        let parent_path = resolve_extends(&dir, parent)
            .ok_or_else(|| config_error(format!("cannot find extended config '{}'", parent)))?;
        trace!("Following extends: {}", parent_path.display());
        let inherited = load_raw(&parent_path, ancestors)?;
        if inherited.base_url.is_some() {
            raw.base_url = inherited.base_url;
        }
        if inherited.paths.is_some() {
            raw.paths = inherited.paths;
        }
    }

    if let Some(options) = json.get("compilerOptions") {
        if let Some(base_url) = options.get("baseUrl").and_then(Value::as_str) {
            raw.base_url = Some(dir.join(base_url).clean());
        }
        if let Some(paths) = options.get("paths").and_then(Value::as_object) {
            let table = paths
                .iter()
                .map(|(alias, targets)| {
                    let targets = targets
                        .as_array()
                        .map(|arr| arr.iter().filter_map(Value::as_str).map(String::from).collect())
                        .unwrap_or_default();
                    (alias.clone(), targets)
                })
                .collect();
            raw.paths = Some((dir.clone(), table));
        }
    }

    ancestors.remove(path);
    Ok(raw)
}

fn extends_of(json: &Value) -> Vec<&str> {
    match json.get("extends") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn resolve_extends(dir: &Path, spec: &str) -> Option<PathBuf> {
    let candidate = dir.join(spec).clean();
    if candidate.is_file() {
        return Some(candidate);
    }
    let with_ext = PathBuf::from(format!("{}.json", candidate.display()));
    with_ext.is_file().then_some(with_ext)
}

/// Strips `//` and `/* */` comments and trailing commas so tsconfig-style
/// JSONC can be handed to `serde_json`. String contents are left alone.
pub fn strip_jsonc(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    prev = skipped;
                }
            }
            _ => out.push(c),
        }
    }

    strip_trailing_commas(&out)
}

fn strip_trailing_commas(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}
