//! package.json model.
//!
//! The `exports` field is self-referential: a string, an array of
//! fallbacks, a map of subpaths, or a map of conditions, nested to any
//! depth. [`ExportMap`] classifies each level exactly once so the rest of
//! the crate never has to guess whether a key is a subpath or a condition.

use log::{trace, warn};
use serde_json::Value;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::ResolutionError;

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportMap {
    /// A single target path, e.g. `"./src/index.ts"`.
    Target(String),
    /// `null`: the subpath is explicitly not exported.
    Blocked,
    /// `["./a.ts", "./a.js"]`: alternatives tried in order.
    Fallbacks(Vec<ExportMap>),
    /// Keys starting with `.`, in manifest order.
    Subpaths(Vec<(String, ExportMap)>),
    /// Condition names (`source`, `types`, `import`, ...), in manifest order.
    Conditions(Vec<(String, ExportMap)>),
}

impl ExportMap {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Target(s.clone()),
            Value::Null => Self::Blocked,
            Value::Array(items) => Self::Fallbacks(items.iter().map(Self::from_value).collect()),
            Value::Object(obj) => {
                // An object is a subpath map as soon as one key is a subpath.
                // Mixed objects are invalid in Node; the condition keys are dropped.
                if obj.keys().any(|k| k.starts_with('.')) {
                    let mut subpaths = Vec::with_capacity(obj.len());
                    for (key, value) in obj {
                        if key.starts_with('.') {
                            subpaths.push((key.clone(), Self::from_value(value)));
                        } else {
                            warn!("Ignoring condition key '{}' mixed with subpath keys", key);
                        }
                    }
                    Self::Subpaths(subpaths)
                } else {
                    Self::Conditions(
                        obj.iter().map(|(k, v)| (k.clone(), Self::from_value(v))).collect(),
                    )
                }
            }
            other => {
                warn!("Ignoring export target of unexpected type: {}", other);
                Self::Blocked
            }
        }
    }

    /// True if the map declares nothing that could ever be exported.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Target(s) => s.is_empty(),
            Self::Blocked => true,
            Self::Fallbacks(items) => items.iter().all(Self::is_empty),
            Self::Subpaths(items) | Self::Conditions(items) => {
                items.iter().all(|(_, v)| v.is_empty())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub name: Option<String>,
    /// `None` when the field is absent, `Some(ExportMap::Blocked)` when it is `null`.
    pub exports: Option<ExportMap>,
    pub main: Option<String>,
    /// The ESM entry that is preferred over `main` when both are present.
    pub module: Option<String>,
}

impl Manifest {
    pub fn from_value(value: &Value) -> Self {
        let string_field =
            |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            name: string_field("name"),
            exports: value.get("exports").map(ExportMap::from_value),
            main: string_field("main"),
            module: string_field("module"),
        }
    }

    pub fn parse(path: &Path, src: &str) -> Result<Self, ResolutionError> {
        let value: Value = serde_json::from_str(src).map_err(|e| {
            ResolutionError::ManifestParse { path: path.to_path_buf(), message: e.to_string() }
        })?;
        if !value.is_object() {
            return Err(ResolutionError::ManifestParse {
                path: path.to_path_buf(),
                message: "manifest root must be a JSON object".to_string(),
            });
        }
        Ok(Self::from_value(&value))
    }

    pub fn load(path: &Path) -> Result<Self, ResolutionError> {
        trace!("Loading manifest: {}", path.display());
        let src = fs::read_to_string(path).map_err(|e| {
            let message = if e.kind() == io::ErrorKind::NotFound {
                "package.json does not exist".to_string()
            } else {
                e.to_string()
            };
            ResolutionError::ManifestNotFound { path: path.to_path_buf(), message }
        })?;
        Self::parse(path, &src)
    }

    /// True if `exports` is present and declares at least one target.
    pub fn has_exports(&self) -> bool {
        self.exports.as_ref().is_some_and(|e| !e.is_empty())
    }
}

/// Path of the manifest inside a package root.
pub fn manifest_path(package_root: &Path) -> PathBuf {
    package_root.join(MANIFEST_FILE)
}
