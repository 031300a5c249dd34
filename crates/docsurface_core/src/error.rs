//! Errors collected while resolving packages and tracing module graphs.
//!
//! These are values, not control flow: tracing is best-effort and pushes
//! them into a result-level list while carrying on with whatever else can
//! still be resolved.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionError {
    #[error("manifest not found: {}", .path.display())]
    ManifestNotFound { path: PathBuf, message: String },

    #[error("failed to parse manifest {}: {message}", .path.display())]
    ManifestParse { path: PathBuf, message: String },

    #[error("entry not found: {}", .path.display())]
    EntryNotFound { path: PathBuf, message: String },

    #[error("failed to read policy config {}: {message}", .path.display())]
    PolicyConfigRead { path: PathBuf, message: String },

    #[error("failed to parse policy config {}: {message}", .path.display())]
    PolicyConfigParse { path: PathBuf, message: String },

    #[error("failed to read {}: {message}", .path.display())]
    FileRead { path: PathBuf, message: String },

    /// A module-resolution config exists but cannot be used. Fatal for the
    /// trace that needed it.
    #[error("invalid module resolution config {}: {message}", .path.display())]
    ConfigParse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionErrorKind {
    ManifestNotFound,
    ManifestParse,
    EntryNotFound,
    PolicyConfigRead,
    PolicyConfigParse,
    FileRead,
    ConfigParse,
}

impl ResolutionError {
    pub fn kind(&self) -> ResolutionErrorKind {
        match self {
            Self::ManifestNotFound { .. } => ResolutionErrorKind::ManifestNotFound,
            Self::ManifestParse { .. } => ResolutionErrorKind::ManifestParse,
            Self::EntryNotFound { .. } => ResolutionErrorKind::EntryNotFound,
            Self::PolicyConfigRead { .. } => ResolutionErrorKind::PolicyConfigRead,
            Self::PolicyConfigParse { .. } => ResolutionErrorKind::PolicyConfigParse,
            Self::FileRead { .. } => ResolutionErrorKind::FileRead,
            Self::ConfigParse { .. } => ResolutionErrorKind::ConfigParse,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::ManifestNotFound { path, .. }
            | Self::ManifestParse { path, .. }
            | Self::EntryNotFound { path, .. }
            | Self::PolicyConfigRead { path, .. }
            | Self::PolicyConfigParse { path, .. }
            | Self::FileRead { path, .. }
            | Self::ConfigParse { path, .. } => path,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ManifestNotFound { message, .. }
            | Self::ManifestParse { message, .. }
            | Self::EntryNotFound { message, .. }
            | Self::PolicyConfigRead { message, .. }
            | Self::PolicyConfigParse { message, .. }
            | Self::FileRead { message, .. }
            | Self::ConfigParse { message, .. } => message,
        }
    }

    /// True for errors that invalidate a whole trace rather than one edge.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ResolutionErrorKind::ConfigParse
                | ResolutionErrorKind::ManifestNotFound
                | ResolutionErrorKind::ManifestParse
        )
    }
}
