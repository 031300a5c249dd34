//! Core utilities for docsurface.
//!
//! This crate provides the building blocks for computing a package's public
//! API surface:
//! - Reading `package.json` and extracting source entry points from `exports`
//! - Parsing import, re-export, dynamic import and require specifiers
//! - Resolving specifiers (relative paths, tsconfig `paths` aliases)
//! - Loading the nearest tsconfig, including `extends` chains
//! - The error values collected while resolving

mod constants;
mod entries;
mod error;
mod manifest;
mod parser;
mod resolver;
mod tsconfig;
mod types;

// Re-export public API
pub use constants::{
    DEFAULT_TEST_PATTERNS, DEPENDENCY_DIR, INDEX_FILES, RESOLVE_EXTENSIONS, SOURCE_EXTENSIONS,
    has_source_extension, is_declaration_file,
};
pub use entries::{CONDITION_PRIORITY, EntryPoint, ExtractedEntries, extract_entries};
pub use error::{ResolutionError, ResolutionErrorKind};
pub use manifest::{ExportMap, MANIFEST_FILE, Manifest, manifest_path};
pub use parser::{imports_for, specifiers_in_source};
pub use resolver::{ResolveContext, is_in_dependency_dir, source_for_declaration};
pub use tsconfig::{
    CompilerOptions, PathAlias, TSCONFIG_FILE, find_git_root, find_tsconfig,
    load_compiler_options, strip_jsonc,
};
pub use types::{SpecKind, Specifier};
