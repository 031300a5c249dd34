//! Module graph tracing for TypeScript packages.
//!
//! Starting from a package's entry files, this crate follows static imports,
//! re-exports, dynamic imports and `require()` calls through the package's
//! own sources and returns the sorted set of files that make up its public
//! API surface.
//!
//! # Examples
//!
//! ```no_run
//! use docsurface_trace::{TraceConfig, trace_from_package_exports};
//! use std::path::Path;
//!
//! let traced = trace_from_package_exports(
//!     Path::new("/path/to/package/package.json"),
//!     &TraceConfig::new("/path/to/package"),
//! );
//! for file in &traced.result.files {
//!     println!("{}", file.display());
//! }
//! for error in &traced.result.errors {
//!     eprintln!("{}", error);
//! }
//! ```

mod config;
mod filter;
mod package;
mod tracer;
mod types;

// Re-export public API
pub use config::TraceConfig;
pub use filter::SourceFilter;
pub use package::{trace_from_package_exports, trace_manifest};
pub use tracer::{Tracer, trace_from_entries};
pub use types::{ConfigSource, PackageTrace, TraceResult};
