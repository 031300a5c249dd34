//! Workspace-level resolution of documentation-linted API surfaces.
//!
//! Discovers the packages of a repository, decides which ones are governed
//! by a documentation policy config, traces each enabled package's public
//! surface, and maps staged files back to the policy that applies to them.

mod config;
mod discovery;
mod policy;
mod resolver;
mod types;

pub use config::{DEFAULT_POLICY_FILE, WorkspaceConfig};
pub use discovery::{Layout, PNPM_WORKSPACE_FILE, detect_layout, workspace_patterns};
pub use policy::{find_policy_file, validate_policy_file};
pub use resolver::WorkspaceResolver;
pub use types::{PackageResult, PackageStatus, StagedGroup, Summary, WorkspaceResolution};
