use clap::Parser;
use docsurface_core::DEFAULT_TEST_PATTERNS;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "trace")]
#[command(about = "Trace the public API surface of a TypeScript package")]
pub struct TraceConfig {
    /// Package root; relative resolution and tsconfig lookup start here
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Use this tsconfig instead of the nearest one above the root
    #[arg(long)]
    pub tsconfig: Option<PathBuf>,

    /// Path substring excluded from the traced file set (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    /// Path substring identifying test files (repeatable)
    #[arg(long = "test-pattern", default_values = DEFAULT_TEST_PATTERNS)]
    pub test_patterns: Vec<String>,
}

impl TraceConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tsconfig: None,
            exclude: Vec::new(),
            test_patterns: DEFAULT_TEST_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_root(&self, root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..self.clone() }
    }
}
