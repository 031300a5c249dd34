use log::{debug, info};
use path_clean::PathClean;
use std::path::{Path, PathBuf};

use docsurface_core::{Manifest, extract_entries};

use crate::{
    config::TraceConfig,
    tracer::trace_from_entries,
    types::{PackageTrace, TraceResult},
};

/// Reads `manifest_path`, extracts its source entry points and traces them
/// with the package directory as the root.
pub fn trace_from_package_exports(manifest_path: &Path, config: &TraceConfig) -> PackageTrace {
    let manifest_path = manifest_path.to_path_buf().clean();
    let package_root = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let package_root = package_root.canonicalize().unwrap_or(package_root);

    match Manifest::load(&manifest_path) {
        Ok(manifest) => trace_manifest(&package_root, &manifest, config),
        Err(e) => {
            debug!("Manifest unusable: {}", e);
            PackageTrace {
                manifest_path,
                package_root,
                name: None,
                unresolved: Vec::new(),
                extracted: Default::default(),
                entry_points: Vec::new(),
                result: TraceResult::failed(e),
            }
        }
    }
}

/// Traces an already loaded manifest rooted at `package_root`.
pub fn trace_manifest(
    package_root: &Path,
    manifest: &Manifest,
    config: &TraceConfig,
) -> PackageTrace {
    let extracted = extract_entries(manifest);
    let entry_points = extracted.absolute(package_root);
    info!(
        "Package {} has {} traceable exports ({} unresolved)",
        manifest.name.as_deref().unwrap_or("<unnamed>"),
        entry_points.len(),
        extracted.unresolved.len()
    );

    let entry_paths: Vec<PathBuf> = entry_points.iter().map(|e| e.path.clone()).collect();
    let result = trace_from_entries(&config.with_root(package_root), &entry_paths);

    PackageTrace {
        manifest_path: package_root.join(docsurface_core::MANIFEST_FILE),
        package_root: package_root.to_path_buf(),
        name: manifest.name.clone(),
        unresolved: extracted.unresolved.clone(),
        extracted,
        entry_points,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsurface_core::ResolutionErrorKind;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_traces_exports() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let manifest = create_test_file(
            &root,
            "package.json",
            r#"{ "name": "kit", "exports": { ".": "./src/index.ts", "./cli": "./dist/cli.js" } }"#,
        );
        create_test_file(&root, "src/index.ts", "export * from './util';");
        create_test_file(&root, "src/util.ts", "export const u = 1;");

        let traced = trace_from_package_exports(&manifest, &TraceConfig::new("."));
        assert_eq!(traced.name.as_deref(), Some("kit"));
        assert_eq!(traced.unresolved, vec!["./cli"]);
        assert_eq!(traced.result.files, vec![root.join("src/index.ts"), root.join("src/util.ts")]);
        assert!(traced.result.errors.is_empty());
    }

    #[test]
    fn test_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("package.json");

        let traced = trace_from_package_exports(&manifest, &TraceConfig::new("."));
        assert!(traced.result.files.is_empty());
        assert_eq!(traced.result.errors[0].kind(), ResolutionErrorKind::ManifestNotFound);
    }

    #[test]
    fn test_export_pointing_at_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().canonicalize().unwrap();
        let manifest =
            create_test_file(&root, "package.json", r#"{ "exports": "./src/index.ts" }"#);

        let traced = trace_from_package_exports(&manifest, &TraceConfig::new("."));
        assert!(traced.result.files.is_empty());
        assert_eq!(traced.result.errors.len(), 1);
        assert_eq!(traced.result.errors[0].kind(), ResolutionErrorKind::EntryNotFound);
        assert_eq!(traced.result.errors[0].path(), root.join("src/index.ts").as_path());
    }
}
