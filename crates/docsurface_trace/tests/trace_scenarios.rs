use docsurface_trace::{TraceConfig, Tracer, trace_from_entries, trace_from_package_exports};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
    let file_path = dir.join(path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path.canonicalize().unwrap()
}

/// A small library with every kind of edge the tracer follows.
fn library(root: &Path) {
    create_test_file(
        root,
        "package.json",
        r#"{
  "name": "@acme/widgets",
  "exports": {
    ".": { "source": "./src/index.ts", "default": "./dist/index.js" },
    "./lazy": { "types": "./src/lazy.ts", "import": "./dist/lazy.js" }
  }
}"#,
    );
    create_test_file(
        root,
        "tsconfig.json",
        r#"{
  // shared aliases
  "compilerOptions": { "baseUrl": ".", "paths": { "~/*": ["./src/*"] }, },
}"#,
    );
    create_test_file(
        root,
        "src/index.ts",
        "export * from './button.js';\nexport type { Theme } from '~/theme';\nimport { clsx } from 'clsx';",
    );
    create_test_file(root, "src/button.tsx", "import { tokens } from './tokens';\nexport const Button = () => <b />;");
    create_test_file(root, "src/tokens.ts", "import { Button } from './button';\nexport const tokens = {};");
    create_test_file(root, "src/theme.ts", "export interface Theme {}");
    create_test_file(root, "src/lazy.ts", "export const load = () => import('./heavy/index');");
    create_test_file(root, "src/heavy/index.ts", "import './heavy.test';");
    create_test_file(root, "src/heavy/heavy.test.ts", "import { fixture } from '../fixtures';");
    create_test_file(root, "src/fixtures.ts", "export const fixture = 1;");
    create_test_file(root, "src/unused.ts", "export const unused = 1;");
    create_test_file(root, "node_modules/clsx/index.ts", "export const clsx = 1;");
}

#[test]
fn traces_whole_public_surface() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    library(&root);

    let traced = trace_from_package_exports(&root.join("package.json"), &TraceConfig::new("."));
    assert!(traced.result.errors.is_empty(), "{:?}", traced.result.errors);
    assert!(traced.unresolved.is_empty());

    let rel: Vec<String> = traced
        .result
        .files
        .iter()
        .map(|p| p.strip_prefix(&root).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(
        rel,
        vec![
            "src/button.tsx",
            "src/fixtures.ts",
            "src/heavy/index.ts",
            "src/index.ts",
            "src/lazy.ts",
            "src/theme.ts",
            "src/tokens.ts",
        ]
    );
}

#[test]
fn tracing_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    library(&root);

    let config = TraceConfig::new(&root);
    let entries = vec![root.join("src/lazy.ts"), root.join("src/index.ts")];
    let first = trace_from_entries(&config, &entries);
    let second = Tracer::new(&config).unwrap().trace_from_entries(&entries);
    assert_eq!(first.files, second.files);

    let reversed: Vec<PathBuf> = entries.iter().rev().cloned().collect();
    let third = trace_from_entries(&config, &reversed);
    assert_eq!(first.files, third.files);
}

#[test]
fn caller_excludes_apply_last() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    library(&root);

    let mut config = TraceConfig::new(".");
    config.exclude.push("/heavy/".to_string());
    let traced = trace_from_package_exports(&root.join("package.json"), &config);
    assert!(traced.result.files.iter().all(|p| !p.to_string_lossy().contains("/heavy/")));
    assert!(traced.result.files.contains(&root.join("src/fixtures.ts")));
}

#[test]
fn missing_entry_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().canonicalize().unwrap();
    let missing = root.join("src/gone.ts");

    let result = trace_from_entries(&TraceConfig::new(&root), &[missing.clone()]);
    assert!(result.files.is_empty());
    assert_eq!(result.errors.len(), 1);
    let json = serde_json::to_value(&result.errors[0]).unwrap();
    assert_eq!(json["type"], "entry_not_found");
    assert_eq!(json["path"], missing.to_string_lossy().as_ref());
}
