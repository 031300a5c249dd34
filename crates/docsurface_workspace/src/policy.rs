use log::{debug, trace};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};

use docsurface_core::{ResolutionError, strip_jsonc};

/// First policy file from `names` present in `dir`.
pub fn find_policy_file(dir: &Path, names: &[String]) -> Option<PathBuf> {
    names.iter().map(|name| dir.join(name)).find(|path| {
        let found = path.is_file();
        trace!("Policy candidate {}: {}", path.display(), found);
        found
    })
}

/// Checks that a policy file is readable and holds a JSON object.
/// Comments and trailing commas are accepted.
pub fn validate_policy_file(path: &Path) -> Result<(), ResolutionError> {
    let content = fs::read_to_string(path).map_err(|e| ResolutionError::PolicyConfigRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let parse_error = |message: String| ResolutionError::PolicyConfigParse {
        path: path.to_path_buf(),
        message,
    };
    match serde_json::from_str::<Value>(&strip_jsonc(&content)) {
        Ok(Value::Object(_)) => {
            debug!("Policy config OK: {}", path.display());
            Ok(())
        }
        Ok(_) => Err(parse_error("expected a JSON object".to_string())),
        Err(e) => Err(parse_error(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsurface_core::ResolutionErrorKind;
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
    fn test_find_policy_file_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        create_test_file(dir, "b.json", "{}");
        create_test_file(dir, "c.json", "{}");

        let names = vec!["a.json".to_string(), "c.json".to_string(), "b.json".to_string()];
        assert_eq!(find_policy_file(dir, &names), Some(dir.join("c.json")));
        assert_eq!(find_policy_file(dir, &["a.json".to_string()]), None);
    }

    #[test]
    fn test_directory_is_not_a_policy_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("tsdoc.json")).unwrap();
        assert_eq!(find_policy_file(temp_dir.path(), &["tsdoc.json".to_string()]), None);
    }

    #[test]
    fn test_valid_policy_with_comments() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(
            temp_dir.path(),
            "tsdoc.json",
            "{\n  // extra tags\n  \"tagDefinitions\": [],\n}\n",
        );
        assert!(validate_policy_file(&path).is_ok());
    }

    #[test]
    fn test_policy_not_an_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(temp_dir.path(), "tsdoc.json", "[1, 2]");
        let err = validate_policy_file(&path).unwrap_err();
        assert_eq!(err.kind(), ResolutionErrorKind::PolicyConfigParse);
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn test_policy_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(temp_dir.path(), "tsdoc.json", "{ not json");
        let err = validate_policy_file(&path).unwrap_err();
        assert_eq!(err.kind(), ResolutionErrorKind::PolicyConfigParse);
    }

    #[test]
    fn test_policy_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let err = validate_policy_file(&temp_dir.path().join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), ResolutionErrorKind::PolicyConfigRead);
    }
}
