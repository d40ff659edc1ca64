//! Input validation
//!
//! A fluent [`Validator`] collects every problem instead of stopping at the
//! first one, so callers can report all missing fields at once.
//!
//! # Example
//!
//! ```rust
//! use aningcall_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("keyAlias", "upload")
//!     .required("keyPassword", "")
//!     .validate();
//!
//! assert!(!result.is_valid());
//! assert_eq!(result.failed_fields("REQUIRED"), vec!["keyPassword"]);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Fields that failed with the given code, in the order they were checked
    pub fn failed_fields(&self, code: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.code == code)
            .map(|e| e.field.as_str())
            .collect()
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not empty
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
                expected: Some("non-empty value".to_string()),
                actual: Some("empty".to_string()),
            });
        }
        self
    }

    /// Validate that an optional field is present and not empty
    pub fn required_opt(self, field: &str, value: Option<&str>) -> Self {
        self.required(field, value.unwrap_or_default())
    }

    /// Validate that a path is a file
    pub fn is_file(mut self, field: &str, path: &Path) -> Self {
        if !path.is_file() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Not a file: {}", path.display()),
                code: "NOT_A_FILE".to_string(),
                expected: Some("file".to_string()),
                actual: Some(if path.is_dir() {
                    "directory".to_string()
                } else {
                    "not found".to_string()
                }),
            });
        }
        self
    }

    /// Validate that a path is a directory
    pub fn is_directory(mut self, field: &str, path: &Path) -> Self {
        if !path.is_dir() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Not a directory: {}", path.display()),
                code: "NOT_A_DIRECTORY".to_string(),
                expected: Some("directory".to_string()),
                actual: Some(if path.is_file() {
                    "file".to_string()
                } else {
                    "not found".to_string()
                }),
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_required_validation() {
        let result = Validator::new().required("name", "").validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "REQUIRED");
    }

    #[test]
    fn test_required_rejects_whitespace() {
        let result = Validator::new().required("name", "  \t").validate();
        assert!(!result.is_valid());
    }

    #[test]
    fn test_required_opt_missing() {
        let result = Validator::new()
            .required_opt("storeFile", None)
            .required_opt("keyAlias", Some("upload"))
            .validate();
        assert_eq!(result.failed_fields("REQUIRED"), vec!["storeFile"]);
    }

    #[test]
    fn test_failed_fields_keeps_check_order() {
        let result = Validator::new()
            .required("b", "")
            .required("a", "")
            .validate();
        assert_eq!(result.failed_fields("REQUIRED"), vec!["b", "a"]);
    }

    #[test]
    fn test_path_validation() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("release.jks");
        std::fs::write(&file, b"keystore").unwrap();

        let result = Validator::new()
            .is_file("storeFile", &file)
            .is_directory("dir", temp_dir.path())
            .validate();
        assert!(result.is_valid());

        let result = Validator::new()
            .is_file("storeFile", temp_dir.path())
            .is_directory("dir", &file)
            .validate();
        assert_eq!(result.errors().len(), 2);
        assert_eq!(result.errors()[0].actual.as_deref(), Some("directory"));
        assert_eq!(result.errors()[1].actual.as_deref(), Some("file"));
    }
}
