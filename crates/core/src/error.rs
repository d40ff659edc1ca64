//! Structured error handling with codes, context and recovery suggestions
//!
//! Every fallible operation in the workspace returns [`Error`], which carries:
//! - An [`ErrorCode`] for programmatic handling
//! - Optional context and a recovery suggestion
//! - The keys a signing configuration was missing, when that is the failure
//! - A serializable [`ErrorReport`] for `--json` output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    Unknown = 1000,
    Internal = 1001,

    // IO errors (2xxx)
    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,
    InvalidPath = 2003,
    AlreadyExists = 2005,

    // Configuration errors (3xxx)
    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    ConfigValidationError = 3003,
    InvalidConfigValue = 3004,

    // Signing configuration (31xx)
    SigningConfigError = 3100,
    SigningKeyMissing = 3101,
    SigningParseError = 3102,
    KeystoreNotFound = 3103,

    // Process errors (5xxx)
    ProcessError = 5000,
    CommandNotFound = 5001,
    CommandFailed = 5002,

    // Validation errors (6xxx)
    ValidationError = 6000,
    InvalidInput = 6001,
    InvalidFormat = 6002,

    // Platform-specific errors (8xxx)
    PlatformError = 8000,
    GradleError = 8002,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            5 => "Process",
            6 => "Validation",
            8 => "Platform",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Required keys that were absent or empty
    pub missing_keys: Vec<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            missing_keys: Vec::new(),
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Keys a signing configuration was missing
    pub fn missing_keys(&self) -> &[String] {
        &self.missing_keys
    }

    /// Whether this is any configuration failure (3xxx)
    pub fn is_configuration(&self) -> bool {
        self.code.code() / 1000 == 3
    }

    /// Convert to a serializable report
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            missing_keys: self.missing_keys.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    // Convenience constructors

    pub fn already_exists(path: impl AsRef<Path>) -> Self {
        Self::new(
            ErrorCode::AlreadyExists,
            format!("File already exists: {}", path.as_ref().display()),
        )
        .with_suggestion("Pass --force to overwrite it")
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn config_not_found(path: impl AsRef<Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create an .aningcall.toml file or use --config to specify a path")
    }

    pub fn config_parse(path: impl AsRef<Path>, err: toml::de::Error) -> Self {
        Self::new(
            ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}: {}", path.as_ref().display(), err),
        )
        .with_source(err)
    }

    /// A signing properties file that exists but could not be used
    pub fn signing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningConfigError, message)
    }

    /// A signing properties file with syntax errors
    pub fn signing_parse(path: impl AsRef<Path>, line: usize, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::SigningParseError,
            format!(
                "Malformed signing properties in {} at line {}: {}",
                path.as_ref().display(),
                line,
                message.into()
            ),
        )
        .with_suggestion("Fix the file or delete it to fall back to the debug signing identity")
    }

    /// A signing properties file without every required key
    pub fn signing_keys_missing(path: impl AsRef<Path>, keys: &[&str]) -> Self {
        let mut err = Self::new(
            ErrorCode::SigningKeyMissing,
            format!(
                "Signing properties {} is missing required key(s): {}",
                path.as_ref().display(),
                keys.join(", ")
            ),
        )
        .with_suggestion("Add the missing keys; each one needs a non-empty value");
        err.missing_keys = keys.iter().map(|k| (*k).to_string()).collect();
        err
    }

    pub fn keystore_not_found(path: impl AsRef<Path>) -> Self {
        Self::new(
            ErrorCode::KeystoreNotFound,
            format!("Keystore not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Check storeFile; relative paths resolve against the app module directory")
    }

    pub fn process(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessError, message)
    }

    pub fn command_not_found(cmd: &str) -> Self {
        Self::new(
            ErrorCode::CommandNotFound,
            format!("Command not found: {}", cmd),
        )
        .with_suggestion(format!("Install {} and ensure it's in your PATH", cmd))
    }

    pub fn gradle(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GradleError, message)
    }
}

/// Serializable error report for logging and JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub code_str: String,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const VALIDATION_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const COMMAND_NOT_FOUND: i32 = 127;

    /// Map an error to the exit code a CLI should report
    pub fn for_error(err: &super::Error) -> i32 {
        use super::ErrorCode;
        if err.is_configuration() {
            return CONFIG_ERROR;
        }
        match err.code {
            ErrorCode::ValidationError | ErrorCode::InvalidInput | ErrorCode::InvalidFormat => {
                VALIDATION_ERROR
            }
            ErrorCode::CommandNotFound => COMMAND_NOT_FOUND,
            _ => FAILURE,
        }
    }
}

// Implement From for common error types

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => ErrorCode::AlreadyExists,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::InvalidFormat, format!("JSON error: {}", err)).with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}
