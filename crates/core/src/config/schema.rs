//! Configuration schema definitions
//!
//! Every section is optional in the file; missing values take defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigSchema {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub signing: SigningConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General project configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Project name
    #[serde(default = "default_project_name")]
    pub project_name: String,

    /// Android project directory (holds `gradlew`), relative to the project root
    #[serde(default = "default_android_dir")]
    pub android_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            android_dir: default_android_dir(),
        }
    }
}

fn default_project_name() -> String {
    "aningcall".to_string()
}

fn default_android_dir() -> PathBuf {
    PathBuf::from("android")
}

/// Release signing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SigningConfig {
    /// Resolve `key.properties` without an explicit `--enable`
    #[serde(default)]
    pub enabled: bool,

    /// Signing properties file, relative to the project root
    #[serde(default = "default_properties_file")]
    pub properties_file: PathBuf,

    /// App module directory; relative `storeFile` paths resolve against it
    #[serde(default = "default_module_dir")]
    pub module_dir: PathBuf,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            properties_file: default_properties_file(),
            module_dir: default_module_dir(),
        }
    }
}

fn default_properties_file() -> PathBuf {
    PathBuf::from("android/key.properties")
}

fn default_module_dir() -> PathBuf {
    PathBuf::from("android/app")
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,

    /// Also append logs to this file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
