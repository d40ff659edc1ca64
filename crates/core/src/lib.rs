//! Core utilities for the aningcall build tools
//!
//! This crate provides the shared pieces the Android tooling is built on:
//!
//! - **Error handling**: errors with codes, context and recovery suggestions
//! - **Properties files**: the flat key-value format Gradle projects use
//! - **Configuration**: TOML-based project configuration
//! - **Validation**: collect-all-problems input checks
//! - **Process execution**: running the Gradle wrapper and JDK tools
//!
//! # Example
//!
//! ```rust,no_run
//! use aningcall_core::{config::Config, properties::Properties};
//! use std::path::Path;
//!
//! let config = Config::load(None, Path::new(".")).expect("config");
//! let bytes = std::fs::read(&config.schema.signing.properties_file).expect("read");
//! let props = Properties::from_utf8(&bytes).expect("properties");
//! println!("{} signing keys", props.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;
pub mod properties;
pub mod validation;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::properties::Properties;
    pub use crate::validation::{ValidationResult, Validator};
}
