//! CLI utilities for the aningcall tools
//!
//! Provides shared CLI functionality:
//! - Status messages and aligned fields
//! - Error reports with hints
//! - JSON output

#![warn(missing_docs)]

pub mod output;
