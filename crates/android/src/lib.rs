//! Android tooling for aningcall
//!
//! This crate provides the Android side of the build tooling:
//! - Release signing resolution from `key.properties`
//! - Gradle wrapper integration that resolves signing before release builds

#![warn(missing_docs)]

pub mod gradle;
pub mod signing;

pub use signing::{resolve, SigningIdentity, SigningProperties, SigningResolver};
