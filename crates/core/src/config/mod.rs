//! Configuration loading and schema definitions
//!
//! Project settings live in `.aningcall.toml`; see [`ConfigSchema`].

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
