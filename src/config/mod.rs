//! Configuration module for thumbslice
//!
//! Provides types and parsing for `thumbslice.toml` run configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
