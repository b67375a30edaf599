//! Storage infrastructure: configuration file loading.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the platform-appropriate
//!   directory, or from a path given on the command line.
//! - Providing defaults when the file does not exist (first run).
//! - Turning raw values into validated listener settings and the catalogue
//!   registry.

pub mod config;
