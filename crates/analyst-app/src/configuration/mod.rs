//! Configuration management for the analyst client.
//!
//! Values come from built-in defaults, `config.toml`, `ANALYST_*` environment
//! variables and command-line flags, in increasing order of precedence.

mod config;

pub use config::*;
