//! Command-line driver for signing views and PDF merges
//!
//! The `docsign` binary is a thin shell over [`commands`]; configuration is
//! read from TOML by [`config`].

pub mod commands;
pub mod config;

pub use commands::{run_merge, run_project, MergeReport, MergeRequest};
pub use config::{Config, LoggingConfig};
