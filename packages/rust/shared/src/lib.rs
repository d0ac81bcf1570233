//! Shared types, error model, and configuration for bookbinder.
//!
//! This crate is the foundation depended on by all other bookbinder crates.
//! It provides:
//! - [`BookbinderError`] — the unified error type
//! - Domain types ([`BookStructure`], [`Chapter`])
//! - Configuration ([`AppConfig`], config loading, credential resolution)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ExtractConfig, OpenAiConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_api_key,
};
pub use error::{BookbinderError, Result};
pub use types::{BookStructure, Chapter};
