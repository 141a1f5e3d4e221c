// SPDX-FileCopyrightText: 2026 Invitrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Invitrack invite tracker.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! a file hierarchy lookup, environment variable overrides, and miette diagnostics
//! with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use invitrack_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("database: {}", config.storage.database_file().display());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::InvitrackConfig;

/// Load configuration from the file hierarchy and validate it.
pub fn load_and_validate() -> Result<InvitrackConfig, Vec<ConfigError>> {
    finish(loader::load_config(), || {
        read_sources(&loader::config_search_paths())
    })
}

/// Load configuration from one explicit file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<InvitrackConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        read_sources(&[path.to_path_buf()])
    })
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<InvitrackConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validates a loaded config, or converts the load error into diagnostics.
///
/// `sources` is only read on failure, to resolve source spans.
fn finish(
    loaded: Result<InvitrackConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<InvitrackConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Reads the TOML files that exist, keyed by the path figment reports for them.
fn read_sources(paths: &[std::path::PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(path).ok()?;
            let shown = std::path::absolute(path).unwrap_or_else(|_| path.clone());
            Some((shown.display().to_string(), content))
        })
        .collect()
}
