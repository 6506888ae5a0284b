//! # Configuration System
//!
//! Centralized configuration management for the Strata core.
//!
//! This crate provides:
//! - Configuration structures for providers, integration, context and
//!   feedback
//! - Environment variable loading (`STRATA_*`)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (CLI > env > file > defaults)
//! - Configuration validation

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validation;

pub use config::{
    Config, ContextConfig, FeedbackConfig, IntegrationConfig, ObservabilityConfig, ProviderConfig
};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::load_from_env;
pub use precedence::merge_configs;
pub use validation::validate;
pub use validator::Validate;

use std::path::Path;

/// Failure to assemble a usable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    File(#[from] ConfigFileError),

    #[error("Failed to read environment configuration: {reason}")]
    Env { reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors)
}

/// Resolve the effective configuration.
///
/// Layers an optional config file, the `STRATA_*` environment and optional
/// CLI overrides on top of the defaults, then validates the result.
pub fn load(path: Option<&Path>, cli: Option<Config>) -> Result<Config, ConfigError> {
    let file_config = match path {
        Some(path) => load_from_file(path)?,
        None => Config::default()
    };
    let env_config = load_from_env().map_err(|e| ConfigError::Env {
        reason: e.to_string()
    })?;

    let config = merge_configs(
        Config::default(),
        file_config,
        "file",
        env_config,
        "env",
        cli,
        "cli"
    );
    validate(&config)?;

    Ok(config)
}
