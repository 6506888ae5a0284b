//! # Configuration Validation
//!
//! Provides validation for all configuration structures using the `validator` crate.

use crate::config::Config;
use validator::Validate;

/// Validate configuration structure.
///
/// ## Validation Rules
/// ### Providers
/// - `provider`: must be "openai", "ollama" or "mock"
/// - `model`: 1-200 characters
/// - `endpoints`: at least one
/// - `timeout_seconds`: 1-600
///
/// ### Integration
/// - `poll_interval_ms`: 10-3600000
/// - `agent_id`: 1-100 characters
///
/// ### Context
/// - `max_file_bytes`: at least 1024
/// - `project_listing_depth`: 1-8
///
/// ### Feedback
/// - `recent_limit`: 1-1000
/// - `pending_limit`: 1-100000
/// - `pending_ttl_seconds`: at least 1
///
/// ### Observability
/// - `logging_level`: must be "trace", "debug", "info", "warn", or "error"
pub fn validate(config: &Config) -> Result<(), validator::ValidationErrors> {
    config.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_endpoints() {
        let mut config = Config::default();
        config.providers.endpoints.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_poll_interval_out_of_range() {
        let mut config = Config::default();
        config.integration.poll_interval_ms = 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_logging_level() {
        let mut config = Config::default();
        config.observability.logging_level = "verbose".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_pending_limit() {
        let mut config = Config::default();
        config.feedback.pending_limit = 0;
        assert!(validate(&config).is_err());
    }
}
