//! # Environment Variable Loader
//!
//! Loads configuration from environment variables following 12-factor app
//! principles.
//!
//! # Naming Convention
//! Every variable carries the `STRATA_` prefix. Unset or unparsable values
//! fall back to the field's default.

use crate::config::{
    Config, ContextConfig, FeedbackConfig, IntegrationConfig, ObservabilityConfig, ProviderConfig,
    default_agent_id, default_context_watch, default_endpoints, default_feedback_store_path,
    default_logging_level, default_max_file_bytes, default_model, default_poll_interval_ms,
    default_project_listing_depth, default_provider, default_provider_timeout,
    default_pending_limit, default_pending_ttl_seconds, default_recent_limit
};
use std::env;
use std::path::PathBuf;

/// Load configuration from environment variables.
///
/// ## Environment Variables
/// ### Model provider
/// - `STRATA_MODEL_PROVIDER`: openai/ollama/mock (default: "mock")
/// - `STRATA_MODEL`: model identifier (default: "gpt-4o-mini")
/// - `STRATA_PROVIDER_URLS`: comma-separated endpoint base URLs
/// - `STRATA_API_KEY`: provider credential
/// - `STRATA_PROVIDER_TIMEOUT_SECONDS`: request timeout (default: 60)
///
/// ### Integration
/// - `STRATA_INTEGRATION_ENABLED`: true/false (default: false)
/// - `STRATA_SHARED_CONTEXT_URL`: shared context store URL
/// - `STRATA_AGENT_COMMUNICATION_ENABLED`: true/false (default: false)
/// - `STRATA_POLL_INTERVAL_MS`: dispatcher cadence (default: 5000)
/// - `STRATA_EXTENSIONS_DIR`: capability module root
/// - `STRATA_AGENT_ID`: sender id on outbound messages (default: "strata")
///
/// ### Context
/// - `STRATA_WORKSPACE_ROOTS`: platform path-list of workspace roots
/// - `STRATA_CONTEXT_WATCH`: true/false (default: true)
/// - `STRATA_MAX_FILE_BYTES`: FILE snapshot size cap (default: 1048576)
///
/// ### Feedback
/// - `STRATA_FEEDBACK_PATH`: feedback document (default: ".strata/feedback.json")
/// - `STRATA_RECENT_LIMIT`: items in the stats "recent" list (default: 10)
/// - `STRATA_PENDING_LIMIT`: unreported generations kept (default: 1000)
/// - `STRATA_PENDING_TTL_SECONDS`: unreported generation lifetime (default: 3600)
///
/// ### Observability
/// - `STRATA_LOG_LEVEL`: trace/debug/info/warn/error (default: "info")
pub fn load_from_env() -> Result<Config, Box<dyn std::error::Error>> {
    let config = Config {
        providers: load_providers_from_env()?,
        integration: load_integration_from_env()?,
        context: load_context_from_env()?,
        feedback: load_feedback_from_env()?,
        observability: load_observability_from_env()?
    };

    Ok(config)
}

fn load_providers_from_env() -> Result<ProviderConfig, Box<dyn std::error::Error>> {
    let endpoints = env::var("STRATA_PROVIDER_URLS")
        .ok()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|urls| !urls.is_empty())
        .unwrap_or_else(default_endpoints);

    Ok(ProviderConfig {
        provider: env::var("STRATA_MODEL_PROVIDER").unwrap_or_else(|_| default_provider()),
        model: env::var("STRATA_MODEL").unwrap_or_else(|_| default_model()),
        endpoints,
        api_key: env::var("STRATA_API_KEY").ok().filter(|k| !k.is_empty()),
        timeout_seconds: parse_env("STRATA_PROVIDER_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| default_provider_timeout())
    })
}

fn load_integration_from_env() -> Result<IntegrationConfig, Box<dyn std::error::Error>> {
    Ok(IntegrationConfig {
        enabled: parse_bool_env("STRATA_INTEGRATION_ENABLED").unwrap_or(false),
        shared_context_url: env::var("STRATA_SHARED_CONTEXT_URL").ok(),
        agent_communication_enabled: parse_bool_env("STRATA_AGENT_COMMUNICATION_ENABLED")
            .unwrap_or(false),
        poll_interval_ms: parse_env("STRATA_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| default_poll_interval_ms()),
        extensions_dir: env::var_os("STRATA_EXTENSIONS_DIR").map(PathBuf::from),
        agent_id: env::var("STRATA_AGENT_ID").unwrap_or_else(|_| default_agent_id())
    })
}

fn load_context_from_env() -> Result<ContextConfig, Box<dyn std::error::Error>> {
    let workspace_roots = env::var_os("STRATA_WORKSPACE_ROOTS")
        .map(|raw| env::split_paths(&raw).collect())
        .unwrap_or_default();

    Ok(ContextConfig {
        workspace_roots,
        watch: parse_bool_env("STRATA_CONTEXT_WATCH").unwrap_or_else(default_context_watch),
        max_file_bytes: parse_env("STRATA_MAX_FILE_BYTES")
            .unwrap_or_else(|_| default_max_file_bytes()),
        project_listing_depth: default_project_listing_depth()
    })
}

fn load_feedback_from_env() -> Result<FeedbackConfig, Box<dyn std::error::Error>> {
    Ok(FeedbackConfig {
        store_path: env::var_os("STRATA_FEEDBACK_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_feedback_store_path),
        recent_limit: parse_env("STRATA_RECENT_LIMIT").unwrap_or_else(|_| default_recent_limit()),
        pending_limit: parse_env("STRATA_PENDING_LIMIT").unwrap_or_else(|_| default_pending_limit()),
        pending_ttl_seconds: parse_env("STRATA_PENDING_TTL_SECONDS")
            .unwrap_or_else(|_| default_pending_ttl_seconds())
    })
}

fn load_observability_from_env() -> Result<ObservabilityConfig, Box<dyn std::error::Error>> {
    Ok(ObservabilityConfig {
        logging_level: env::var("STRATA_LOG_LEVEL")
            .map(|level| level.to_lowercase())
            .unwrap_or_else(|_| default_logging_level())
    })
}

fn parse_env<T>(key: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static
{
    match env::var(key) {
        Ok(s) => s
            .trim()
            .parse::<T>()
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>),
        Err(e) => Err(Box::new(e) as Box<dyn std::error::Error>)
    }
}

fn parse_bool_env(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|value| matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_from_env_defaults() {
        unsafe {
            env::remove_var("STRATA_MODEL_PROVIDER");
            env::remove_var("STRATA_PROVIDER_URLS");
            env::remove_var("STRATA_POLL_INTERVAL_MS");
        }

        let config = load_from_env().unwrap();
        assert_eq!(config.providers.provider, "mock");
        assert_eq!(config.providers.endpoints, default_endpoints());
        assert_eq!(config.integration.poll_interval_ms, 5000);
    }

    #[test]
    #[serial]
    fn test_load_providers_from_env() {
        unsafe {
            env::set_var("STRATA_MODEL_PROVIDER", "ollama");
            env::set_var("STRATA_MODEL", "codellama");
            env::set_var(
                "STRATA_PROVIDER_URLS",
                "http://gpu-1:11434, http://gpu-2:11434,"
            );
            env::set_var("STRATA_PROVIDER_TIMEOUT_SECONDS", "abc");
        }

        let providers = load_providers_from_env().unwrap();
        assert_eq!(providers.provider, "ollama");
        assert_eq!(providers.model, "codellama");
        assert_eq!(
            providers.endpoints,
            vec!["http://gpu-1:11434".to_string(), "http://gpu-2:11434".to_string()]
        );
        assert_eq!(providers.timeout_seconds, 60);

        unsafe {
            env::remove_var("STRATA_MODEL_PROVIDER");
            env::remove_var("STRATA_MODEL");
            env::remove_var("STRATA_PROVIDER_URLS");
            env::remove_var("STRATA_PROVIDER_TIMEOUT_SECONDS");
        }
    }

    #[test]
    #[serial]
    fn test_load_integration_from_env() {
        unsafe {
            env::set_var("STRATA_INTEGRATION_ENABLED", "1");
            env::set_var("STRATA_AGENT_COMMUNICATION_ENABLED", "TRUE");
            env::set_var("STRATA_POLL_INTERVAL_MS", "250");
        }

        let integration = load_integration_from_env().unwrap();
        assert!(integration.enabled);
        assert!(integration.messaging_enabled());
        assert_eq!(integration.poll_interval_ms, 250);

        unsafe {
            env::remove_var("STRATA_INTEGRATION_ENABLED");
            env::remove_var("STRATA_AGENT_COMMUNICATION_ENABLED");
            env::remove_var("STRATA_POLL_INTERVAL_MS");
        }
    }
}
