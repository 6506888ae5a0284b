//! # Configuration Precedence
//!
//! Merges configuration from multiple sources with precedence rules.
//!
//! # Precedence Order
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values (lowest priority)
//!
//! A source only overrides a field when its value differs from the field's
//! default, so a source that leaves a field untouched never resets it.

use crate::config::{
    Config, ContextConfig, FeedbackConfig, IntegrationConfig, ObservabilityConfig, ProviderConfig
};

/// Merge multiple configuration sources with precedence.
///
/// ## Usage
/// ```rust,no_run
/// use config::{Config, merge_configs, load_from_file, load_from_env};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let defaults = Config::default();
///     let from_file = load_from_file(Path::new("strata.toml"))?;
///     let from_env = load_from_env()?;
///
///     let _config = merge_configs(defaults, from_file, "file", from_env, "env", None, "cli");
///     Ok(())
/// }
/// ```
pub fn merge_configs(
    defaults: Config,
    file_config: Config,
    file_source_name: &str,
    env_config: Config,
    env_source_name: &str,
    cli_config: Option<Config>,
    cli_source_name: &str
) -> Config {
    let mut config = defaults;

    config = merge_with_logging(config, file_config, file_source_name);
    config = merge_with_logging(config, env_config, env_source_name);

    if let Some(cli) = cli_config {
        config = merge_with_logging(config, cli, cli_source_name);
    }

    config
}

fn merge_with_logging(mut base: Config, override_config: Config, source_name: &str) -> Config {
    let mut changes = Vec::new();

    merge_providers(&mut base.providers, &override_config.providers, &mut changes);
    merge_integration(
        &mut base.integration,
        &override_config.integration,
        &mut changes
    );
    merge_context(&mut base.context, &override_config.context, &mut changes);
    merge_feedback(&mut base.feedback, &override_config.feedback, &mut changes);
    merge_observability(
        &mut base.observability,
        &override_config.observability,
        &mut changes
    );

    if !changes.is_empty() {
        tracing::info!("Configuration from {}: {:?}", source_name, changes);
    }

    base
}

fn merge_providers(base: &mut ProviderConfig, over: &ProviderConfig, changes: &mut Vec<String>) {
    let defaults = ProviderConfig::default();

    if over.provider != defaults.provider && over.provider != base.provider {
        changes.push(format!("providers.provider = {}", over.provider));
        base.provider.clone_from(&over.provider);
    }
    if over.model != defaults.model && over.model != base.model {
        changes.push(format!("providers.model = {}", over.model));
        base.model.clone_from(&over.model);
    }
    if over.endpoints != defaults.endpoints && over.endpoints != base.endpoints {
        changes.push(format!("providers.endpoints = {:?}", over.endpoints));
        base.endpoints.clone_from(&over.endpoints);
    }
    if over.api_key.is_some() && over.api_key != base.api_key {
        changes.push("providers.api_key = ***".to_string());
        base.api_key.clone_from(&over.api_key);
    }
    if over.timeout_seconds != defaults.timeout_seconds
        && over.timeout_seconds != base.timeout_seconds
    {
        changes.push(format!(
            "providers.timeout_seconds = {}",
            over.timeout_seconds
        ));
        base.timeout_seconds = over.timeout_seconds;
    }
}

fn merge_integration(
    base: &mut IntegrationConfig,
    over: &IntegrationConfig,
    changes: &mut Vec<String>
) {
    let defaults = IntegrationConfig::default();

    if over.enabled != defaults.enabled && over.enabled != base.enabled {
        changes.push(format!("integration.enabled = {}", over.enabled));
        base.enabled = over.enabled;
    }
    if over.shared_context_url.is_some() && over.shared_context_url != base.shared_context_url {
        changes.push(format!(
            "integration.shared_context_url = {:?}",
            over.shared_context_url
        ));
        base.shared_context_url.clone_from(&over.shared_context_url);
    }
    if over.agent_communication_enabled != defaults.agent_communication_enabled
        && over.agent_communication_enabled != base.agent_communication_enabled
    {
        changes.push(format!(
            "integration.agent_communication_enabled = {}",
            over.agent_communication_enabled
        ));
        base.agent_communication_enabled = over.agent_communication_enabled;
    }
    if over.poll_interval_ms != defaults.poll_interval_ms
        && over.poll_interval_ms != base.poll_interval_ms
    {
        changes.push(format!(
            "integration.poll_interval_ms = {}",
            over.poll_interval_ms
        ));
        base.poll_interval_ms = over.poll_interval_ms;
    }
    if over.extensions_dir.is_some() && over.extensions_dir != base.extensions_dir {
        changes.push(format!(
            "integration.extensions_dir = {:?}",
            over.extensions_dir
        ));
        base.extensions_dir.clone_from(&over.extensions_dir);
    }
    if over.agent_id != defaults.agent_id && over.agent_id != base.agent_id {
        changes.push(format!("integration.agent_id = {}", over.agent_id));
        base.agent_id.clone_from(&over.agent_id);
    }
}

fn merge_context(base: &mut ContextConfig, over: &ContextConfig, changes: &mut Vec<String>) {
    let defaults = ContextConfig::default();

    if !over.workspace_roots.is_empty() && over.workspace_roots != base.workspace_roots {
        changes.push(format!(
            "context.workspace_roots = {:?}",
            over.workspace_roots
        ));
        base.workspace_roots.clone_from(&over.workspace_roots);
    }
    if over.watch != defaults.watch && over.watch != base.watch {
        changes.push(format!("context.watch = {}", over.watch));
        base.watch = over.watch;
    }
    if over.max_file_bytes != defaults.max_file_bytes && over.max_file_bytes != base.max_file_bytes
    {
        changes.push(format!("context.max_file_bytes = {}", over.max_file_bytes));
        base.max_file_bytes = over.max_file_bytes;
    }
    if over.project_listing_depth != defaults.project_listing_depth
        && over.project_listing_depth != base.project_listing_depth
    {
        changes.push(format!(
            "context.project_listing_depth = {}",
            over.project_listing_depth
        ));
        base.project_listing_depth = over.project_listing_depth;
    }
}

fn merge_feedback(base: &mut FeedbackConfig, over: &FeedbackConfig, changes: &mut Vec<String>) {
    let defaults = FeedbackConfig::default();

    if over.store_path != defaults.store_path && over.store_path != base.store_path {
        changes.push(format!("feedback.store_path = {}", over.store_path.display()));
        base.store_path.clone_from(&over.store_path);
    }
    if over.recent_limit != defaults.recent_limit && over.recent_limit != base.recent_limit {
        changes.push(format!("feedback.recent_limit = {}", over.recent_limit));
        base.recent_limit = over.recent_limit;
    }
    if over.pending_limit != defaults.pending_limit && over.pending_limit != base.pending_limit {
        changes.push(format!("feedback.pending_limit = {}", over.pending_limit));
        base.pending_limit = over.pending_limit;
    }
    if over.pending_ttl_seconds != defaults.pending_ttl_seconds
        && over.pending_ttl_seconds != base.pending_ttl_seconds
    {
        changes.push(format!(
            "feedback.pending_ttl_seconds = {}",
            over.pending_ttl_seconds
        ));
        base.pending_ttl_seconds = over.pending_ttl_seconds;
    }
}

fn merge_observability(
    base: &mut ObservabilityConfig,
    over: &ObservabilityConfig,
    changes: &mut Vec<String>
) {
    let defaults = ObservabilityConfig::default();

    if over.logging_level != defaults.logging_level && over.logging_level != base.logging_level {
        changes.push(format!(
            "observability.logging_level = {}",
            over.logging_level
        ));
        base.logging_level.clone_from(&over.logging_level);
    }
}
