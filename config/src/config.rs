//! # Configuration Structures
//!
//! This module defines all configuration structures for the Strata core.
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Default every field, so an empty file is a valid configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Main configuration structure.
///
/// ## Fields
/// - `providers`: model-provider selection, endpoints and credentials
/// - `integration`: capability modules and inter-agent messaging
/// - `context`: workspace roots and context-provider tuning
/// - `feedback`: feedback log location
/// - `observability`: log verbosity
///
/// ## Validation
/// All nested configurations must pass their own validation rules.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    /// Model provider configuration
    #[serde(default)]
    #[validate(nested)]
    pub providers: ProviderConfig,

    /// Capability modules and agent communication
    #[serde(default)]
    #[validate(nested)]
    pub integration: IntegrationConfig,

    /// Context provider configuration
    #[serde(default)]
    #[validate(nested)]
    pub context: ContextConfig,

    /// Feedback log configuration
    #[serde(default)]
    #[validate(nested)]
    pub feedback: FeedbackConfig,

    /// Observability configuration (logging)
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig
}

/// Model provider configuration.
///
/// ## Fields
/// - `provider`: "openai" (any chat-completions compatible endpoint),
///   "ollama" or "mock" (default: "mock")
/// - `model`: model identifier passed to the provider
/// - `endpoints`: base URLs, tried in order until one answers
/// - `api_key`: bearer credential; never serialized back out
/// - `timeout_seconds`: per-request timeout (1-600, default: 60)
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ProviderConfig {
    #[serde(default = "default_provider")]
    #[validate(custom(function = "validate_provider"))]
    pub provider: String,

    #[serde(default = "default_model")]
    #[validate(length(min = 1, max = 200))]
    pub model: String,

    #[serde(default = "default_endpoints")]
    #[validate(length(min = 1))]
    pub endpoints: Vec<String>,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_provider_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub timeout_seconds: u64
}

pub(crate) fn default_provider() -> String {
    "mock".to_string()
}

pub(crate) fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

pub(crate) fn default_endpoints() -> Vec<String> {
    vec!["https://api.openai.com/v1".to_string()]
}

pub(crate) fn default_provider_timeout() -> u64 {
    60
}

fn validate_provider(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "openai" | "ollama" | "mock" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid model provider"))
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            endpoints: default_endpoints(),
            api_key: None,
            timeout_seconds: default_provider_timeout()
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoints", &self.endpoints)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Capability modules and inter-agent communication.
///
/// ## Fields
/// - `enabled`: master switch for integrations (default: false)
/// - `shared_context_url`: URL of a shared context store, if any
/// - `agent_communication_enabled`: allow relaying agent messages (default:
///   false)
/// - `poll_interval_ms`: dispatcher pump cadence (default: 5000)
/// - `extensions_dir`: root scanned for capability module descriptors
/// - `agent_id`: sender name stamped on outbound messages
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct IntegrationConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub shared_context_url: Option<String>,

    #[serde(default)]
    pub agent_communication_enabled: bool,

    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 10, max = 3_600_000))]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub extensions_dir: Option<PathBuf>,

    #[serde(default = "default_agent_id")]
    #[validate(length(min = 1, max = 100))]
    pub agent_id: String
}

pub(crate) fn default_poll_interval_ms() -> u64 {
    5000
}

pub(crate) fn default_agent_id() -> String {
    "strata".to_string()
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            shared_context_url: None,
            agent_communication_enabled: false,
            poll_interval_ms: default_poll_interval_ms(),
            extensions_dir: None,
            agent_id: default_agent_id()
        }
    }
}

impl IntegrationConfig {
    /// Messaging needs both the integration switch and its own flag.
    pub fn messaging_enabled(&self) -> bool {
        self.enabled && self.agent_communication_enabled
    }
}

/// Context provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ContextConfig {
    /// Workspace root folders; empty means the current directory
    #[serde(default)]
    pub workspace_roots: Vec<PathBuf>,

    /// Watch workspace roots and invalidate cached context on change
    #[serde(default = "default_context_watch")]
    pub watch: bool,

    /// FILE snapshots are truncated beyond this size
    #[serde(default = "default_max_file_bytes")]
    #[validate(range(min = 1024))]
    pub max_file_bytes: usize,

    /// Depth of the PROJECT level listing
    #[serde(default = "default_project_listing_depth")]
    #[validate(range(min = 1, max = 8))]
    pub project_listing_depth: usize
}

pub(crate) fn default_context_watch() -> bool {
    true
}

pub(crate) fn default_max_file_bytes() -> usize {
    1024 * 1024
}

pub(crate) fn default_project_listing_depth() -> usize {
    2
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            workspace_roots: Vec::new(),
            watch: default_context_watch(),
            max_file_bytes: default_max_file_bytes(),
            project_listing_depth: default_project_listing_depth()
        }
    }
}

impl ContextConfig {
    /// Configured roots, or the current directory when none are set.
    pub fn resolved_roots(&self) -> Vec<PathBuf> {
        if self.workspace_roots.is_empty() {
            vec![std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))]
        } else {
            self.workspace_roots.clone()
        }
    }
}

/// Feedback log configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct FeedbackConfig {
    /// JSON document holding the full feedback array
    #[serde(default = "default_feedback_store_path")]
    pub store_path: PathBuf,

    /// Number of items reported as "recent" in stats
    #[serde(default = "default_recent_limit")]
    #[validate(range(min = 1, max = 1000))]
    pub recent_limit: usize,

    /// Unreported generations kept for a later outcome report
    #[serde(default = "default_pending_limit")]
    #[validate(range(min = 1, max = 100_000))]
    pub pending_limit: usize,

    /// Age after which an unreported generation is dropped
    #[serde(default = "default_pending_ttl_seconds")]
    #[validate(range(min = 1))]
    pub pending_ttl_seconds: u64
}

pub(crate) fn default_feedback_store_path() -> PathBuf {
    PathBuf::from(".strata").join("feedback.json")
}

pub(crate) fn default_recent_limit() -> usize {
    10
}

pub(crate) fn default_pending_limit() -> usize {
    1000
}

pub(crate) fn default_pending_ttl_seconds() -> u64 {
    3600
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            store_path: default_feedback_store_path(),
            recent_limit: default_recent_limit(),
            pending_limit: default_pending_limit(),
            pending_ttl_seconds: default_pending_ttl_seconds()
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    /// Logging level
    #[serde(default = "default_logging_level")]
    #[validate(custom(function = "validate_logging_level"))]
    pub logging_level: String
}

pub(crate) fn default_logging_level() -> String {
    "info".to_string()
}

fn validate_logging_level(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid logging level"))
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            logging_level: default_logging_level()
        }
    }
}
