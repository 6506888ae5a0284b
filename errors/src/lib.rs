//! # Strata Errors
//!
//! Error taxonomy shared by every layer of the assistant core.
//!
//! - Uses `thiserror` for structured error definitions with named fields
//! - Each enum exposes a stable `error_code()` for the request surface
//! - Recovery policy lives with the caller: context and provider failures
//!   degrade locally, generation failures propagate, persistence failures
//!   are logged and swallowed

use serde::Serialize;
use thiserror::Error;

/// Context resolution errors.
///
/// `Unresolved` is the "no active artifact / no workspace root" case and is
/// never fatal; the provider turns it into an absent snapshot.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Context unresolved: {reason}")]
    Unresolved { reason: String },

    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse manifest {manifest}: {reason}")]
    ManifestParse { manifest: String, reason: String }
}

impl ContextError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ContextError::Unresolved { .. } => "CONTEXT_UNRESOLVED",
            ContextError::Io { .. } => "CONTEXT_IO",
            ContextError::ManifestParse { .. } => "MANIFEST_PARSE"
        }
    }

    pub fn unresolved(reason: impl Into<String>) -> Self {
        ContextError::Unresolved {
            reason: reason.into()
        }
    }
}

/// Symbol-lookup and model-provider errors.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {provider} - {reason}")]
    Unavailable { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider not configured: {provider}")]
    NotConfigured { provider: String }
}

impl ProviderError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ProviderError::Unavailable { .. } => "PROVIDER_UNAVAILABLE",
            ProviderError::InvalidResponse { .. } => "PROVIDER_INVALID_RESPONSE",
            ProviderError::NotConfigured { .. } => "PROVIDER_NOT_CONFIGURED"
        }
    }

    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            provider: provider.into(),
            reason: reason.into()
        }
    }
}

/// Strategy execution errors.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Generation failed in strategy {strategy_id}: {reason}")]
    GenerationFailed { strategy_id: String, reason: String },

    #[error("No strategy available: {reason}")]
    NoStrategyAvailable { reason: String }
}

impl StrategyError {
    pub fn error_code(&self) -> &'static str {
        match self {
            StrategyError::GenerationFailed { .. } => "GENERATION_FAILED",
            StrategyError::NoStrategyAvailable { .. } => "NO_STRATEGY_AVAILABLE"
        }
    }

    /// The id of the strategy that failed, when there was one.
    pub fn strategy_id(&self) -> Option<&str> {
        match self {
            StrategyError::GenerationFailed { strategy_id, .. } => Some(strategy_id),
            StrategyError::NoStrategyAvailable { .. } => None
        }
    }

    pub fn generation_failed(strategy_id: impl Into<String>, reason: impl ToString) -> Self {
        StrategyError::GenerationFailed {
            strategy_id: strategy_id.into(),
            reason: reason.to_string()
        }
    }
}

/// Feedback log errors.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Persistence to {path} failed: {reason}")]
    Persistence { path: String, reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    #[error("Feedback item not found: {id}")]
    NotFound { id: String }
}

impl FeedbackError {
    pub fn error_code(&self) -> &'static str {
        match self {
            FeedbackError::Persistence { .. } => "PERSISTENCE_ERROR",
            FeedbackError::Serialization { .. } => "SERIALIZATION_ERROR",
            FeedbackError::NotFound { .. } => "FEEDBACK_NOT_FOUND"
        }
    }
}

impl From<serde_json::Error> for FeedbackError {
    fn from(err: serde_json::Error) -> Self {
        FeedbackError::Serialization {
            reason: err.to_string()
        }
    }
}

/// Capability dispatcher errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Integration disabled: {feature}")]
    IntegrationDisabled { feature: String },

    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Module {module_id} failed to activate: {reason}")]
    ModuleActivation { module_id: String, reason: String },

    #[error("Invalid module descriptor {path}: {reason}")]
    InvalidManifest { path: String, reason: String },

    #[error("Message handler failed: {reason}")]
    Handler { reason: String }
}

impl DispatchError {
    pub fn error_code(&self) -> &'static str {
        match self {
            DispatchError::IntegrationDisabled { .. } => "INTEGRATION_DISABLED",
            DispatchError::Transport { .. } => "TRANSPORT_ERROR",
            DispatchError::ModuleActivation { .. } => "MODULE_ACTIVATION_FAILED",
            DispatchError::InvalidManifest { .. } => "INVALID_MODULE_DESCRIPTOR",
            DispatchError::Handler { .. } => "HANDLER_FAILED"
        }
    }

    pub fn handler(reason: impl Into<String>) -> Self {
        DispatchError::Handler {
            reason: reason.into()
        }
    }
}

/// Errors surfaced by the request surface of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Feedback(#[from] FeedbackError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Unknown generation: {generation_id}")]
    UnknownGeneration { generation_id: String }
}

impl EngineError {
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::Strategy(e) => e.error_code(),
            EngineError::Feedback(e) => e.error_code(),
            EngineError::Dispatch(e) => e.error_code(),
            EngineError::Provider(e) => e.error_code(),
            EngineError::UnknownGeneration { .. } => "UNKNOWN_GENERATION"
        }
    }

    /// Structured body for callers that render errors (CLI `--json`).
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code().to_string(),
            message: self.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String
}
