//! # Strata Core
//!
//! Shared types and traits for the developer-assistant core.
//!
//! This crate provides:
//! - The data model: context snapshots, feedback items, agent messages
//! - Seam traits for the external capabilities the core drives (symbol
//!   lookup, model providers, inter-agent transport)
//!
//! Nothing here performs I/O; implementations live in the component crates.

pub mod traits;
pub mod types;

pub use traits::{MessageTransport, ModelProvider, SymbolProvider};
pub use types::{
    AgentMessage, CompletionRequest, Complexity, ContextLevel, ContextSnapshot, Dependency,
    FeedbackItem, FeedbackType, GenerationOptions, Symbol, SymbolKind
};
