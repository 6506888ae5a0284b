//! Seams for the external capabilities the core drives.

use async_trait::async_trait;
use errors::{DispatchError, ProviderError};
use std::path::Path;

use crate::types::{AgentMessage, CompletionRequest, Symbol};

/// Symbol lookup for a single document (an editor's outline service, a
/// language server, or a local scanner).
#[async_trait]
pub trait SymbolProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn document_symbols(
        &self,
        path: &Path,
        content: &str,
        language: Option<&str>
    ) -> Result<Vec<Symbol>, ProviderError>;
}

/// Model inference capability used by generation strategies.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Transport between the dispatcher and external collaborating agents.
///
/// The core never implements a network transport itself; hosts inject one.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Hand an outbound message to the transport.
    async fn deliver(&self, message: &AgentMessage) -> Result<(), DispatchError>;

    /// Collect inbound messages received since the last poll.
    async fn poll(&self) -> Result<Vec<AgentMessage>, DispatchError>;
}
