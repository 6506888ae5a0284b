use async_trait::async_trait;
use errors::DispatchError;
use st_core::{AgentMessage, MessageTransport};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Process-local transport: outbound messages are kept for inspection and
/// inbound messages are whatever was pushed since the last poll.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    outbox: Mutex<Vec<AgentMessage>>,
    inbox: Mutex<VecDeque<AgentMessage>>
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `message` available to the next poll.
    pub async fn push_inbound(&self, message: AgentMessage) {
        self.inbox.lock().await.push_back(message);
    }

    /// Messages handed to the transport so far, oldest first.
    pub async fn delivered(&self) -> Vec<AgentMessage> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl MessageTransport for InMemoryTransport {
    async fn deliver(&self, message: &AgentMessage) -> Result<(), DispatchError> {
        self.outbox.lock().await.push(message.clone());
        Ok(())
    }

    async fn poll(&self) -> Result<Vec<AgentMessage>, DispatchError> {
        Ok(self.inbox.lock().await.drain(..).collect())
    }
}
