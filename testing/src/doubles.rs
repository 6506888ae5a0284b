use agent_dispatch::MessageHandler;
use async_trait::async_trait;
use errors::{DispatchError, ProviderError};
use st_core::{AgentMessage, CompletionRequest, ModelProvider};
use std::collections::VecDeque;
use tokio::sync::Mutex;

// ============================================================================
// Model provider
// ============================================================================

enum Scripted {
    Reply(String),
    Fail(String)
}

/// Model provider that answers from a queue.
///
/// Once the queue is empty every request is answered with an echo of its
/// prompt, so tests that only care about call counts need no setup.
pub struct ScriptedModelProvider {
    name: String,
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<CompletionRequest>>
}

impl Default for ScriptedModelProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModelProvider {
    pub fn new() -> Self {
        Self {
            name: "scripted".to_string(),
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new())
        }
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn reply(mut self, text: &str) -> Self {
        self.script
            .get_mut()
            .push_back(Scripted::Reply(text.to_string()));
        self
    }

    #[must_use]
    pub fn fail(mut self, reason: &str) -> Self {
        self.script
            .get_mut()
            .push_back(Scripted::Fail(reason.to_string()));
        self
    }

    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedModelProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().await.push(request.clone());
        match self.script.lock().await.pop_front() {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(reason)) => Err(ProviderError::unavailable(&self.name, reason)),
            None => Ok(format!("echo: {}", request.prompt))
        }
    }
}

// ============================================================================
// Message handler
// ============================================================================

enum Misbehaviour {
    None,
    FailOn(usize),
    PanicOn(usize)
}

/// Records every message it is given; optionally fails or panics on the
/// nth message (1-based).
pub struct RecordingHandler {
    received: Mutex<Vec<AgentMessage>>,
    misbehaviour: Misbehaviour
}

impl Default for RecordingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self {
            received: Mutex::new(Vec::new()),
            misbehaviour: Misbehaviour::None
        }
    }

    pub fn failing_on(nth: usize) -> Self {
        Self {
            misbehaviour: Misbehaviour::FailOn(nth),
            ..Self::new()
        }
    }

    pub fn panicking_on(nth: usize) -> Self {
        Self {
            misbehaviour: Misbehaviour::PanicOn(nth),
            ..Self::new()
        }
    }

    pub async fn received(&self) -> Vec<AgentMessage> {
        self.received.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.received.lock().await.len()
    }
}

#[async_trait]
impl MessageHandler for RecordingHandler {
    async fn handle(&self, message: &AgentMessage) -> Result<(), DispatchError> {
        let seen = {
            let mut received = self.received.lock().await;
            received.push(message.clone());
            received.len()
        };

        match self.misbehaviour {
            Misbehaviour::FailOn(nth) if nth == seen => {
                Err(DispatchError::handler(format!("scripted failure on message {seen}")))
            }
            Misbehaviour::PanicOn(nth) if nth == seen => {
                panic!("scripted panic on message {seen}")
            }
            _ => Ok(())
        }
    }
}
