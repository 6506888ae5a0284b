//! Per-invocation state shared by every command.

use config::Config;
use engine::Engine;
use errors::EngineError;
use feedback::FeedbackLearner;

pub struct Session {
    pub config: Config,
    pub json: bool
}

impl Session {
    pub fn new(config: Config, json: bool) -> Self {
        Self { config, json }
    }

    /// Engine for a single command. Nothing outlives the process, so the
    /// workspace watcher stays off.
    pub async fn engine(&self) -> Result<Engine, EngineError> {
        let mut config = self.config.clone();
        config.context.watch = false;
        Engine::bootstrap(&config).await
    }

    pub async fn learner(&self) -> FeedbackLearner {
        FeedbackLearner::from_config(&self.config.feedback).await
    }
}
