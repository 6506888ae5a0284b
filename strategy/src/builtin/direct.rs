use async_trait::async_trait;
use errors::StrategyError;
use st_core::{Complexity, GenerationOptions, ModelProvider};
use std::sync::Arc;
use tracing::debug;

use super::{Model, with_context};
use crate::strategy::{DIRECT, Strategy, StrategyInfo};

/// One prompt, one answer.
pub struct DirectStrategy {
    info: StrategyInfo,
    model: Model
}

impl DirectStrategy {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            info: StrategyInfo::new(
                DIRECT,
                "Direct Generation",
                "Generates code from the task description in a single step",
                Complexity::Low
            )
            .suitable_for(&["simple functions", "small utilities", "boilerplate"])
            .not_suitable_for(&["multi-component systems", "performance-critical code"]),
            model: Model::new(provider, DIRECT)
        }
    }
}

#[async_trait]
impl Strategy for DirectStrategy {
    fn info(&self) -> &StrategyInfo {
        &self.info
    }

    async fn generate(
        &self,
        task: &str,
        language: &str,
        options: &GenerationOptions
    ) -> Result<String, StrategyError> {
        debug!(strategy = DIRECT, language, "Generating");
        let prompt = with_context(
            format!("Write {language} code for the following task:\n{task}"),
            options
        );
        self.model.ask_code(prompt, language, options).await
    }
}
