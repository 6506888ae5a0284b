use async_trait::async_trait;
use errors::StrategyError;
use st_core::{Complexity, GenerationOptions, ModelProvider};
use std::sync::Arc;

use super::{Model, line_comment, with_context};
use crate::strategy::{Strategy, StrategyInfo, TEST_DRIVEN};

/// Tests first, then an implementation written against them. The result
/// carries both, implementation first.
pub struct TestDrivenStrategy {
    info: StrategyInfo,
    model: Model
}

impl TestDrivenStrategy {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            info: StrategyInfo::new(
                TEST_DRIVEN,
                "Test-Driven Development",
                "Writes tests for the task first, then an implementation that passes them",
                Complexity::Medium
            )
            .suitable_for(&["functions with clear contracts", "bug fixes", "library code"])
            .not_suitable_for(&["ui layout", "exploratory prototypes"]),
            model: Model::new(provider, TEST_DRIVEN)
        }
    }
}

#[async_trait]
impl Strategy for TestDrivenStrategy {
    fn info(&self) -> &StrategyInfo {
        &self.info
    }

    async fn generate(
        &self,
        task: &str,
        language: &str,
        options: &GenerationOptions
    ) -> Result<String, StrategyError> {
        let tests = self
            .model
            .ask_code(
                with_context(
                    format!(
                        "Write thorough {language} unit tests for the following task. Cover \
                         edge cases. Do not implement the functionality itself.\n\nTask: {task}"
                    ),
                    options
                ),
                language,
                options
            )
            .await?;

        let implementation = self
            .model
            .ask_code(
                with_context(
                    format!(
                        "Write the {language} implementation for the task below so that every \
                         one of these tests passes.\n\nTask: {task}\n\nTests:\n```\n{tests}\n```"
                    ),
                    options
                ),
                language,
                options
            )
            .await?;

        let comment = line_comment(language);
        Ok(format!("{implementation}\n\n{comment} Tests\n{tests}"))
    }
}
