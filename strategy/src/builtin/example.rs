use async_trait::async_trait;
use errors::StrategyError;
use st_core::{Complexity, GenerationOptions, ModelProvider};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

use super::{Model, with_context};
use crate::strategy::{EXAMPLE_BASED, Strategy, StrategyInfo};

/// Few-shot prompting from `options.examples`.
pub struct ExampleBasedStrategy {
    info: StrategyInfo,
    model: Model
}

impl ExampleBasedStrategy {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            info: StrategyInfo::new(
                EXAMPLE_BASED,
                "Example-Based Generation",
                "Generates code that follows the style and structure of supplied examples",
                Complexity::Medium
            )
            .suitable_for(&["code following existing patterns", "repetitive variants"])
            .not_suitable_for(&["novel algorithms", "tasks without examples"]),
            model: Model::new(provider, EXAMPLE_BASED)
        }
    }
}

#[async_trait]
impl Strategy for ExampleBasedStrategy {
    fn info(&self) -> &StrategyInfo {
        &self.info
    }

    async fn generate(
        &self,
        task: &str,
        language: &str,
        options: &GenerationOptions
    ) -> Result<String, StrategyError> {
        let examples = options.examples();
        debug!(strategy = EXAMPLE_BASED, examples = examples.len(), "Generating");

        let mut prompt = String::new();
        if examples.is_empty() {
            let _ = writeln!(
                prompt,
                "No examples were supplied; follow common {language} conventions."
            );
        } else {
            let _ = writeln!(prompt, "Follow the style and structure of these examples.");
            for (index, example) in examples.iter().enumerate() {
                let _ = write!(prompt, "\nExample {}:\n```\n{example}\n```\n", index + 1);
            }
        }
        let _ = write!(prompt, "\nNow write {language} code for: {task}");

        self.model
            .ask_code(with_context(prompt, options), language, options)
            .await
    }
}
