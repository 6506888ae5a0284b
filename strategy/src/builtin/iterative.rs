use async_trait::async_trait;
use errors::StrategyError;
use st_core::{Complexity, GenerationOptions, ModelProvider};
use std::sync::Arc;
use tracing::debug;

use super::{Model, with_context};
use crate::strategy::{ITERATIVE_REFINEMENT, Strategy, StrategyInfo};

pub const DEFAULT_ITERATIONS: u64 = 2;
pub const MAX_ITERATIONS: u64 = 5;

/// A first draft followed by `options.iterations` refinement rounds.
pub struct IterativeRefinementStrategy {
    info: StrategyInfo,
    model: Model
}

impl IterativeRefinementStrategy {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            info: StrategyInfo::new(
                ITERATIVE_REFINEMENT,
                "Iterative Refinement",
                "Produces a draft and repeatedly improves it for correctness and performance",
                Complexity::Medium
            )
            .suitable_for(&["performance tuning", "refactoring", "quality improvements"])
            .not_suitable_for(&["latency-sensitive requests"]),
            model: Model::new(provider, ITERATIVE_REFINEMENT)
        }
    }

    pub fn iterations(options: &GenerationOptions) -> u64 {
        options
            .get_u64("iterations")
            .unwrap_or(DEFAULT_ITERATIONS)
            .min(MAX_ITERATIONS)
    }
}

#[async_trait]
impl Strategy for IterativeRefinementStrategy {
    fn info(&self) -> &StrategyInfo {
        &self.info
    }

    async fn generate(
        &self,
        task: &str,
        language: &str,
        options: &GenerationOptions
    ) -> Result<String, StrategyError> {
        let mut code = self
            .model
            .ask_code(
                with_context(
                    format!("Write a first {language} implementation for: {task}"),
                    options
                ),
                language,
                options
            )
            .await?;

        let rounds = Self::iterations(options);
        for round in 1..=rounds {
            debug!(strategy = ITERATIVE_REFINEMENT, round, rounds, "Refining");
            code = self
                .model
                .ask_code(
                    format!(
                        "Improve this {language} code for the task \"{task}\". Fix bugs, improve \
                         performance and readability, and keep behaviour intact. Return the full \
                         improved code.\n\n```\n{code}\n```"
                    ),
                    language,
                    options
                )
                .await?;
        }

        Ok(code)
    }
}
