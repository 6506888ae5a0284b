use async_trait::async_trait;
use errors::StrategyError;
use st_core::{Complexity, GenerationOptions, ModelProvider};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::debug;

use super::{Model, parse_subtasks, with_context};
use crate::strategy::{DIVIDE_AND_CONQUER, Strategy, StrategyInfo};

/// Decompose, solve each part, then integrate.
///
/// Calls the model `subtasks + 2` times. An answer with no recognisable
/// list is treated as a single subtask equal to the whole task.
pub struct DivideAndConquerStrategy {
    info: StrategyInfo,
    model: Model
}

impl DivideAndConquerStrategy {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            info: StrategyInfo::new(
                DIVIDE_AND_CONQUER,
                "Divide and Conquer",
                "Breaks a complex task into subtasks, solves each and integrates the results",
                Complexity::High
            )
            .suitable_for(&["complex systems", "multi-component features", "architecture"])
            .not_suitable_for(&["one-line helpers", "trivial snippets"]),
            model: Model::new(provider, DIVIDE_AND_CONQUER)
        }
    }
}

#[async_trait]
impl Strategy for DivideAndConquerStrategy {
    fn info(&self) -> &StrategyInfo {
        &self.info
    }

    async fn generate(
        &self,
        task: &str,
        language: &str,
        options: &GenerationOptions
    ) -> Result<String, StrategyError> {
        let plan = self
            .model
            .ask(
                format!(
                    "Break the following {language} programming task into a short numbered \
                     list of independent subtasks. Answer with the list only.\n\nTask: {task}"
                ),
                language,
                options
            )
            .await?;

        let mut subtasks = parse_subtasks(&plan);
        if subtasks.is_empty() {
            subtasks.push(task.to_string());
        }
        debug!(strategy = DIVIDE_AND_CONQUER, subtasks = subtasks.len(), "Task decomposed");

        let mut parts = Vec::with_capacity(subtasks.len());
        for (index, subtask) in subtasks.iter().enumerate() {
            let prompt = with_context(
                format!(
                    "Overall task: {task}\n\nWrite {language} code for subtask {} of {}: \
                     {subtask}",
                    index + 1,
                    subtasks.len()
                ),
                options
            );
            parts.push(self.model.ask_code(prompt, language, options).await?);
        }

        let mut integration = format!(
            "Combine the following {language} code fragments into one coherent solution for \
             the task: {task}\nRemove duplication and make sure the pieces fit together.\n"
        );
        for (subtask, code) in subtasks.iter().zip(&parts) {
            let _ = write!(integration, "\n// {subtask}\n```\n{code}\n```\n");
        }

        self.model.ask_code(integration, language, options).await
    }
}
