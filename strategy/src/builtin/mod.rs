//! The five strategies shipped with the registry. Each one drives an
//! injected [`ModelProvider`] with its own prompting scheme.

mod direct;
mod divide;
mod example;
mod iterative;
mod test_driven;

pub use direct::DirectStrategy;
pub use divide::DivideAndConquerStrategy;
pub use example::ExampleBasedStrategy;
pub use iterative::IterativeRefinementStrategy;
pub use test_driven::TestDrivenStrategy;

use errors::StrategyError;
use regex::Regex;
use st_core::{CompletionRequest, GenerationOptions, ModelProvider};
use std::sync::{Arc, LazyLock};

use crate::strategy::Strategy;

/// All built-ins, `direct` first.
pub fn all(provider: &Arc<dyn ModelProvider>) -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(DirectStrategy::new(provider.clone())),
        Arc::new(DivideAndConquerStrategy::new(provider.clone())),
        Arc::new(TestDrivenStrategy::new(provider.clone())),
        Arc::new(ExampleBasedStrategy::new(provider.clone())),
        Arc::new(IterativeRefinementStrategy::new(provider.clone())),
    ]
}

static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```[\w+#.-]*[ \t]*\r?\n(.*?)```").ok());

static LIST_ITEM: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*(?:\d+[.)]|[-*])\s+(.+?)\s*$").ok());

const MAX_SUBTASKS: usize = 8;

/// Model access bound to the strategy on whose behalf it is called, so
/// provider failures come back tagged with that strategy's id.
#[derive(Clone)]
pub(crate) struct Model {
    provider: Arc<dyn ModelProvider>,
    strategy_id: &'static str
}

impl Model {
    pub(crate) fn new(provider: Arc<dyn ModelProvider>, strategy_id: &'static str) -> Self {
        Self {
            provider,
            strategy_id
        }
    }

    /// Raw completion text.
    pub(crate) async fn ask(
        &self,
        prompt: String,
        language: &str,
        options: &GenerationOptions
    ) -> Result<String, StrategyError> {
        let request = CompletionRequest::new(prompt)
            .with_system(system_prompt(language))
            .tuned_by(options);

        self.provider
            .complete(&request)
            .await
            .map_err(|e| StrategyError::generation_failed(self.strategy_id, e))
    }

    /// Completion reduced to its first fenced code block; empty output is
    /// an error.
    pub(crate) async fn ask_code(
        &self,
        prompt: String,
        language: &str,
        options: &GenerationOptions
    ) -> Result<String, StrategyError> {
        let raw = self.ask(prompt, language, options).await?;
        let code = extract_code(&raw);
        if code.trim().is_empty() {
            return Err(StrategyError::generation_failed(
                self.strategy_id,
                "model returned an empty response"
            ));
        }
        Ok(code)
    }
}

fn system_prompt(language: &str) -> String {
    format!(
        "You are an expert {language} developer. Answer with idiomatic, complete {language} code \
         and no commentary outside code comments."
    )
}

/// Appends the surrounding-code context from `options`, if present.
pub(crate) fn with_context(mut prompt: String, options: &GenerationOptions) -> String {
    if let Some(context) = options.context() {
        prompt.push_str("\n\nSurrounding code for reference:\n```\n");
        prompt.push_str(context);
        prompt.push_str("\n```");
    }
    prompt
}

/// First fenced code block of `response`, or the whole response trimmed.
pub fn extract_code(response: &str) -> String {
    FENCED_BLOCK
        .as_ref()
        .and_then(|re| re.captures(response))
        .and_then(|caps| caps.get(1))
        .map_or_else(
            || response.trim().to_string(),
            |block| block.as_str().trim_end().to_string()
        )
}

/// Numbered or bulleted items of a decomposition answer.
pub(crate) fn parse_subtasks(text: &str) -> Vec<String> {
    let Some(re) = LIST_ITEM.as_ref() else {
        return Vec::new();
    };
    text.lines()
        .filter_map(|line| re.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|item| item.as_str().to_string())
        .filter(|item| !item.is_empty())
        .take(MAX_SUBTASKS)
        .collect()
}

pub(crate) fn line_comment(language: &str) -> &'static str {
    match language {
        "python" | "ruby" | "shell" | "bash" | "r" | "perl" | "yaml" | "toml" => "#",
        "sql" | "haskell" | "lua" => "--",
        _ => "//"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_code_prefers_fenced_block() {
        let response = "Here you go:\n```rust\nfn main() {}\n```\nEnjoy.";
        assert_eq!(extract_code(response), "fn main() {}");
        assert_eq!(extract_code("  plain text \n"), "plain text");
        assert_eq!(extract_code("```\nx = 1\n```"), "x = 1");
    }

    #[test]
    fn test_parse_subtasks() {
        let text = "Plan:\n1. Parse input\n2) Validate\n- Render output\nThat is all.";
        assert_eq!(
            parse_subtasks(text),
            vec!["Parse input", "Validate", "Render output"]
        );
    }

    #[test]
    fn test_parse_subtasks_is_capped() {
        let text = (1..=20).map(|i| format!("{i}. step {i}\n")).collect::<String>();
        assert_eq!(parse_subtasks(&text).len(), MAX_SUBTASKS);
    }

    #[test]
    fn test_with_context() {
        let options = GenerationOptions::new().with("context", "struct User;");
        let prompt = with_context("Task".to_string(), &options);
        assert!(prompt.contains("struct User;"));
        assert_eq!(
            with_context("Task".to_string(), &GenerationOptions::new()),
            "Task"
        );
    }
}
