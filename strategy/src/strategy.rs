use async_trait::async_trait;
use errors::StrategyError;
use serde::{Deserialize, Serialize};
use st_core::{Complexity, GenerationOptions};

pub const DIRECT: &str = "direct";
pub const DIVIDE_AND_CONQUER: &str = "divide-and-conquer";
pub const TEST_DRIVEN: &str = "test-driven";
pub const EXAMPLE_BASED: &str = "example-based";
pub const ITERATIVE_REFINEMENT: &str = "iterative-refinement";

/// Descriptive metadata shared by every strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub suitable_for: Vec<String>,
    pub not_suitable_for: Vec<String>,
    pub complexity: Complexity
}

impl StrategyInfo {
    pub fn new(id: &str, name: &str, description: &str, complexity: Complexity) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            suitable_for: Vec::new(),
            not_suitable_for: Vec::new(),
            complexity
        }
    }

    pub fn suitable_for(mut self, tags: &[&str]) -> Self {
        self.suitable_for = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }

    pub fn not_suitable_for(mut self, tags: &[&str]) -> Self {
        self.not_suitable_for = tags.iter().map(|t| (*t).to_string()).collect();
        self
    }
}

/// A named approach to turning a task description into code.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn info(&self) -> &StrategyInfo;

    fn id(&self) -> &str {
        &self.info().id
    }

    async fn generate(
        &self,
        task: &str,
        language: &str,
        options: &GenerationOptions
    ) -> Result<String, StrategyError>;
}
