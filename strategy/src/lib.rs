//! # Strategy Registry
//!
//! Named code-generation strategies, the keyword heuristic that picks one
//! per request, and the model providers strategies drive.
//!
//! ```rust,no_run
//! use st_core::GenerationOptions;
//! use std::sync::Arc;
//! use strategy::{MockModelProvider, StrategyRegistry};
//!
//! # async fn run() -> Result<(), errors::StrategyError> {
//! let registry = StrategyRegistry::with_builtin(Arc::new(MockModelProvider::new("demo")));
//! let generation = registry
//!     .generate("write unit tests for the parser", "rust", None, &GenerationOptions::new())
//!     .await?;
//! assert_eq!(generation.strategy_id, "test-driven");
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod providers;
pub mod registry;
pub mod selection;
pub mod strategy;
pub mod telemetry;

pub use builtin::{
    DirectStrategy, DivideAndConquerStrategy, ExampleBasedStrategy, IterativeRefinementStrategy,
    TestDrivenStrategy, extract_code
};
pub use providers::{
    MockModelProvider, OllamaProvider, OpenAiCompatibleProvider, provider_from_config
};
pub use registry::{Generation, SelectedBy, StrategyRegistry};
pub use selection::{DEFAULT_RULES, SelectionRule, SelectionTrace};
pub use strategy::{
    DIRECT, DIVIDE_AND_CONQUER, EXAMPLE_BASED, ITERATIVE_REFINEMENT, Strategy, StrategyInfo,
    TEST_DRIVEN
};
