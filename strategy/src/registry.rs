//! Catalogue of generation strategies and per-request selection.

use errors::StrategyError;
use parking_lot::RwLock;
use serde::Serialize;
use st_core::{GenerationOptions, ModelProvider};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::builtin;
use crate::selection::{DEFAULT_RULES, SelectionRule, SelectionTrace, trace_selection};
use crate::strategy::{DIRECT, Strategy, StrategyInfo};
use crate::telemetry::Telemetry;

/// How the strategy for a generation was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectedBy {
    /// The caller named a registered strategy.
    Explicit,
    /// The feedback learner's recommendation was applied.
    Recommendation,
    /// Keyword heuristic (or its `direct` fallback).
    Heuristic
}

impl SelectedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectedBy::Explicit => "explicit",
            SelectedBy::Recommendation => "recommendation",
            SelectedBy::Heuristic => "heuristic"
        }
    }
}

/// Result of [`StrategyRegistry::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    pub strategy_id: String,
    pub code: String,
    pub selected_by: SelectedBy
}

/// Strategies keyed by id. Ids are unique; registering an existing id
/// replaces the earlier strategy in place.
pub struct StrategyRegistry {
    strategies: RwLock<Vec<Arc<dyn Strategy>>>,
    rules: Vec<SelectionRule>
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.ids())
            .field("rules", &self.rules)
            .finish()
    }
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: RwLock::new(Vec::new()),
            rules: DEFAULT_RULES.to_vec()
        }
    }

    /// Registry holding the five built-in strategies, all driving `provider`.
    pub fn with_builtin(provider: Arc<dyn ModelProvider>) -> Self {
        let registry = Self::new();
        for strategy in builtin::all(&provider) {
            registry.register(strategy);
        }
        info!(provider = provider.name(), count = registry.len(), "Built-in strategies registered");
        registry
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Vec<SelectionRule>) -> Self {
        self.rules = rules;
        self
    }

    // ========================================================================
    // Catalogue
    // ========================================================================

    pub fn register(&self, strategy: Arc<dyn Strategy>) {
        let mut strategies = self.strategies.write();
        if let Some(existing) = strategies.iter_mut().find(|s| s.id() == strategy.id()) {
            debug!(strategy = strategy.id(), "Replacing registered strategy");
            *existing = strategy;
        } else {
            debug!(strategy = strategy.id(), "Registering strategy");
            strategies.push(strategy);
        }
    }

    /// Returns false when no strategy had that id.
    pub fn unregister(&self, id: &str) -> bool {
        let mut strategies = self.strategies.write();
        let before = strategies.len();
        strategies.retain(|s| s.id() != id);
        before != strategies.len()
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.read().iter().find(|s| s.id() == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.strategies.read().iter().any(|s| s.id() == id)
    }

    pub fn list(&self) -> Vec<Arc<dyn Strategy>> {
        self.strategies.read().clone()
    }

    pub fn infos(&self) -> Vec<StrategyInfo> {
        self.strategies
            .read()
            .iter()
            .map(|s| s.info().clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.strategies
            .read()
            .iter()
            .map(|s| s.id().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.read().is_empty()
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Which rule fires for `task` and what it resolves to right now.
    pub fn selection_trace(&self, task: &str, language: &str) -> SelectionTrace {
        let trace = trace_selection(&self.rules, task, |id| self.contains(id));
        debug!(
            language,
            rule = ?trace.rule,
            selected = %trace.selected,
            fell_back = trace.fell_back,
            "Strategy selected"
        );
        trace
    }

    /// Heuristic pick for `task`.
    ///
    /// Fails only when neither the preferred strategy nor `direct` is
    /// registered.
    pub fn select(&self, task: &str, language: &str) -> Result<Arc<dyn Strategy>, StrategyError> {
        let trace = self.selection_trace(task, language);
        self.get(&trace.selected)
            .ok_or_else(|| StrategyError::NoStrategyAvailable {
                reason: format!("'{}' is not registered", trace.selected)
            })
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Generate with `strategy_id` when it is registered, otherwise with
    /// the heuristic pick. An unknown id is never an error.
    #[instrument(skip(self, task, options), fields(strategy = ?strategy_id))]
    pub async fn generate(
        &self,
        task: &str,
        language: &str,
        strategy_id: Option<&str>,
        options: &GenerationOptions
    ) -> Result<Generation, StrategyError> {
        let explicit = strategy_id.and_then(|id| {
            let found = self.get(id);
            if found.is_none() {
                warn!(strategy = id, "Requested strategy not registered; using heuristic");
            }
            found
        });

        let (strategy, selected_by) = match explicit {
            Some(strategy) => (strategy, SelectedBy::Explicit),
            None => (self.select(task, language)?, SelectedBy::Heuristic)
        };
        let id = strategy.id().to_string();

        match strategy.generate(task, language, options).await {
            Ok(code) => {
                Telemetry::record_generation(&id, selected_by.as_str());
                info!(strategy = %id, language, selected_by = selected_by.as_str(), "Generation complete");
                Ok(Generation {
                    strategy_id: id,
                    code,
                    selected_by
                })
            }
            Err(e) => {
                Telemetry::record_generation_failure(&id);
                warn!(strategy = %id, error = %e, "Generation failed");
                if matches!(e, StrategyError::GenerationFailed { .. }) {
                    Err(e)
                } else {
                    Err(StrategyError::generation_failed(&id, e))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockModelProvider;
    use crate::strategy::{ITERATIVE_REFINEMENT, TEST_DRIVEN};

    fn registry() -> StrategyRegistry {
        StrategyRegistry::with_builtin(Arc::new(MockModelProvider::new("mock")))
    }

    #[test]
    fn test_builtin_catalogue() {
        let registry = registry();
        assert_eq!(
            registry.ids(),
            vec![
                "direct",
                "divide-and-conquer",
                "test-driven",
                "example-based",
                "iterative-refinement"
            ]
        );
    }

    #[test]
    fn test_select_documented_cases() {
        let registry = registry();
        let pick = |task: &str| registry.select(task, "python").unwrap().id().to_string();
        assert_eq!(
            pick("optimize this sorting algorithm for performance"),
            ITERATIVE_REFINEMENT
        );
        assert_eq!(pick("write unit tests for this function"), TEST_DRIVEN);
        assert_eq!(pick("hello world function"), DIRECT);
    }

    #[test]
    fn test_unregister() {
        let registry = registry();
        assert!(registry.unregister(TEST_DRIVEN));
        assert!(!registry.unregister(TEST_DRIVEN));
        assert_eq!(
            registry.select("verify input", "go").unwrap().id(),
            DIRECT
        );
    }

    #[test]
    fn test_empty_registry_has_no_strategy() {
        let registry = StrategyRegistry::new();
        assert!(matches!(
            registry.select("anything", "rust"),
            Err(StrategyError::NoStrategyAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_strategy_id_falls_back_to_heuristic() {
        let registry = registry();
        let generation = registry
            .generate(
                "improve performance of the cache",
                "rust",
                Some("no-such-strategy"),
                &GenerationOptions::new()
            )
            .await
            .unwrap();
        assert_eq!(generation.strategy_id, ITERATIVE_REFINEMENT);
        assert_eq!(generation.selected_by, SelectedBy::Heuristic);
    }
}
