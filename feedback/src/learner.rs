//! The feedback log and the recommendations derived from it.

use chrono::Utc;
use config::FeedbackConfig;
use serde::{Deserialize, Serialize};
use st_core::{FeedbackItem, FeedbackType};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::store::{FeedbackStore, JsonFileStore};
use crate::telemetry::Telemetry;

/// Strategy used when there is no history for a language.
pub const NEUTRAL_STRATEGY: &str = "direct";
/// Confidence reported with the neutral prior.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Optional tags recorded alongside an outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackDetails {
    pub comments: Option<String>,
    pub modifications: Option<String>,
    pub language: Option<String>,
    pub strategy: Option<String>
}

impl FeedbackDetails {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    #[must_use]
    pub fn with_modifications(mut self, modifications: impl Into<String>) -> Self {
        self.modifications = Some(modifications.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackStats {
    pub total_feedback: usize,
    pub positive_feedback: usize,
    pub negative_feedback: usize,
    pub neutral_feedback: usize,
    pub feedback_by_language: BTreeMap<String, usize>,
    pub feedback_by_strategy: BTreeMap<String, usize>,
    /// Most recent first.
    pub recent_feedback: Vec<FeedbackItem>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub strategy: String,
    pub confidence: f64,
    /// Items tagged with the language and a strategy; 0 for the neutral
    /// prior. Language-only items carry no strategy to score.
    pub sample_size: usize
}

impl Recommendation {
    pub fn neutral() -> Self {
        Self {
            strategy: NEUTRAL_STRATEGY.to_string(),
            confidence: NEUTRAL_CONFIDENCE,
            sample_size: 0
        }
    }

    /// Backed by history with a non-zero success ratio.
    pub fn is_informed(&self) -> bool {
        self.sample_size > 0 && self.confidence > 0.0
    }
}

/// Records generation outcomes and recommends strategies per language.
///
/// The in-memory set is authoritative for the life of the process. Every
/// mutation rewrites the whole set through the store; a failed write is
/// logged and the in-memory change is kept.
pub struct FeedbackLearner {
    store: Arc<dyn FeedbackStore>,
    items: RwLock<Vec<FeedbackItem>>,
    recent_limit: usize
}

impl std::fmt::Debug for FeedbackLearner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackLearner")
            .field("store", &self.store.location())
            .field("recent_limit", &self.recent_limit)
            .finish_non_exhaustive()
    }
}

impl FeedbackLearner {
    /// Load whatever the store holds. An unreadable store starts empty.
    pub async fn open(store: Arc<dyn FeedbackStore>) -> Self {
        let items = match store.load().await {
            Ok(items) => {
                info!(store = %store.location(), count = items.len(), "Feedback loaded");
                items
            }
            Err(e) => {
                warn!(store = %store.location(), error = %e, "Feedback store unreadable; starting empty");
                Vec::new()
            }
        };

        Self {
            store,
            items: RwLock::new(items),
            recent_limit: FeedbackConfig::default().recent_limit
        }
    }

    pub async fn from_config(config: &FeedbackConfig) -> Self {
        Self::open(Arc::new(JsonFileStore::new(&config.store_path)))
            .await
            .with_recent_limit(config.recent_limit)
    }

    #[must_use]
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Record an outcome and return its id.
    #[instrument(skip(self, prompt, result, details), fields(language = ?details.language, strategy = ?details.strategy))]
    pub async fn add_feedback(
        &self,
        prompt: &str,
        result: &str,
        feedback_type: FeedbackType,
        details: FeedbackDetails
    ) -> String {
        let item = FeedbackItem {
            id: utils::generate_uuid(),
            timestamp: Utc::now(),
            prompt: prompt.to_string(),
            result: result.to_string(),
            feedback_type,
            comments: details.comments,
            modifications: details.modifications,
            language: details.language,
            strategy: details.strategy
        };
        let id = item.id.clone();

        // Held across the write so saves land in mutation order.
        let mut items = self.items.write().await;
        items.push(item);
        self.persist(&items).await;

        Telemetry::record_feedback(feedback_type);
        debug!(id = %id, %feedback_type, "Feedback recorded");
        id
    }

    /// Remove every item and persist the empty set.
    pub async fn clear_feedback(&self) {
        let mut items = self.items.write().await;
        let removed = items.len();
        items.clear();
        self.persist(&items).await;
        info!(removed, "Feedback cleared");
    }

    async fn persist(&self, items: &[FeedbackItem]) {
        if let Err(e) = self.store.save(items).await {
            Telemetry::record_persist_failure();
            error!(
                store = %self.store.location(),
                error = %e,
                "Failed to persist feedback; keeping in-memory state"
            );
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_feedback(&self, id: &str) -> Option<FeedbackItem> {
        self.items.read().await.iter().find(|i| i.id == id).cloned()
    }

    pub async fn get_all_feedback(&self) -> Vec<FeedbackItem> {
        self.items.read().await.clone()
    }

    pub async fn get_feedback_by_type(&self, feedback_type: FeedbackType) -> Vec<FeedbackItem> {
        self.filtered(|i| i.feedback_type == feedback_type).await
    }

    pub async fn get_feedback_by_language(&self, language: &str) -> Vec<FeedbackItem> {
        self.filtered(|i| i.language.as_deref() == Some(language))
            .await
    }

    pub async fn get_feedback_by_strategy(&self, strategy_id: &str) -> Vec<FeedbackItem> {
        self.filtered(|i| i.strategy.as_deref() == Some(strategy_id))
            .await
    }

    async fn filtered(&self, keep: impl Fn(&FeedbackItem) -> bool) -> Vec<FeedbackItem> {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| keep(item))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn get_stats(&self) -> FeedbackStats {
        let items = self.items.read().await;
        compute_stats(&items, self.recent_limit)
    }

    /// Best strategy for `language` by historical positive ratio.
    pub async fn get_recommendation(&self, _task: &str, language: &str) -> Recommendation {
        let items = self.items.read().await;
        recommend(&items, language)
    }
}

// ============================================================================
// Pure derivations
// ============================================================================

pub(crate) fn compute_stats(items: &[FeedbackItem], recent_limit: usize) -> FeedbackStats {
    let mut stats = FeedbackStats {
        total_feedback: items.len(),
        positive_feedback: 0,
        negative_feedback: 0,
        neutral_feedback: 0,
        feedback_by_language: BTreeMap::new(),
        feedback_by_strategy: BTreeMap::new(),
        recent_feedback: Vec::new()
    };

    for item in items {
        match item.feedback_type {
            FeedbackType::Positive => stats.positive_feedback += 1,
            FeedbackType::Negative => stats.negative_feedback += 1,
            FeedbackType::Neutral => stats.neutral_feedback += 1
        }
        if let Some(language) = &item.language {
            *stats.feedback_by_language.entry(language.clone()).or_default() += 1;
        }
        if let Some(strategy) = &item.strategy {
            *stats.feedback_by_strategy.entry(strategy.clone()).or_default() += 1;
        }
    }

    // Newest insertion first among equal timestamps.
    let mut recent: Vec<&FeedbackItem> = items.iter().rev().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    stats.recent_feedback = recent.into_iter().take(recent_limit).cloned().collect();

    stats
}

pub(crate) fn recommend(items: &[FeedbackItem], language: &str) -> Recommendation {
    // (strategy, positive, total) in first-seen order
    let mut tallies: Vec<(&str, usize, usize)> = Vec::new();
    for item in items.iter().filter(|i| i.language.as_deref() == Some(language)) {
        let Some(strategy) = item.strategy.as_deref() else {
            continue;
        };
        let positive = usize::from(item.feedback_type == FeedbackType::Positive);
        match tallies.iter_mut().find(|(id, _, _)| *id == strategy) {
            Some(tally) => {
                tally.1 += positive;
                tally.2 += 1;
            }
            None => tallies.push((strategy, positive, 1))
        }
    }

    let sample_size = tallies.iter().map(|(_, _, total)| total).sum();
    let mut best: Option<(&str, f64)> = None;
    for (strategy, positive, total) in &tallies {
        let ratio = *positive as f64 / *total as f64;
        if best.is_none_or(|(_, best_ratio)| ratio > best_ratio) {
            best = Some((strategy, ratio));
        }
    }

    match best {
        Some((strategy, confidence)) => Recommendation {
            strategy: strategy.to_string(),
            confidence,
            sample_size
        },
        None => Recommendation::neutral()
    }
}
