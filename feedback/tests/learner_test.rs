use feedback::{FeedbackDetails, FeedbackLearner, InMemoryStore, JsonFileStore, Recommendation};
use proptest::prelude::*;
use st_core::FeedbackType;
use std::sync::Arc;

async fn in_memory() -> (Arc<InMemoryStore>, FeedbackLearner) {
    let store = Arc::new(InMemoryStore::new());
    let learner = FeedbackLearner::open(store.clone()).await;
    (store, learner)
}

fn tagged(language: &str, strategy: &str) -> FeedbackDetails {
    FeedbackDetails::new()
        .with_language(language)
        .with_strategy(strategy)
}

#[tokio::test]
async fn test_single_item_stats() {
    let (_store, learner) = in_memory().await;

    let id = learner
        .add_feedback(
            "p",
            "r",
            FeedbackType::Positive,
            FeedbackDetails::new().with_language("ts")
        )
        .await;

    let stats = learner.get_stats().await;
    assert_eq!(stats.total_feedback, 1);
    assert_eq!(stats.positive_feedback, 1);
    assert_eq!(stats.negative_feedback, 0);
    assert_eq!(stats.feedback_by_language.get("ts"), Some(&1));
    assert!(stats.feedback_by_strategy.is_empty());
    assert_eq!(stats.recent_feedback.len(), 1);
    assert_eq!(stats.recent_feedback[0].id, id);
}

#[tokio::test]
async fn test_ids_are_unique_and_retrievable() {
    let (_store, learner) = in_memory().await;

    let first = learner
        .add_feedback("p1", "r1", FeedbackType::Neutral, FeedbackDetails::new())
        .await;
    let second = learner
        .add_feedback(
            "p2",
            "r2",
            FeedbackType::Negative,
            FeedbackDetails::new().with_comments("off by one")
        )
        .await;

    assert_ne!(first, second);
    let item = learner.get_feedback(&second).await.unwrap();
    assert_eq!(item.prompt, "p2");
    assert_eq!(item.comments.as_deref(), Some("off by one"));
    assert!(learner.get_feedback("missing").await.is_none());
}

#[tokio::test]
async fn test_empty_history_gives_neutral_prior() {
    let (_store, learner) = in_memory().await;

    let rec = learner.get_recommendation("anything", "go").await;
    assert_eq!(rec, Recommendation::neutral());
    assert_eq!(rec.strategy, "direct");
    assert_eq!(rec.confidence, 0.5);
}

#[tokio::test]
async fn test_recommendation_prefers_best_ratio() {
    let (_store, learner) = in_memory().await;

    for feedback_type in [FeedbackType::Positive, FeedbackType::Negative] {
        learner
            .add_feedback("p", "r", feedback_type, tagged("python", "direct"))
            .await;
    }
    learner
        .add_feedback("p", "r", FeedbackType::Positive, tagged("python", "example-based"))
        .await;

    let rec = learner.get_recommendation("parse csv", "python").await;
    assert_eq!(rec.strategy, "example-based");
    assert_eq!(rec.confidence, 1.0);
    assert_eq!(rec.sample_size, 3);
}

#[tokio::test]
async fn test_all_negative_history_reports_zero_confidence() {
    let (_store, learner) = in_memory().await;

    learner
        .add_feedback("p", "r", FeedbackType::Negative, tagged("go", "test-driven"))
        .await;
    learner
        .add_feedback("p", "r", FeedbackType::Negative, tagged("go", "direct"))
        .await;

    let rec = learner.get_recommendation("t", "go").await;
    assert_eq!(rec.strategy, "test-driven");
    assert_eq!(rec.confidence, 0.0);
    assert!(!rec.is_informed());
}

#[tokio::test]
async fn test_filters() {
    let (_store, learner) = in_memory().await;

    learner
        .add_feedback("p", "r", FeedbackType::Positive, tagged("rust", "direct"))
        .await;
    learner
        .add_feedback("p", "r", FeedbackType::Negative, tagged("go", "direct"))
        .await;
    learner
        .add_feedback("p", "r", FeedbackType::Positive, tagged("rust", "iterative-refinement"))
        .await;

    assert_eq!(learner.get_feedback_by_type(FeedbackType::Positive).await.len(), 2);
    assert_eq!(learner.get_feedback_by_type(FeedbackType::Neutral).await.len(), 0);
    assert_eq!(learner.get_feedback_by_language("rust").await.len(), 2);
    assert_eq!(learner.get_feedback_by_strategy("direct").await.len(), 2);
    assert_eq!(learner.get_all_feedback().await.len(), 3);
}

#[tokio::test]
async fn test_recent_list_is_limited_and_newest_first() {
    let store = Arc::new(InMemoryStore::new());
    let learner = FeedbackLearner::open(store).await.with_recent_limit(2);

    let mut ids = Vec::new();
    for n in 0..4 {
        ids.push(
            learner
                .add_feedback(&format!("p{n}"), "r", FeedbackType::Neutral, FeedbackDetails::new())
                .await
        );
    }

    let recent = learner.get_stats().await.recent_feedback;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, ids[3]);
    assert_eq!(recent[1].id, ids[2]);
}

#[tokio::test]
async fn test_persistence_failure_keeps_item_in_memory() {
    let (store, learner) = in_memory().await;
    store.set_reject_writes(true);

    let id = learner
        .add_feedback("p", "r", FeedbackType::Positive, FeedbackDetails::new())
        .await;

    assert!(learner.get_feedback(&id).await.is_some());
    assert!(store.saved().await.is_empty());
}

#[tokio::test]
async fn test_every_mutation_rewrites_store() {
    let (store, learner) = in_memory().await;

    learner
        .add_feedback("p", "r", FeedbackType::Positive, FeedbackDetails::new())
        .await;
    learner
        .add_feedback("p", "r", FeedbackType::Negative, FeedbackDetails::new())
        .await;
    assert_eq!(store.saved().await.len(), 2);

    learner.clear_feedback().await;
    assert!(store.saved().await.is_empty());
    assert!(learner.is_empty().await);
}

#[tokio::test]
async fn test_json_file_survives_restart_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feedback.json");

    let learner = FeedbackLearner::open(Arc::new(JsonFileStore::new(&path))).await;
    let id = learner
        .add_feedback("p", "r", FeedbackType::Positive, tagged("rust", "direct"))
        .await;
    drop(learner);

    let reopened = FeedbackLearner::open(Arc::new(JsonFileStore::new(&path))).await;
    assert_eq!(reopened.len().await, 1);
    let item = reopened.get_feedback(&id).await.unwrap();
    assert_eq!(item.language.as_deref(), Some("rust"));

    reopened.clear_feedback().await;
    drop(reopened);

    let cleared = FeedbackLearner::open(Arc::new(JsonFileStore::new(&path))).await;
    assert!(cleared.is_empty().await);
    assert_eq!(cleared.get_stats().await.total_feedback, 0);
}

#[tokio::test]
async fn test_corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feedback.json");
    std::fs::write(&path, "[{ not json").unwrap();

    let learner = FeedbackLearner::open(Arc::new(JsonFileStore::new(&path))).await;
    assert!(learner.is_empty().await);
}

#[tokio::test]
async fn test_from_config_uses_store_path() {
    let dir = tempfile::tempdir().unwrap();
    let config = config::FeedbackConfig {
        store_path: dir.path().join("fb").join("log.json"),
        recent_limit: 3,
        ..config::FeedbackConfig::default()
    };

    let learner = FeedbackLearner::from_config(&config).await;
    learner
        .add_feedback("p", "r", FeedbackType::Neutral, FeedbackDetails::new())
        .await;

    assert!(config.store_path.exists());
}

fn feedback_type() -> impl Strategy<Value = FeedbackType> {
    prop_oneof![
        Just(FeedbackType::Positive),
        Just(FeedbackType::Negative),
        Just(FeedbackType::Neutral),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_type_counts_sum_to_total(types in proptest::collection::vec(feedback_type(), 0..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let stats = runtime.block_on(async {
            let (_store, learner) = in_memory().await;
            for feedback_type in &types {
                learner
                    .add_feedback("p", "r", *feedback_type, FeedbackDetails::new())
                    .await;
            }
            learner.get_stats().await
        });

        prop_assert_eq!(stats.total_feedback, types.len());
        prop_assert_eq!(
            stats.positive_feedback + stats.negative_feedback + stats.neutral_feedback,
            stats.total_feedback
        );
        prop_assert!(stats.recent_feedback.len() <= 10);
    }
}
