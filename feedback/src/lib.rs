//! # Feedback Learner
//!
//! Durable log of generation outcomes and the per-language strategy
//! recommendation derived from it.
//!
//! - [`FeedbackLearner`]: in-memory authoritative set, rewritten to the
//!   store on every mutation
//! - [`JsonFileStore`]: one JSON array on disk, replaced atomically
//! - [`InMemoryStore`]: for tests and ephemeral hosts

pub mod learner;
pub mod store;
pub mod telemetry;

pub use learner::{
    FeedbackDetails, FeedbackLearner, FeedbackStats, NEUTRAL_CONFIDENCE, NEUTRAL_STRATEGY,
    Recommendation
};
pub use store::{FeedbackStore, InMemoryStore, JsonFileStore};
