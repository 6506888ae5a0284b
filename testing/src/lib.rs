//! Shared test fixtures for the Strata workspace.
//!
//! - [`ProjectFixture`]: throwaway project trees on disk
//! - [`ScriptedModelProvider`]: a model provider with queued answers
//! - [`RecordingHandler`]: a message handler that records and can misbehave
//!
//! Only integration tests (`tests/`) should depend on this crate, so the
//! types they see are the same ones the crate under test exports.

mod doubles;
mod fixtures;

pub use doubles::*;
pub use fixtures::*;
use std::sync::atomic::{AtomicU32, Ordering};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}
