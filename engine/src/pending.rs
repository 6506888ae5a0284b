use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub(crate) struct PendingGeneration {
    pub task: String,
    pub code: String,
    pub language: String,
    pub strategy_id: String
}

#[derive(Debug)]
struct Entry {
    generation: PendingGeneration,
    created: Instant,
    seq: u64
}

/// Generations awaiting an outcome report, bounded by count and age.
///
/// Expired entries are swept on every insert; when the table is still full
/// the oldest entry makes room.
#[derive(Debug)]
pub(crate) struct PendingTable {
    entries: DashMap<String, Entry>,
    next_seq: AtomicU64,
    limit: usize,
    ttl: Duration
}

impl PendingTable {
    pub fn new(limit: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            next_seq: AtomicU64::new(0),
            limit: limit.max(1),
            ttl
        }
    }

    pub fn insert(&self, id: String, generation: PendingGeneration) {
        self.insert_at(id, generation, Instant::now());
    }

    fn insert_at(&self, id: String, generation: PendingGeneration, now: Instant) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.created) < self.ttl);
        let expired = before.saturating_sub(self.entries.len());
        if expired > 0 {
            debug!(expired, "Dropped expired pending generations");
        }

        while self.entries.len() >= self.limit {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| (entry.created, entry.seq))
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else {
                break;
            };
            self.entries.remove(&oldest);
            debug!(generation_id = %oldest, "Evicted oldest pending generation");
        }

        self.entries.insert(
            id,
            Entry {
                generation,
                created: now,
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed)
            }
        );
    }

    pub fn take(&self, id: &str) -> Option<PendingGeneration> {
        self.entries.remove(id).map(|(_, entry)| entry.generation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
