//! Persistence for the feedback log. The whole item set is the unit of
//! persistence: every save rewrites it.

use async_trait::async_trait;
use errors::FeedbackError;
use st_core::FeedbackItem;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Human-readable location, used in logs.
    fn location(&self) -> String;

    async fn load(&self) -> Result<Vec<FeedbackItem>, FeedbackError>;

    async fn save(&self, items: &[FeedbackItem]) -> Result<(), FeedbackError>;
}

// ============================================================================
// JSON file
// ============================================================================

/// A single JSON array on disk, replaced atomically on every save.
///
/// The new content goes to a temporary file in the same directory which is
/// then renamed over the old one, so a crash mid-write leaves the previous
/// document intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn persistence_error(path: &Path, reason: impl ToString) -> FeedbackError {
    FeedbackError::Persistence {
        path: path.display().to_string(),
        reason: reason.to_string()
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), FeedbackError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from(".")
    };
    std::fs::create_dir_all(&dir).map_err(|e| persistence_error(path, e))?;

    let mut staged = tempfile::NamedTempFile::new_in(&dir).map_err(|e| persistence_error(path, e))?;
    staged
        .write_all(bytes)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| persistence_error(path, e))?;
    staged
        .persist(path)
        .map_err(|e| persistence_error(path, e.error))?;
    Ok(())
}

#[async_trait]
impl FeedbackStore for JsonFileStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Vec<FeedbackItem>, FeedbackError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No feedback file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(persistence_error(&self.path, e))
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, items: &[FeedbackItem]) -> Result<(), FeedbackError> {
        let bytes = serde_json::to_vec_pretty(items)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .map_err(|e| persistence_error(&self.path, e))??;
        debug!(path = %self.path.display(), count = items.len(), "Feedback persisted");
        Ok(())
    }
}

// ============================================================================
// In memory
// ============================================================================

/// Process-local store; can be told to reject writes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: Mutex<Vec<FeedbackItem>>,
    reject_writes: AtomicBool
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<FeedbackItem>) -> Self {
        Self {
            items: Mutex::new(items),
            reject_writes: AtomicBool::new(false)
        }
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub async fn saved(&self) -> Vec<FeedbackItem> {
        self.items.lock().await.clone()
    }
}

#[async_trait]
impl FeedbackStore for InMemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<Vec<FeedbackItem>, FeedbackError> {
        Ok(self.items.lock().await.clone())
    }

    async fn save(&self, items: &[FeedbackItem]) -> Result<(), FeedbackError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(FeedbackError::Persistence {
                path: self.location(),
                reason: "writes rejected".to_string()
            });
        }
        *self.items.lock().await = items.to_vec();
        Ok(())
    }
}
