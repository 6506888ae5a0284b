//! Filesystem watcher that keeps the context cache honest.

use errors::ContextError;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::provider::ContextProvider;

/// Watches every workspace root and invalidates cached context for each
/// created, modified or removed path.
///
/// Watching stops when the handle is dropped or [`ContextWatcher::stop`]
/// is awaited.
pub struct ContextWatcher {
    _watcher: RecommendedWatcher,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>
}

impl ContextWatcher {
    pub fn spawn(provider: Arc<ContextProvider>) -> Result<Self, ContextError> {
        let (event_tx, mut event_rx) = mpsc::channel(256);
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            notify::Config::default()
        )
        .map_err(|e| ContextError::Io {
            path: "<watcher>".to_string(),
            reason: e.to_string()
        })?;

        for root in provider.workspace().roots() {
            watcher
                .watch(root, RecursiveMode::Recursive)
                .map_err(|e| ContextError::Io {
                    path: root.display().to_string(),
                    reason: e.to_string()
                })?;
            info!(root = %root.display(), "Watching workspace root");
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        debug!("Context watcher stopping");
                        break;
                    }
                    event = event_rx.recv() => {
                        let Some(event) = event else {
                            break;
                        };

                        match event {
                            Ok(event) => match event.kind {
                                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                                    for path in &event.paths {
                                        provider.invalidate(path).await;
                                    }
                                }
                                _ => {}
                            },
                            Err(e) => warn!("Watch error: {}", e)
                        }
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            shutdown,
            task
        })
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
