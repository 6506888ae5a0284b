//! Message relay between the core and external agents, plus the lifecycle
//! of discovered capability modules.

use async_trait::async_trait;
use config::IntegrationConfig;
use errors::DispatchError;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;
use st_core::{AgentMessage, MessageTransport};
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::modules::{CapabilityModule, HostContext, LoadedModule, ModuleCatalog, ModuleDescriptor};
use crate::telemetry::Telemetry;

/// Receives every message drained by [`Dispatcher::pump`].
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &AgentMessage) -> Result<(), DispatchError>;
}

/// Adapts a synchronous closure into a [`MessageHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F> MessageHandler for FnHandler<F>
where
    F: Fn(&AgentMessage) -> Result<(), DispatchError> + Send + Sync
{
    async fn handle(&self, message: &AgentMessage) -> Result<(), DispatchError> {
        (self.0)(message)
    }
}

pub fn handler_fn<F>(f: F) -> Arc<dyn MessageHandler>
where
    F: Fn(&AgentMessage) -> Result<(), DispatchError> + Send + Sync + 'static
{
    Arc::new(FnHandler(f))
}

/// Outcome of one pump cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PumpReport {
    /// Messages drained from the queue.
    pub messages: usize,
    /// Handler invocations that returned an error or panicked.
    pub failures: usize
}

struct ActiveModule {
    module: Arc<dyn CapabilityModule>,
    loaded: LoadedModule
}

/// Capability dispatcher: discovers modules and relays agent messages.
pub struct Dispatcher {
    agent_id: String,
    messaging_enabled: bool,
    poll_interval: Duration,
    transport: Arc<dyn MessageTransport>,
    catalog: ModuleCatalog,
    modules: RwLock<Vec<ActiveModule>>,
    handlers: RwLock<Vec<Arc<dyn MessageHandler>>>,
    queue: Mutex<VecDeque<AgentMessage>>
}

impl Dispatcher {
    pub fn new(agent_id: impl Into<String>, transport: Arc<dyn MessageTransport>) -> Self {
        let defaults = IntegrationConfig::default();
        Self {
            agent_id: agent_id.into(),
            messaging_enabled: false,
            poll_interval: Duration::from_millis(defaults.poll_interval_ms),
            transport,
            catalog: ModuleCatalog::with_builtin(),
            modules: RwLock::new(Vec::new()),
            handlers: RwLock::new(Vec::new()),
            queue: Mutex::new(VecDeque::new())
        }
    }

    pub fn from_config(config: &IntegrationConfig, transport: Arc<dyn MessageTransport>) -> Self {
        Self::new(config.agent_id.clone(), transport)
            .with_messaging(config.messaging_enabled())
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms))
    }

    #[must_use]
    pub fn with_messaging(mut self, enabled: bool) -> Self {
        self.messaging_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: ModuleCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn messaging_enabled(&self) -> bool {
        self.messaging_enabled
    }

    // ========================================================================
    // Capability modules
    // ========================================================================

    /// Load and activate every enabled module described under `root`.
    ///
    /// Each immediate subdirectory may hold a `capability.toml` or
    /// `capability.yaml`. Unreadable descriptors, unknown kinds and modules
    /// that fail to activate are logged and skipped.
    #[instrument(skip(self, root), fields(root = %root.display()))]
    pub async fn discover(&self, root: &Path) -> Vec<LoadedModule> {
        let scan_root = root.to_path_buf();
        let scanned = match tokio::task::spawn_blocking(move || scan_descriptors(&scan_root)).await {
            Ok(Ok(scanned)) => scanned,
            Ok(Err(e)) => {
                debug!(error = %e, "Extensions root not readable");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Extensions scan task failed");
                return Vec::new();
            }
        };

        let mut loaded = Vec::new();
        for (dir, descriptor_path, descriptor) in scanned {
            let descriptor = match descriptor {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    warn!(path = %descriptor_path.display(), error = %e, "Skipping module descriptor");
                    continue;
                }
            };

            if !descriptor.enabled {
                info!(module = %descriptor.id, "Module disabled; skipping");
                continue;
            }

            if self.is_active(&descriptor.id).await {
                warn!(module = %descriptor.id, "Module already active; skipping duplicate");
                continue;
            }

            match self.activate(&descriptor, &dir).await {
                Ok(module) => loaded.push(module),
                Err(e) => {
                    Telemetry::record_module_activation(&descriptor.kind, "failed");
                    warn!(module = %descriptor.id, error = %e, "Module failed to activate; skipping");
                }
            }
        }

        info!(count = loaded.len(), "Capability modules discovered");
        loaded
    }

    async fn activate(
        &self,
        descriptor: &ModuleDescriptor,
        dir: &Path
    ) -> Result<LoadedModule, DispatchError> {
        let module = self.catalog.create(descriptor)?;
        let host = HostContext {
            agent_id: self.agent_id.clone(),
            module_dir: dir.to_path_buf(),
            settings: descriptor.settings.clone()
        };

        match AssertUnwindSafe(module.activate(&host)).catch_unwind().await {
            Ok(result) => result?,
            Err(_) => {
                return Err(DispatchError::ModuleActivation {
                    module_id: descriptor.id.clone(),
                    reason: "activation panicked".to_string()
                });
            }
        }

        let loaded = LoadedModule {
            id: descriptor.id.clone(),
            kind: descriptor.kind.clone(),
            path: dir.to_path_buf()
        };
        Telemetry::record_module_activation(&descriptor.kind, "activated");
        self.modules.write().await.push(ActiveModule {
            module,
            loaded: loaded.clone()
        });
        Ok(loaded)
    }

    async fn is_active(&self, id: &str) -> bool {
        self.modules
            .read()
            .await
            .iter()
            .any(|active| active.loaded.id == id)
    }

    pub async fn active_modules(&self) -> Vec<LoadedModule> {
        self.modules
            .read()
            .await
            .iter()
            .map(|active| active.loaded.clone())
            .collect()
    }

    /// Deactivate every module, most recently activated first.
    pub async fn deactivate_all(&self) {
        let modules = std::mem::take(&mut *self.modules.write().await);
        for active in modules.into_iter().rev() {
            if let Err(e) = active.module.deactivate().await {
                warn!(module = %active.loaded.id, error = %e, "Module failed to deactivate");
            }
        }
    }

    // ========================================================================
    // Messaging
    // ========================================================================

    /// Send `content` to agent `to`; returns the message id.
    pub async fn send(
        &self,
        to: &str,
        content: &str,
        metadata: Option<HashMap<String, Value>>
    ) -> Result<String, DispatchError> {
        if !self.messaging_enabled {
            return Err(DispatchError::IntegrationDisabled {
                feature: "agent_communication".to_string()
            });
        }

        let message = AgentMessage::new(&self.agent_id, to, content).with_metadata(metadata);
        self.transport.deliver(&message).await?;

        Telemetry::record_relayed("outbound");
        debug!(id = %message.id, to = %to, "Message sent");
        Ok(message.id)
    }

    pub async fn register_handler(&self, handler: Arc<dyn MessageHandler>) {
        self.handlers.write().await.push(handler);
    }

    pub async fn handler_count(&self) -> usize {
        self.handlers.read().await.len()
    }

    /// Queue an inbound message for the next pump cycle.
    pub async fn enqueue(&self, message: AgentMessage) {
        self.queue.lock().await.push_back(message);
    }

    pub async fn queued(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Run one relay cycle.
    ///
    /// Pulls from the transport (when messaging is enabled), then hands
    /// every queued message, in arrival order, to every handler. A handler
    /// error or panic is logged and counted; it never stops the cycle.
    #[instrument(skip(self))]
    pub async fn pump(&self) -> PumpReport {
        if self.messaging_enabled {
            match self.transport.poll().await {
                Ok(inbound) if !inbound.is_empty() => {
                    for _ in &inbound {
                        Telemetry::record_relayed("inbound");
                    }
                    self.queue.lock().await.extend(inbound);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Transport poll failed")
            }
        }

        let batch: Vec<AgentMessage> = self.queue.lock().await.drain(..).collect();
        if batch.is_empty() {
            return PumpReport::default();
        }

        let handlers = self.handlers.read().await.clone();
        let mut report = PumpReport {
            messages: batch.len(),
            failures: 0
        };

        for message in &batch {
            for handler in &handlers {
                match AssertUnwindSafe(handler.handle(message)).catch_unwind().await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        report.failures += 1;
                        Telemetry::record_handler_failure("error");
                        warn!(message_id = %message.id, error = %e, "Message handler failed");
                    }
                    Err(_) => {
                        report.failures += 1;
                        Telemetry::record_handler_failure("panic");
                        error!(message_id = %message.id, "Message handler panicked");
                    }
                }
            }
        }

        debug!(messages = report.messages, failures = report.failures, "Pump cycle complete");
        report
    }

    /// Pump on a fixed cadence until the returned handle is stopped.
    pub fn start(self: Arc<Self>, interval: Duration) -> PumpHandle {
        let (shutdown, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = pump_ticker(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.pump().await;
                    }
                    _ = rx.changed() => {
                        if *rx.borrow() {
                            info!("Dispatcher pump shutting down");
                            break;
                        }
                    }
                }
            }
        });

        PumpHandle { shutdown, task }
    }
}

type ScannedModule = (PathBuf, PathBuf, Result<ModuleDescriptor, DispatchError>);

/// Descriptors under each immediate subdirectory of `root`, sorted by
/// directory. Directories without a descriptor are left out.
fn scan_descriptors(root: &Path) -> std::io::Result<Vec<ScannedModule>> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    Ok(dirs
        .into_iter()
        .filter_map(|dir| {
            let descriptor_path = ModuleDescriptor::find_in(&dir)?;
            let descriptor = ModuleDescriptor::load(&descriptor_path);
            Some((dir, descriptor_path, descriptor))
        })
        .collect())
}

/// A slow cycle delays the next one instead of triggering catch-up bursts.
fn pump_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Stop handle for a running pump loop.
pub struct PumpHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>
}

impl PumpHandle {
    /// Signal the loop and wait for the in-flight cycle to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Dispatcher pump task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
