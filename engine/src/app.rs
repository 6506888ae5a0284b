use agent_dispatch::{Dispatcher, InMemoryTransport, LoadedModule, PumpHandle};
use config::Config;
use context::{ContextProvider, ContextWatcher, OutlineSymbolProvider};
use errors::EngineError;
use feedback::{FeedbackDetails, FeedbackLearner};
use serde::Serialize;
use st_core::{ContextLevel, ContextSnapshot, FeedbackType, GenerationOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use strategy::{SelectedBy, StrategyRegistry, provider_from_config};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::pending::{PendingGeneration, PendingTable};

/// What a caller gets back from [`Engine::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    /// Handle for [`Engine::report_outcome`].
    pub generation_id: String,
    pub strategy_id: String,
    pub code: String,
    pub language: String,
    pub selected_by: SelectedBy
}

/// Application context holding one instance of every component.
pub struct Engine {
    pub config: Arc<Config>,
    pub context: Arc<ContextProvider>,
    pub strategies: Arc<StrategyRegistry>,
    pub feedback: Arc<FeedbackLearner>,
    pub dispatcher: Arc<Dispatcher>,
    pending: PendingTable,
    watcher: Mutex<Option<ContextWatcher>>,
    pump: Mutex<Option<PumpHandle>>
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("context", &self.context)
            .field("strategies", &self.strategies)
            .field("feedback", &self.feedback)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Build every component from `config`. Only an unusable model
    /// provider is fatal.
    pub async fn bootstrap(config: &Config) -> Result<Self, EngineError> {
        let provider = provider_from_config(&config.providers)?;
        let context = ContextProvider::from_config(&config.context, Arc::new(OutlineSymbolProvider::new()));
        let strategies = StrategyRegistry::with_builtin(provider);
        let feedback = FeedbackLearner::from_config(&config.feedback).await;
        let dispatcher = Dispatcher::from_config(&config.integration, Arc::new(InMemoryTransport::new()));

        let engine = Self::from_parts(config.clone(), context, strategies, feedback, dispatcher);
        info!(
            provider = %config.providers.provider,
            roots = engine.context.workspace().roots().len(),
            strategies = engine.strategies.len(),
            messaging = engine.dispatcher.messaging_enabled(),
            "Engine bootstrapped"
        );
        Ok(engine)
    }

    /// Assemble from prebuilt components (useful for testing).
    pub fn from_parts(
        config: Config,
        context: ContextProvider,
        strategies: StrategyRegistry,
        feedback: FeedbackLearner,
        dispatcher: Dispatcher
    ) -> Self {
        let pending = PendingTable::new(
            config.feedback.pending_limit,
            Duration::from_secs(config.feedback.pending_ttl_seconds)
        );
        Self {
            config: Arc::new(config),
            context: Arc::new(context),
            strategies: Arc::new(strategies),
            feedback: Arc::new(feedback),
            dispatcher: Arc::new(dispatcher),
            pending,
            watcher: Mutex::new(None),
            pump: Mutex::new(None)
        }
    }

    // ========================================================================
    // Background services
    // ========================================================================

    /// Start the workspace watcher and the message pump when configured,
    /// and load capability modules from the extensions directory.
    ///
    /// A watcher that cannot start is logged; the cache then only refreshes
    /// through explicit invalidation.
    pub async fn start_services(&self) -> Vec<LoadedModule> {
        if self.config.context.watch {
            let mut watcher = self.watcher.lock().await;
            if watcher.is_none() {
                match ContextWatcher::spawn(self.context.clone()) {
                    Ok(handle) => *watcher = Some(handle),
                    Err(e) => warn!(error = %e, "Workspace watcher unavailable")
                }
            }
        }

        let mut loaded = Vec::new();
        if self.config.integration.enabled {
            if let Some(dir) = &self.config.integration.extensions_dir {
                loaded = self.dispatcher.discover(dir).await;
            }
        }

        if self.dispatcher.messaging_enabled() {
            let mut pump = self.pump.lock().await;
            if pump.is_none() {
                let interval = self.dispatcher.poll_interval();
                *pump = Some(self.dispatcher.clone().start(interval));
            }
        }

        loaded
    }

    /// Stop background tasks and deactivate capability modules.
    pub async fn shutdown(&self) {
        if let Some(pump) = self.pump.lock().await.take() {
            pump.stop().await;
        }
        if let Some(watcher) = self.watcher.lock().await.take() {
            watcher.stop().await;
        }
        self.dispatcher.deactivate_all().await;
        debug!("Engine shut down");
    }

    // ========================================================================
    // Request surface
    // ========================================================================

    /// Generate code for `task`.
    ///
    /// An explicitly requested strategy wins when registered. Otherwise the
    /// learner's recommendation is used when it is backed by history with a
    /// non-zero success ratio, and the keyword heuristic decides the rest.
    /// The active artifact's FILE context is supplied as `context` unless
    /// the caller already set one.
    #[instrument(skip(self, task, options), fields(strategy = ?strategy_id))]
    pub async fn generate(
        &self,
        task: &str,
        language: &str,
        strategy_id: Option<&str>,
        mut options: GenerationOptions
    ) -> Result<GenerationOutcome, EngineError> {
        if !options.contains("context") {
            if let Some(snapshot) = self.context.get_context(ContextLevel::File, None).await {
                options.insert("context", snapshot.content);
            }
        }

        let explicit = strategy_id.filter(|id| self.strategies.contains(id));
        let generation = match explicit {
            Some(id) => {
                self.strategies
                    .generate(task, language, Some(id), &options)
                    .await?
            }
            None => {
                let recommendation = self.feedback.get_recommendation(task, language).await;
                if recommendation.is_informed() && self.strategies.contains(&recommendation.strategy) {
                    debug!(
                        strategy = %recommendation.strategy,
                        confidence = recommendation.confidence,
                        samples = recommendation.sample_size,
                        "Applying feedback recommendation"
                    );
                    let mut generation = self
                        .strategies
                        .generate(task, language, Some(&recommendation.strategy), &options)
                        .await?;
                    generation.selected_by = SelectedBy::Recommendation;
                    generation
                } else {
                    if let Some(id) = strategy_id {
                        warn!(strategy = id, "Requested strategy not registered");
                    }
                    self.strategies.generate(task, language, None, &options).await?
                }
            }
        };

        let generation_id = utils::generate_uuid();
        self.pending.insert(
            generation_id.clone(),
            PendingGeneration {
                task: task.to_string(),
                code: generation.code.clone(),
                language: language.to_string(),
                strategy_id: generation.strategy_id.clone()
            }
        );

        Ok(GenerationOutcome {
            generation_id,
            strategy_id: generation.strategy_id,
            code: generation.code,
            language: language.to_string(),
            selected_by: generation.selected_by
        })
    }

    /// Record how a generation turned out. Each generation is reported
    /// once; its pending entry is consumed. Entries evicted by the pending
    /// limit or lifetime report as unknown.
    pub async fn report_outcome(
        &self,
        generation_id: &str,
        feedback_type: FeedbackType,
        comments: Option<String>,
        modifications: Option<String>
    ) -> Result<String, EngineError> {
        let pending = self
            .pending
            .take(generation_id)
            .ok_or_else(|| EngineError::UnknownGeneration {
                generation_id: generation_id.to_string()
            })?;

        let details = FeedbackDetails {
            comments,
            modifications,
            language: Some(pending.language),
            strategy: Some(pending.strategy_id)
        };
        Ok(self
            .feedback
            .add_feedback(&pending.task, &pending.code, feedback_type, details)
            .await)
    }

    /// Every resolvable context level for `path` (or the active artifact).
    pub async fn context_for(&self, path: Option<&Path>) -> Vec<ContextSnapshot> {
        self.context.get_all_contexts(path).await
    }

    pub fn pending_generations(&self) -> usize {
        self.pending.len()
    }
}
