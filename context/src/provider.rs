//! Leveled, cached context resolution.

use config::ContextConfig;
use st_core::{ContextLevel, ContextSnapshot, SymbolProvider};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

use crate::imports::extract_imports;
use crate::language::detect_language;
use crate::manifests::read_dependencies;
use crate::workspace::{Workspace, list_directory, list_project};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    level: ContextLevel,
    path: PathBuf
}

impl CacheKey {
    fn new(level: ContextLevel, path: impl Into<PathBuf>) -> Self {
        Self {
            level,
            path: path.into()
        }
    }
}

/// Cached snapshots. `generation` advances on every full clear.
#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, ContextSnapshot>,
    generation: u64
}

#[derive(Debug, Default)]
struct InFlight {
    computations: usize,
    epoch: u64
}

/// Invalidation epochs for keys with a computation in progress. An entry
/// lives only while at least one computation for its key is running, so the
/// table is bounded by concurrent reads rather than by every path ever
/// invalidated.
#[derive(Debug, Default)]
struct InFlightTable {
    keys: Mutex<HashMap<CacheKey, InFlight>>
}

impl InFlightTable {
    fn begin(&self, key: &CacheKey) -> Ticket<'_> {
        let mut keys = self.keys.lock();
        let slot = keys.entry(key.clone()).or_default();
        slot.computations += 1;
        Ticket {
            table: self,
            key: key.clone(),
            epoch: slot.epoch
        }
    }

    fn bump(&self, key: &CacheKey) {
        if let Some(slot) = self.keys.lock().get_mut(key) {
            slot.epoch += 1;
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.keys.lock().len()
    }
}

/// One running computation. Dropping it, including by cancellation of the
/// reading future, releases the key.
struct Ticket<'a> {
    table: &'a InFlightTable,
    key: CacheKey,
    epoch: u64
}

impl Ticket<'_> {
    fn is_current(&self) -> bool {
        self.table
            .keys
            .lock()
            .get(&self.key)
            .is_some_and(|slot| slot.epoch == self.epoch)
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        let mut keys = self.table.keys.lock();
        if let Some(slot) = keys.get_mut(&self.key) {
            slot.computations = slot.computations.saturating_sub(1);
            if slot.computations == 0 {
                keys.remove(&self.key);
            }
        }
    }
}

/// Supplies file, directory, project and workspace context for the artifact
/// being worked on.
///
/// Snapshots are computed lazily and cached under canonical absolute paths
/// until invalidated. Workspace-level entries are never invalidated by
/// path changes.
pub struct ContextProvider {
    workspace: Arc<Workspace>,
    symbols: Arc<dyn SymbolProvider>,
    max_file_bytes: usize,
    listing_depth: usize,
    cache: RwLock<CacheState>,
    in_flight: InFlightTable,
    active: RwLock<Option<PathBuf>>
}

impl std::fmt::Debug for ContextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextProvider")
            .field("workspace", &self.workspace)
            .field("symbols", &self.symbols.name())
            .field("max_file_bytes", &self.max_file_bytes)
            .field("listing_depth", &self.listing_depth)
            .finish_non_exhaustive()
    }
}

impl ContextProvider {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>, symbols: Arc<dyn SymbolProvider>) -> Self {
        let defaults = ContextConfig::default();
        Self {
            workspace: Arc::new(Workspace::new(roots)),
            symbols,
            max_file_bytes: defaults.max_file_bytes,
            listing_depth: defaults.project_listing_depth,
            cache: RwLock::new(CacheState::default()),
            in_flight: InFlightTable::default(),
            active: RwLock::new(None)
        }
    }

    pub fn from_config(config: &ContextConfig, symbols: Arc<dyn SymbolProvider>) -> Self {
        Self::new(config.resolved_roots(), symbols)
            .with_max_file_bytes(config.max_file_bytes)
            .with_listing_depth(config.project_listing_depth)
    }

    #[must_use]
    pub fn with_max_file_bytes(mut self, max_file_bytes: usize) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    #[must_use]
    pub fn with_listing_depth(mut self, depth: usize) -> Self {
        self.listing_depth = depth.max(1);
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    // ======================================================================
    // Active artifact
    // ======================================================================

    /// Record the artifact currently being worked on. Its FILE entry is
    /// dropped so the next read reflects the editor's view of it.
    pub async fn set_active_artifact(&self, path: Option<&Path>) {
        let canonical = path.map(utils::canonical_path);
        if let Some(file) = &canonical {
            let mut cache = self.cache.write().await;
            self.evict(&mut cache, &CacheKey::new(ContextLevel::File, file.clone()));
        }
        debug!(active = ?canonical, "Active artifact changed");
        *self.active.write().await = canonical;
    }

    pub async fn active_artifact(&self) -> Option<PathBuf> {
        self.active.read().await.clone()
    }

    // ======================================================================
    // Queries
    // ======================================================================

    /// Snapshot at `level` for `path`, or for the active artifact when no
    /// path is given. `None` when the level cannot be resolved.
    #[instrument(skip(self))]
    pub async fn get_context(
        &self,
        level: ContextLevel,
        path: Option<&Path>
    ) -> Option<ContextSnapshot> {
        let key = self.resolve_key(level, path).await?;

        let (generation, ticket) = {
            let cache = self.cache.read().await;
            if let Some(hit) = cache.entries.get(&key) {
                trace!(path = %key.path.display(), "Context cache hit");
                return Some(hit.clone());
            }
            (cache.generation, self.in_flight.begin(&key))
        };

        let snapshot = self.compute(&key).await?;

        let mut cache = self.cache.write().await;
        if cache.generation == generation && ticket.is_current() {
            cache.entries.insert(key, snapshot.clone());
        } else {
            debug!(
                path = %key.path.display(),
                "Context invalidated during computation; result not cached"
            );
        }
        Some(snapshot)
    }

    /// One attempt per level, narrowest first; unresolvable levels are
    /// omitted.
    pub async fn get_all_contexts(&self, path: Option<&Path>) -> Vec<ContextSnapshot> {
        let mut snapshots = Vec::with_capacity(ContextLevel::ALL.len());
        for level in ContextLevel::ALL {
            if let Some(snapshot) = self.get_context(level, path).await {
                snapshots.push(snapshot);
            }
        }
        snapshots
    }

    /// Import targets of the file at `path` (or the active artifact).
    pub async fn get_imports(&self, path: Option<&Path>) -> Vec<String> {
        self.get_context(ContextLevel::File, path)
            .await
            .and_then(|snapshot| snapshot.imports)
            .unwrap_or_default()
    }

    // ======================================================================
    // Invalidation
    // ======================================================================

    /// Drop cached context for `path`, its parent directory and its
    /// enclosing project root. The workspace entry is kept.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn invalidate(&self, path: &Path) {
        let target = utils::canonical_path(path);

        let mut keys = vec![
            CacheKey::new(ContextLevel::File, target.clone()),
            CacheKey::new(ContextLevel::Directory, target.clone()),
            CacheKey::new(ContextLevel::Project, target.clone()),
        ];
        if let Some(parent) = target.parent() {
            keys.push(CacheKey::new(ContextLevel::Directory, parent));
        }
        if let Some(project) = self.project_root(target.clone()).await {
            keys.push(CacheKey::new(ContextLevel::Project, project));
        }

        let mut cache = self.cache.write().await;

        // The project the path was cached under, even if its manifest has
        // since disappeared.
        if let Some(cached_project) = cache
            .entries
            .keys()
            .filter(|key| key.level == ContextLevel::Project && target.starts_with(&key.path))
            .max_by_key(|key| key.path.components().count())
            .cloned()
        {
            keys.push(cached_project);
        }

        let mut removed = 0usize;
        for key in &keys {
            if self.evict(&mut cache, key) {
                removed += 1;
            }
        }
        debug!(removed, "Context invalidated");
    }

    /// Levels cached under exactly `path`.
    pub async fn cached_levels(&self, path: &Path) -> Vec<ContextLevel> {
        let target = utils::canonical_path(path);
        let cache = self.cache.read().await;
        ContextLevel::ALL
            .into_iter()
            .filter(|level| {
                cache
                    .entries
                    .contains_key(&CacheKey::new(*level, target.clone()))
            })
            .collect()
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.read().await.entries.len()
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.entries.clear();
        cache.generation += 1;
    }

    fn evict(&self, cache: &mut CacheState, key: &CacheKey) -> bool {
        self.in_flight.bump(key);
        cache.entries.remove(key).is_some()
    }

    // ======================================================================
    // Resolution
    // ======================================================================

    async fn resolve_key(&self, level: ContextLevel, path: Option<&Path>) -> Option<CacheKey> {
        let target = match path {
            Some(path) => Some(utils::canonical_path(path)),
            None if level == ContextLevel::Workspace => None,
            None => self.active_artifact().await
        };

        match level {
            ContextLevel::File => {
                let file = target.filter(|p| p.is_file())?;
                Some(CacheKey::new(level, file))
            }
            ContextLevel::Directory => {
                let target = target?;
                let dir = if target.is_dir() {
                    target
                } else {
                    target.parent()?.to_path_buf()
                };
                if !dir.is_dir() || self.workspace.containing_root(&dir).is_none() {
                    return None;
                }
                Some(CacheKey::new(level, dir))
            }
            ContextLevel::Project => {
                let target = target.or_else(|| self.workspace.roots().first().cloned())?;
                let project = self.project_root(target).await?;
                Some(CacheKey::new(level, project))
            }
            ContextLevel::Workspace => {
                let root = self.workspace.roots().first()?;
                Some(CacheKey::new(level, root.clone()))
            }
        }
    }

    /// Project root lookup touches the filesystem and may open a git
    /// repository, so it runs on the blocking pool.
    async fn project_root(&self, path: PathBuf) -> Option<PathBuf> {
        let workspace = Arc::clone(&self.workspace);
        run_blocking(move || workspace.project_root(&path)).await.flatten()
    }

    async fn compute(&self, key: &CacheKey) -> Option<ContextSnapshot> {
        match key.level {
            ContextLevel::File => self.file_snapshot(&key.path).await,
            ContextLevel::Directory => {
                let dir = key.path.clone();
                let listing = run_blocking(move || list_directory(&dir)).await?;
                Some(
                    ContextSnapshot::new(ContextLevel::Directory, listing.join("\n"))
                        .with_path(key.path.clone())
                )
            }
            ContextLevel::Project => {
                let root = key.path.clone();
                let depth = self.listing_depth;
                let (listing, dependencies) =
                    run_blocking(move || (list_project(&root, depth), read_dependencies(&root)))
                        .await?;
                Some(
                    ContextSnapshot::new(ContextLevel::Project, listing.join("\n"))
                        .with_path(key.path.clone())
                        .with_dependencies(dependencies)
                )
            }
            ContextLevel::Workspace => {
                let roots = self
                    .workspace
                    .roots()
                    .iter()
                    .map(|root| root.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(ContextSnapshot::new(ContextLevel::Workspace, roots).with_path(key.path.clone()))
            }
        }
    }

    async fn file_snapshot(&self, path: &Path) -> Option<ContextSnapshot> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read file context");
                return None;
            }
        };

        let text = String::from_utf8_lossy(&bytes);
        let content = utils::truncate_at_char_boundary(&text, self.max_file_bytes).to_string();
        let language = detect_language(path);

        let symbols = match self
            .symbols
            .document_symbols(path, &content, language)
            .await
        {
            Ok(symbols) => symbols,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    provider = self.symbols.name(),
                    error = %e,
                    "Symbol provider unavailable; continuing without outline"
                );
                Vec::new()
            }
        };
        let imports = language
            .map(|language| extract_imports(&content, language))
            .unwrap_or_default();

        Some(
            ContextSnapshot::new(ContextLevel::File, content)
                .with_path(path.to_path_buf())
                .with_language(language.map(str::to_string))
                .with_symbols(symbols)
                .with_imports(imports)
        )
    }
}

async fn run_blocking<T, F>(work: F) -> Option<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static
{
    match tokio::task::spawn_blocking(work).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "Blocking context task failed");
            None
        }
    }
}
