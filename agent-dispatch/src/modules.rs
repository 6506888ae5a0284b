//! Capability modules: compiled-in extensions selected and configured by
//! descriptor files under an extensions root.

use async_trait::async_trait;
use errors::DispatchError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Descriptor file names looked up in each module directory, in order.
pub const DESCRIPTOR_FILES: &[&str] = &["capability.toml", "capability.yaml", "capability.yml"];

/// What a module gets to see of its host when activated.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub agent_id: String,
    pub module_dir: PathBuf,
    pub settings: serde_json::Value
}

/// A pluggable unit extending the core with commands or integrations.
#[async_trait]
pub trait CapabilityModule: Send + Sync {
    fn id(&self) -> &str;

    async fn activate(&self, host: &HostContext) -> Result<(), DispatchError>;

    async fn deactivate(&self) -> Result<(), DispatchError>;
}

/// Contents of a `capability.toml` / `capability.yaml` descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleDescriptor {
    pub id: String,
    pub kind: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub settings: serde_json::Value
}

fn default_enabled() -> bool {
    true
}

impl ModuleDescriptor {
    /// Parse a descriptor, choosing the format from the file extension.
    pub fn load(path: &Path) -> Result<Self, DispatchError> {
        let invalid = |reason: String| DispatchError::InvalidManifest {
            path: path.display().to_string(),
            reason
        };

        let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let descriptor: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| invalid(e.to_string()))?,
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?
            }
            other => return Err(invalid(format!("unsupported descriptor format {other:?}")))
        };

        if descriptor.id.trim().is_empty() {
            return Err(invalid("module id must not be empty".to_string()));
        }
        Ok(descriptor)
    }

    /// First descriptor file present in `dir`.
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        DESCRIPTOR_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }
}

pub type ModuleFactory =
    Arc<dyn Fn(&ModuleDescriptor) -> Result<Arc<dyn CapabilityModule>, DispatchError> + Send + Sync>;

/// Factories for the module kinds this build knows how to instantiate.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    factories: HashMap<String, ModuleFactory>
}

impl std::fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the module kinds shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(PassiveModule::KIND, |descriptor| {
            Ok(Arc::new(PassiveModule::new(&descriptor.id)) as Arc<dyn CapabilityModule>)
        });
        catalog
    }

    pub fn register<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&ModuleDescriptor) -> Result<Arc<dyn CapabilityModule>, DispatchError>
            + Send
            + Sync
            + 'static
    {
        self.factories.insert(kind.to_string(), Arc::new(factory));
    }

    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<_> = self.factories.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn create(
        &self,
        descriptor: &ModuleDescriptor
    ) -> Result<Arc<dyn CapabilityModule>, DispatchError> {
        let factory =
            self.factories
                .get(&descriptor.kind)
                .ok_or_else(|| DispatchError::ModuleActivation {
                    module_id: descriptor.id.clone(),
                    reason: format!("unknown module kind '{}'", descriptor.kind)
                })?;
        factory(descriptor)
    }
}

/// Module that only announces itself; used to declare integrations that
/// need no behaviour of their own.
#[derive(Debug)]
pub struct PassiveModule {
    id: String
}

impl PassiveModule {
    pub const KIND: &'static str = "passive";

    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

#[async_trait]
impl CapabilityModule for PassiveModule {
    fn id(&self) -> &str {
        &self.id
    }

    async fn activate(&self, host: &HostContext) -> Result<(), DispatchError> {
        info!(module = %self.id, dir = %host.module_dir.display(), "Passive module active");
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// A module that passed discovery and activation.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedModule {
    pub id: String,
    pub kind: String,
    pub path: PathBuf
}
