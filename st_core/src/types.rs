use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use strum::{Display, EnumString};

// ============================================================================
// Context
// ============================================================================

/// Granularity of a context snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ContextLevel {
    File,
    Directory,
    Project,
    Workspace
}

impl ContextLevel {
    /// All levels, narrowest first.
    pub const ALL: [ContextLevel; 4] = [
        ContextLevel::File,
        ContextLevel::Directory,
        ContextLevel::Project,
        ContextLevel::Workspace
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Struct,
    Enum,
    Trait,
    Interface,
    Module,
    Type,
    Constant
}

/// One entry in a file's symbol outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// 1-based line of the declaration.
    pub line: usize
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, line: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            line
        }
    }
}

/// A dependency declared in a project manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Manifest file the dependency was declared in (e.g. `Cargo.toml`).
    pub manifest: String,
    #[serde(default)]
    pub dev: bool
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: Option<String>, manifest: &str) -> Self {
        Self {
            name: name.into(),
            version,
            manifest: manifest.to_string(),
            dev: false
        }
    }

    pub fn dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }
}

/// Context at one level of the file → directory → project → workspace
/// hierarchy.
///
/// `content` is the file text for FILE snapshots and a newline-joined
/// listing of child paths for every other level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub level: ContextLevel,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<Symbol>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<Dependency>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imports: Option<Vec<String>>
}

impl ContextSnapshot {
    pub fn new(level: ContextLevel, content: impl Into<String>) -> Self {
        Self {
            level,
            content: content.into(),
            path: None,
            language: None,
            symbols: None,
            dependencies: None,
            imports: None
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn with_symbols(mut self, symbols: Vec<Symbol>) -> Self {
        self.symbols = Some(symbols);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<Dependency>) -> Self {
        self.dependencies = Some(dependencies);
        self
    }

    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = Some(imports);
        self
    }
}

// ============================================================================
// Strategies
// ============================================================================

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumString,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High
}

/// Free-form options passed to a strategy's generation step.
///
/// Recognised keys: `context`, `examples`, `iterations`, `temperature`,
/// `max_tokens`. Unknown keys are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationOptions(Map<String, Value>);

impl GenerationOptions {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        })
    }

    /// Surrounding-code context to ground the generation, if any.
    pub fn context(&self) -> Option<&str> {
        self.get_str("context").filter(|s| !s.trim().is_empty())
    }

    /// Worked examples; accepts a single string or an array of strings.
    pub fn examples(&self) -> Vec<String> {
        match self.0.get("examples") {
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new()
        }
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for GenerationOptions {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A single prompt sent to a model provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            temperature: None,
            max_tokens: None
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Copies `temperature` and `max_tokens` from generation options.
    pub fn tuned_by(mut self, options: &GenerationOptions) -> Self {
        self.temperature = options.get_f64("temperature").map(|t| t as f32);
        self.max_tokens = options
            .get_u64("max_tokens")
            .and_then(|t| u32::try_from(t).ok());
        self
    }
}

// ============================================================================
// Feedback
// ============================================================================

/// Outcome classification of a past generation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FeedbackType {
    Positive,
    Negative,
    Neutral
}

/// A recorded outcome of a past generation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackItem {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub result: String,
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>
}

// ============================================================================
// Inter-agent messaging
// ============================================================================

/// Envelope relayed between the core and an external collaborating agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>
}

impl AgentMessage {
    /// New envelope with a fresh id, stamped now.
    pub fn new(from: impl Into<String>, to: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: utils::generate_uuid(),
            from: from.into(),
            to: to.into(),
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None
        }
    }

    pub fn with_metadata(mut self, metadata: Option<HashMap<String, Value>>) -> Self {
        self.metadata = metadata;
        self
    }
}
