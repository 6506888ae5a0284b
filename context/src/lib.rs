//! # Context Provider
//!
//! Gathers layered context about the code being worked on: the file itself,
//! its directory, the enclosing project and the workspace.
//!
//! - [`ContextProvider`] resolves and caches [`st_core::ContextSnapshot`]s
//!   keyed by canonical path and level
//! - [`extract_imports`] reads import targets per language family
//! - [`OutlineSymbolProvider`] is the default symbol outline
//! - [`read_dependencies`] inspects project manifests
//! - [`ContextWatcher`] invalidates the cache on filesystem changes

pub mod imports;
pub mod language;
pub mod manifests;
pub mod provider;
pub mod symbols;
pub mod watcher;
pub mod workspace;

pub use imports::extract_imports;
pub use language::{ImportFamily, detect_language};
pub use manifests::{ManifestKind, read_dependencies};
pub use provider::ContextProvider;
pub use symbols::OutlineSymbolProvider;
pub use watcher::ContextWatcher;
pub use workspace::Workspace;
