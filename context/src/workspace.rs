//! Workspace roots, project-root discovery and directory listings.

use git2::Repository;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::{DirEntry, WalkDir};

use crate::manifests::has_manifest;

/// Directory names never descended into by listings.
const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__"
];

/// The set of root folders the provider may resolve context under.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    roots: Vec<PathBuf>
}

impl Workspace {
    /// Canonicalises every root; roots that do not exist are dropped.
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut canonical: Vec<PathBuf> = Vec::new();
        for root in roots {
            match std::fs::canonicalize(&root) {
                Ok(path) if path.is_dir() => {
                    if !canonical.contains(&path) {
                        canonical.push(path);
                    }
                }
                _ => trace!(root = %root.display(), "Ignoring missing workspace root")
            }
        }
        Self { roots: canonical }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Innermost workspace root containing `path`.
    pub fn containing_root(&self, path: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .filter(|root| utils::is_within(path, root))
            .max_by_key(|root| root.components().count())
            .map(PathBuf::as_path)
    }

    /// Project root enclosing `path`.
    ///
    /// The nearest ancestor (up to and including the workspace root) that
    /// holds a manifest wins; otherwise the git work tree when it lies
    /// inside the workspace root; otherwise the workspace root itself.
    pub fn project_root(&self, path: &Path) -> Option<PathBuf> {
        let root = self.containing_root(path)?;
        let start = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(root)
        };

        for dir in start.ancestors() {
            if !utils::is_within(dir, root) {
                break;
            }
            if has_manifest(dir) {
                return Some(dir.to_path_buf());
            }
        }

        if let Some(git_root) = find_git_root(start) {
            let git_root = utils::canonical_path(&git_root);
            if utils::is_within(&git_root, root) {
                return Some(git_root);
            }
        }

        Some(root.to_path_buf())
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    Repository::discover(start)
        .ok()
        .and_then(|repo| repo.workdir().map(PathBuf::from))
}

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn display_relative(entry: &DirEntry, base: &Path) -> Option<String> {
    let relative = entry.path().strip_prefix(base).ok()?;
    let mut rendered = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if entry.file_type().is_dir() {
        rendered.push('/');
    }
    Some(rendered)
}

/// Sorted immediate children of `dir`; directories carry a trailing `/`.
pub fn list_directory(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|entry| display_relative(&entry, dir))
        .collect()
}

/// Depth-limited listing of a project, skipping build output, VCS data and
/// hidden directories.
pub fn list_project(root: &Path, max_depth: usize) -> Vec<String> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry))
        .filter_map(Result::ok)
        .filter_map(|entry| display_relative(&entry, root))
        .collect()
}
