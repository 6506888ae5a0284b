//! # Strata Utilities
//!
//! Common helpers for id generation, path canonicalisation and text
//! handling.

use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Generate UUID v4 string
#[must_use]
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Canonical absolute form of `path`.
///
/// Existing paths resolve symlinks through `std::fs::canonicalize`. For a
/// path that no longer exists (a deleted file reported by a watcher) the
/// deepest existing ancestor is canonicalised and the remaining components
/// are appended lexically, so the result still matches the key the path was
/// cached under while it existed.
#[must_use]
pub fn canonical_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    let normalized = normalize_lexically(&absolute);

    if let Ok(resolved) = std::fs::canonicalize(&normalized) {
        return resolved;
    }

    let mut missing = Vec::new();
    let mut current = normalized.as_path();
    while let Some(parent) = current.parent() {
        if let Some(name) = current.file_name() {
            missing.push(name.to_os_string());
        }
        if let Ok(resolved) = std::fs::canonicalize(parent) {
            let mut rebuilt = resolved;
            for name in missing.iter().rev() {
                rebuilt.push(name);
            }
            return rebuilt;
        }
        current = parent;
    }

    normalized
}

/// Removes `.` and resolves `..` without touching the filesystem.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str())
        }
    }
    out
}

/// True when `path` equals `root` or lies beneath it.
#[must_use]
pub fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Truncate to at most `max_bytes`, never splitting a UTF-8 character.
#[must_use]
pub fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Split `key=value`; surrounding whitespace is trimmed from both halves.
#[must_use]
pub fn split_key_value(pair: &str) -> Option<(&str, &str)> {
    let (key, value) = pair.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uuid_uniqueness() {
        let uuid1 = generate_uuid();
        let uuid2 = generate_uuid();
        assert_ne!(uuid1, uuid2);
    }

    #[test]
    fn test_canonical_path_existing_and_missing_agree() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("src").join("lib.rs");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "fn main() {}").unwrap();

        let while_present = canonical_path(&file);
        std::fs::remove_file(&file).unwrap();
        let after_delete = canonical_path(&file);

        assert_eq!(while_present, after_delete);
        assert!(while_present.is_absolute());
    }

    #[test]
    fn test_canonical_path_resolves_dot_segments() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a");
        std::fs::create_dir_all(&nested).unwrap();

        let dotted = nested.join("..").join(".").join("a");
        assert_eq!(canonical_path(&dotted), canonical_path(&nested));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "héllo";
        assert_eq!(truncate_at_char_boundary(text, 2), "h");
        assert_eq!(truncate_at_char_boundary(text, 3), "hé");
        assert_eq!(truncate_at_char_boundary(text, 100), text);
    }

    #[test]
    fn test_split_key_value() {
        assert_eq!(split_key_value("iterations = 3"), Some(("iterations", "3")));
        assert_eq!(split_key_value("=3"), None);
        assert_eq!(split_key_value("novalue"), None);
    }
}
