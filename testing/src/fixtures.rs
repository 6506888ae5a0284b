use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A project tree in a temporary directory, removed on drop.
///
/// ```rust,no_run
/// use testing::ProjectFixture;
///
/// let project = ProjectFixture::new()
///     .file("Cargo.toml", "[package]\nname = \"demo\"\n")
///     .file("src/lib.rs", "pub fn demo() {}\n");
/// assert!(project.path("src/lib.rs").exists());
/// ```
pub struct ProjectFixture {
    dir: TempDir,
    root: PathBuf
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectFixture {
    pub fn new() -> Self {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => panic!("failed to create temp dir: {e}")
        };
        // Canonical so paths compare equal to what the context provider keys on.
        let root = fs::canonicalize(dir.path()).unwrap_or_else(|_| dir.path().to_path_buf());
        Self { dir, root }
    }

    /// Add a file, creating parent directories.
    #[must_use]
    pub fn file(self, relative: &str, content: &str) -> Self {
        self.write(relative, content);
        self
    }

    #[must_use]
    pub fn dir(self, relative: &str) -> Self {
        if let Err(e) = fs::create_dir_all(self.root.join(relative)) {
            panic!("failed to create {relative}: {e}");
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Write (or overwrite) a file after construction.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                panic!("failed to create {}: {e}", parent.display());
            }
        }
        if let Err(e) = fs::write(&path, content) {
            panic!("failed to write {}: {e}", path.display());
        }
        path
    }

    pub fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(e) = result {
            panic!("failed to remove {}: {e}", path.display());
        }
    }

    /// The underlying temp dir, for APIs that want to own a location inside it.
    pub fn temp_dir(&self) -> &TempDir {
        &self.dir
    }
}
