//! Source provider abstraction for filesystem-independent loading.
//!
//! The [`SourceProvider`] trait abstracts file I/O so the loader can be
//! driven from memory in tests and from tools that never touch disk.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Trait that abstracts file I/O for the loader.
///
/// Implementations provide source text reading, include resolution, and
/// path canonicalization. The default [`FileSystemProvider`] delegates to
/// `std::fs`; [`InMemoryProvider`] serves files from a map.
pub trait SourceProvider {
    /// Read the source text for a given path.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// Resolve an include path against the directory of the including file.
    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf;

    /// Canonicalize a path. Two paths naming the same file must
    /// canonicalize to the same value; a missing file is an error.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error>;
}

/// Default filesystem-backed source provider.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }

    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf {
        base.join(include)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        path.canonicalize()
    }
}

/// In-memory source provider, mapping paths to source text.
///
/// Canonicalization normalizes `.` and `..` without touching the
/// filesystem.
#[derive(Default)]
pub struct InMemoryProvider {
    files: HashMap<PathBuf, String>,
}

impl InMemoryProvider {
    pub fn new(files: HashMap<PathBuf, String>) -> Self {
        let files = files
            .into_iter()
            .map(|(p, src)| (Self::normalize_path(&p), src))
            .collect();
        Self { files }
    }

    /// Add or replace one file.
    pub fn with_file(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.files
            .insert(Self::normalize_path(path.as_ref()), source.into());
        self
    }

    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !components.is_empty() {
                        components.pop();
                    }
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }

    fn not_found(path: &Path) -> std::io::Error {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("file not found in memory: {}", path.display()),
        )
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = Self::normalize_path(path);
        self.files
            .get(&normalized)
            .cloned()
            .ok_or_else(|| Self::not_found(&normalized))
    }

    fn resolve_include(&self, base: &Path, include: &str) -> PathBuf {
        Self::normalize_path(&base.join(include))
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, std::io::Error> {
        let normalized = Self::normalize_path(path);
        if self.files.contains_key(&normalized) {
            Ok(normalized)
        } else {
            Err(Self::not_found(&normalized))
        }
    }
}
