//! The [`Loader`]: entry point from `.thrift` files to a linked [`Schema`].
//!
//! This is a thin orchestrator over the pass modules.

use crate::error::ThriftError;
use crate::pass1_load;
use crate::pass4_link;
use crate::schema::Schema;
use crate::source::{FileSystemProvider, SourceProvider};
use log::debug;
use std::path::{Path, PathBuf};

/// Collects root files and include directories, then loads them as one
/// unit.
///
/// ```no_run
/// use thrifty_schema::Loader;
///
/// let schema = Loader::new()
///     .add_include_path("idl/common")
///     .add_thrift_file("idl/service.thrift")
///     .load()?;
/// for s in schema.structs() {
///     println!("{} has {} fields", s.name, s.fields.len());
/// }
/// # Ok::<(), thrifty_schema::ThriftError>(())
/// ```
pub struct Loader {
    provider: Box<dyn SourceProvider>,
    roots: Vec<PathBuf>,
    include_paths: Vec<PathBuf>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// A loader reading from the filesystem.
    pub fn new() -> Self {
        Self::with_provider(FileSystemProvider)
    }

    pub fn with_provider(provider: impl SourceProvider + 'static) -> Self {
        Loader {
            provider: Box::new(provider),
            roots: Vec::new(),
            include_paths: Vec::new(),
        }
    }

    /// Add a file to load. Files it includes are found automatically.
    pub fn add_thrift_file(mut self, path: impl AsRef<Path>) -> Self {
        self.roots.push(path.as_ref().to_owned());
        self
    }

    /// Add a directory searched for includes not found next to the
    /// including file. Searched in the order added.
    pub fn add_include_path(mut self, dir: impl AsRef<Path>) -> Self {
        self.include_paths.push(dir.as_ref().to_owned());
        self
    }

    /// Parse and link everything. The first error aborts the load.
    pub fn load(self) -> Result<Schema, ThriftError> {
        debug!(
            "loading {} root file(s), {} include path(s)",
            self.roots.len(),
            self.include_paths.len()
        );
        let loaded =
            pass1_load::load_programs(&self.roots, &self.include_paths, self.provider.as_ref())?;
        pass4_link::link(loaded.registry, &loaded.order)
    }
}

/// Load a single file and everything it includes from the filesystem.
pub fn load(path: &Path) -> Result<Schema, ThriftError> {
    Loader::new().add_thrift_file(path).load()
}
