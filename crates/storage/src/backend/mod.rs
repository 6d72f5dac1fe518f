//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the host filesystem
//! boundary of the catalog: the database file is read and written whole,
//! through one of these backends.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for storage backends.
///
/// All storage operations are asynchronous so that a slow disk never blocks
/// other work scheduled on the same runtime.
///
/// # Path Handling
/// All paths are relative to the storage root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use folio_storage::{backend::StorageBackend, error::Result};
///
/// async fn load_or_default(backend: &dyn StorageBackend) -> Result<Vec<u8>> {
///     let path = Path::new("catalog.sqlite3");
///     if backend.exists(path).await? {
///         backend.read(path).await
///     } else {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// Check if a file exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns the complete file contents as a [`Vec<u8>`].
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file with the provided
    /// data. Implementations create parent directories as needed.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use folio_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend, image: Vec<u8>) -> Result<()> {
    /// backend.write(Path::new("catalog.sqlite3"), &image).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Recursively create a directory and all of its parents.
    ///
    /// Succeeds without doing anything if the directory already exists. An
    /// empty path refers to the storage root itself.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;
}
