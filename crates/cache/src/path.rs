//! Resolution of the database file location.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use folio_storage::{StorageBackend, validate_path};
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// Location of the database file within a storage backend.
///
/// The first successful [`resolve`](Self::resolve) validates the path and
/// makes sure its parent directory exists; the result is memoized, so the
/// host is asked to create directories at most once.
#[derive(Debug)]
pub struct DatabasePath {
    requested: PathBuf,
    resolved: OnceCell<PathBuf>,
}

impl DatabasePath {
    pub fn new(requested: impl Into<PathBuf>) -> Self {
        Self { requested: requested.into(), resolved: OnceCell::new() }
    }

    /// Validated path relative to the backend root, once resolved.
    pub fn get(&self) -> Option<&Path> {
        self.resolved.get().map(PathBuf::as_path)
    }

    pub async fn resolve(&self, backend: &dyn StorageBackend) -> Result<&Path> {
        let resolved = self
            .resolved
            .get_or_try_init(|| async {
                let path = validate_path(&self.requested).or_raise(|| ErrorKind::Storage)?;
                let parent = path.parent().unwrap_or(Path::new(""));
                backend.create_dir_all(parent).await.or_raise(|| ErrorKind::Storage)?;
                tracing::debug!(backend = backend.name(), path = %path.display(), "resolved database path");
                Ok::<_, crate::error::Error>(path)
            })
            .await?;
        Ok(resolved.as_path())
    }
}
