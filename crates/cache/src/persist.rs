use crate::db::Database;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use folio_storage::BackendHandle;
use std::fmt;
use std::path::PathBuf;
use tracing::instrument;

/// Writes complete database images to the host.
#[derive(Clone)]
pub struct Persistence {
    backend: BackendHandle,
    path: PathBuf,
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistence")
            .field("backend", &self.backend.name())
            .field("path", &self.path)
            .finish()
    }
}

impl Persistence {
    pub fn new(backend: BackendHandle, path: impl Into<PathBuf>) -> Self {
        Self { backend, path: path.into() }
    }

    /// Export the whole database and overwrite the file with it.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    pub async fn sync(&self, db: &Database) -> Result<()> {
        let image = db.export().await?;
        self.backend.write(&self.path, &image).await.or_raise(|| ErrorKind::Storage)?;
        tracing::debug!(bytes = image.len(), "database image written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Engine;
    use folio_storage::StorageBackend;
    use folio_storage::backend::MockBackend;
    use std::path::Path;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_sync_writes_image() {
        let backend = Arc::new(MockBackend::default());
        let persistence = Persistence::new(backend.clone(), "catalog.sqlite3");
        let db = Engine::init().await.unwrap().create().await.unwrap();
        persistence.sync(&db).await.unwrap();
        let image = backend.read(Path::new("catalog.sqlite3")).await.unwrap();
        assert!(image.starts_with(b"SQLite format 3\0"));
    }

    #[tokio::test]
    async fn test_sync_storage_failure() {
        let backend = Arc::new(MockBackend::default());
        backend.set_read_only(true);
        let persistence = Persistence::new(backend.clone(), "catalog.sqlite3");
        let db = Engine::init().await.unwrap().create().await.unwrap();
        let err = persistence.sync(&db).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
        assert!(err.is_retryable());
        assert!(backend.is_empty().await);
    }
}
