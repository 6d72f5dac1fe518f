//! The cache context: one engine, one database, one file.

use crate::db::Database;
use crate::engine::Engine;
use crate::error::{ErrorKind, Result};
use crate::path::DatabasePath;
use crate::persist::Persistence;
use crate::repo::Repository;
use crate::schema;
use exn::ResultExt;
use folio_storage::BackendHandle;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::instrument;

/// Owns the lazily initialized engine and database for one database file.
///
/// Each piece is initialized at most once; concurrent callers of
/// [`load_or_create`](Self::load_or_create) wait for the same load rather
/// than starting their own. Drop the cache (after [`close`](Self::close))
/// to release everything it holds.
pub struct Cache {
    backend: BackendHandle,
    path: DatabasePath,
    engine: OnceCell<Engine>,
    database: OnceCell<Database>,
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("backend", &self.backend.name())
            .field("path", &self.path)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl Cache {
    pub fn new(backend: BackendHandle, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: DatabasePath::new(path),
            engine: OnceCell::new(),
            database: OnceCell::new(),
        }
    }

    /// The SQL engine, initialized on first use.
    pub async fn engine(&self) -> Result<&Engine> {
        self.engine.get_or_try_init(Engine::init).await
    }

    /// Whether a database is loaded, held, and not yet closed.
    pub fn is_ready(&self) -> bool {
        self.database.get().is_some_and(|db| !db.is_closed())
    }

    /// The live database: loaded from the file if there is one, otherwise
    /// created with an empty schema and saved.
    ///
    /// Fails with [`Closed`](ErrorKind::Closed) once [`close`](Self::close)
    /// has been called.
    pub async fn load_or_create(&self) -> Result<&Database> {
        let db = self.database.get_or_try_init(|| self.load_or_create_inner()).await?;
        if db.is_closed() {
            exn::bail!(ErrorKind::Closed);
        }
        Ok(db)
    }

    #[instrument("loading catalog database", skip(self), fields(backend = self.backend.name()))]
    async fn load_or_create_inner(&self) -> Result<Database> {
        let engine = self.engine().await?;
        let path = self.path.resolve(self.backend.as_ref()).await?;
        if self.backend.exists(path).await.or_raise(|| ErrorKind::Storage)? {
            let image = self.backend.read(path).await.or_raise(|| ErrorKind::Storage)?;
            let db = engine.open(&image).await?;
            tracing::info!(path = %path.display(), bytes = image.len(), "loaded catalog database");
            return Ok(db);
        }
        let db = engine.create().await?;
        schema::apply(&db).await?;
        Persistence::new(self.backend.clone(), path).sync(&db).await?;
        tracing::info!(path = %path.display(), "created catalog database");
        Ok(db)
    }

    /// Query layer and bulk writer over the live database.
    pub async fn repository(&self) -> Result<Repository> {
        let db = self.load_or_create().await?.clone();
        let path = self.path.resolve(self.backend.as_ref()).await?;
        Ok(Repository::new(db, Persistence::new(self.backend.clone(), path)))
    }

    /// Close the database. Repositories handed out earlier fail from now on,
    /// and the cache never reopens the file.
    pub async fn close(&self) {
        if let Some(db) = self.database.get() {
            db.close().await;
            tracing::debug!("catalog database closed");
        }
    }
}
