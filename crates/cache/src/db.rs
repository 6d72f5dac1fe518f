//! The in-memory catalog database and its on-disk image.
//!
//! The catalog is small enough to live entirely in memory. What reaches the
//! disk is always a complete image of the database: produced by
//! [`Database::export`] and loaded back by [`Engine::open`](crate::Engine::open).

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use sqlx::SqliteConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;
use tempfile::{NamedTempFile, TempDir};
use tokio::sync::{Mutex, MutexGuard};
use tracing::instrument;

/// A live in-memory catalog database.
///
/// Cloning is cheap and every clone refers to the same database. The
/// database exists only as long as its single pooled connection, which the
/// pool is configured never to recycle.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    /// Scratch directory owned by the engine, for image import/export.
    staging: Arc<TempDir>,
    /// Held for the whole of a bulk replace, persistence included.
    writer: Arc<Mutex<()>>,
}

impl Database {
    /// A fresh, empty in-memory database.
    pub(crate) async fn in_memory(staging: Arc<TempDir>) -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:");
        let pool = SqlitePoolOptions::new()
            // An in-memory database is private to the connection that
            // created it: one connection, kept forever.
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Self {
            pool,
            staging,
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Load a database image into a fresh in-memory database.
    ///
    /// The image's own schema is replayed as-is. Nothing about its shape is
    /// checked here; a foreign schema shows up as query errors later.
    #[instrument(level = "debug", skip_all, fields(bytes = image.len()))]
    pub(crate) async fn import(staging: Arc<TempDir>, image: &[u8]) -> Result<Self> {
        let db = Self::in_memory(staging).await?;
        let snapshot = db.stage("import-")?;
        tokio::fs::write(snapshot.path(), image).await.or_raise(|| ErrorKind::Staging)?;
        let snapshot_path = Self::path_str(snapshot.path())?;

        let mut conn = db.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query("ATTACH DATABASE ? AS snapshot")
            .bind(snapshot_path)
            .persistent(false)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let copied = Self::copy_snapshot(&mut conn).await;
        // Detach regardless, otherwise the staged file stays open.
        let detached = sqlx::query("DETACH DATABASE snapshot")
            .persistent(false)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database);
        copied?;
        detached?;
        drop(conn);
        Ok(db)
    }

    /// Recreate every object of the attached `snapshot` database in `main`,
    /// copying table contents along the way. Tables go first so that
    /// indexes, views and triggers have something to refer to.
    async fn copy_snapshot(conn: &mut SqliteConnection) -> Result<()> {
        let objects: Vec<(String, String, String)> = sqlx::query_as(include_str!("../queries/snapshot_objects.sql"))
            .persistent(false)
            .fetch_all(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let (tables, others): (Vec<_>, Vec<_>) = objects.into_iter().partition(|(kind, _, _)| kind == "table");
        for (_, name, sql) in &tables {
            sqlx::raw_sql(sql).execute(&mut *conn).await.or_raise(|| ErrorKind::Database)?;
            let copy = format!("INSERT INTO main.{0} SELECT * FROM snapshot.{0}", quote_identifier(name));
            sqlx::raw_sql(&copy).execute(&mut *conn).await.or_raise(|| ErrorKind::Database)?;
        }
        for (_, _, sql) in &others {
            sqlx::raw_sql(sql).execute(&mut *conn).await.or_raise(|| ErrorKind::Database)?;
        }
        tracing::debug!(tables = tables.len(), other = others.len(), "copied database image");
        Ok(())
    }

    /// Produce a complete image of the database.
    #[instrument(level = "debug", skip(self))]
    pub async fn export(&self) -> Result<Vec<u8>> {
        // VACUUM INTO refuses to overwrite anything but an empty file, which
        // is exactly what a fresh temporary file is.
        let target = self.stage("export-")?;
        let target_path = Self::path_str(target.path())?;
        sqlx::query("VACUUM main INTO ?")
            .bind(target_path)
            .persistent(false)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tokio::fs::read(target.path()).await.or_raise(|| ErrorKind::Staging)
    }

    /// Get a reference to the underlying connection pool.
    ///
    /// The pool holds exactly one connection; anything holding it blocks
    /// every other query.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Serialize writers. Held from the first `DELETE` of a bulk replace to
    /// the moment its image has been written to storage.
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    /// Close the connection, and with it the database. Any clone of this
    /// database is unusable afterwards.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    fn stage(&self, prefix: &str) -> Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".sqlite3")
            .tempfile_in(self.staging.path())
            .or_raise(|| ErrorKind::Staging)
    }

    fn path_str(path: &Path) -> Result<&str> {
        path.to_str().ok_or_raise(|| ErrorKind::InvalidData("staging path"))
    }
}

/// Quote an SQL identifier, doubling any embedded double quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
