//! The embedded SQL engine.

use crate::db::Database;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, SqliteConnection};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::instrument;

/// `VACUUM INTO` arrived in SQLite 3.27.0.
const MIN_SQLITE_VERSION: (u32, u32) = (3, 27);

/// The SQLite runtime, initialized once per [`Cache`](crate::Cache).
///
/// Owns the staging directory that database images pass through on their
/// way in and out of memory; it is removed when the last clone of the
/// engine and of every database it created is dropped.
#[derive(Debug, Clone)]
pub struct Engine {
    staging: Arc<TempDir>,
    version: String,
}

impl Engine {
    /// Bring up the engine: create the staging directory and make sure the
    /// linked SQLite library can export images.
    #[instrument("initializing database engine")]
    pub async fn init() -> Result<Self> {
        let staging = tempfile::Builder::new().prefix("folio-").tempdir().or_raise(|| ErrorKind::Engine)?;
        let mut conn = SqliteConnection::connect_with(&SqliteConnectOptions::new().filename(":memory:"))
            .await
            .or_raise(|| ErrorKind::Engine)?;
        let version: String =
            sqlx::query_scalar("SELECT sqlite_version()").fetch_one(&mut conn).await.or_raise(|| ErrorKind::Engine)?;
        _ = conn.close().await;
        match parse_version(&version) {
            Some(found) if found >= MIN_SQLITE_VERSION => {},
            _ => exn::bail!(ErrorKind::UnsupportedEngine(version)),
        }
        tracing::info!(sqlite = %version, staging = %staging.path().display(), "database engine ready");
        Ok(Self { staging: Arc::new(staging), version })
    }

    /// Version of the linked SQLite library.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// A new, empty in-memory database. No schema is applied.
    pub async fn create(&self) -> Result<Database> {
        Database::in_memory(self.staging.clone()).await
    }

    /// Open a database over a complete image, as previously produced by
    /// [`Database::export`].
    pub async fn open(&self, image: &[u8]) -> Result<Database> {
        Database::import(self.staging.clone(), image).await
    }
}

fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}
