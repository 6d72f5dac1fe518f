//! The folio catalog: every known author and work, cached locally.
//!
//! A [`Library`] ties a [`Cache`] (the local database) to a [`PageSource`]
//! (the remote, paginated catalog). An empty catalog is filled once with
//! [`Library::populate`]; after that every lookup is served from the cache.

pub mod error;
pub mod populate;
pub mod source;

pub use crate::populate::{PopulateEvent, populate};
pub use crate::source::{PageSource, SourceHandle};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use folio_cache::{Cache, ItemType, Repository, SearchResults, WorkRecord};
use folio_config::Config;
use folio_storage::backend::LocalBackend;
use futures::Stream;
use std::sync::Arc;
use tracing::instrument;

pub struct Library {
    cache: Cache,
    source: SourceHandle,
}

impl Library {
    pub fn new(cache: Cache, source: SourceHandle) -> Self {
        Self { cache, source }
    }

    /// A library whose database lives on the local filesystem, at the
    /// location described by `config`.
    #[instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
    pub fn from_config(config: &Config, source: SourceHandle) -> Result<Self> {
        let backend = LocalBackend::new("local", &config.data_dir).or_raise(|| ErrorKind::Storage)?;
        Ok(Self::new(Cache::new(Arc::new(backend), &config.database), source))
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    async fn repository(&self) -> Result<Repository> {
        self.cache.repository().await.or_raise(|| ErrorKind::Cache)
    }

    pub async fn is_populated(&self) -> Result<bool> {
        self.repository().await?.is_populated().await.or_raise(|| ErrorKind::Cache)
    }

    /// See [`populate()`].
    pub fn populate(&self) -> impl Stream<Item = Result<PopulateEvent>> + '_ {
        populate(&self.cache, self.source.as_ref())
    }

    pub async fn search(&self, query: &str, kind: ItemType) -> Result<SearchResults> {
        self.repository().await?.search(query, kind).await.or_raise(|| ErrorKind::Cache)
    }

    pub async fn find_by_composer(&self, composer: &str) -> Result<Vec<WorkRecord>> {
        self.repository().await?.find_by_composer(composer).await.or_raise(|| ErrorKind::Cache)
    }

    /// Close the underlying database. The library can't be used afterwards.
    pub async fn close(&self) {
        self.cache.close().await;
    }
}
