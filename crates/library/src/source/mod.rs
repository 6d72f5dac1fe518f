//! The remote, paginated catalog.
//!
//! Talking to the remote service is left to the caller; the library only
//! needs something that can count and fetch pages of each item type.

pub mod error;

use self::error::Result;
use async_trait::async_trait;
use folio_cache::{Author, ItemType, Work};
use std::sync::Arc;

/// A paginated remote listing of authors and works.
///
/// Pages are numbered from zero. The page count for each type is known
/// before the first page is requested.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Number of pages available for `kind`.
    async fn total_pages(&self, kind: ItemType) -> Result<u64>;

    async fn fetch_authors(&self, page: u64) -> Result<Vec<Author>>;

    async fn fetch_works(&self, page: u64) -> Result<Vec<Work>>;
}

pub type SourceHandle = Arc<dyn PageSource>;

#[cfg(test)]
pub(crate) mod fake;
