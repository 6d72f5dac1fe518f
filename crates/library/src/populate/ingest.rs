use crate::populate::error::{ErrorKind, Result};
use crate::source::PageSource;
use crate::source::error::Result as SourceResult;
use async_stream::stream;
use exn::ResultExt;
use folio_cache::{Author, Item, ItemType, Repository, Work};
use futures::Stream;
use futures::future::BoxFuture;

/// An item type that can be fetched page by page and bulk written.
pub(super) trait Ingest: Item + Sized {
    fn fetch(source: &dyn PageSource, page: u64) -> BoxFuture<'_, SourceResult<Vec<Self>>>;
}
impl Ingest for Author {
    fn fetch(source: &dyn PageSource, page: u64) -> BoxFuture<'_, SourceResult<Vec<Self>>> {
        source.fetch_authors(page)
    }
}
impl Ingest for Work {
    fn fetch(source: &dyn PageSource, page: u64) -> BoxFuture<'_, SourceResult<Vec<Self>>> {
        source.fetch_works(page)
    }
}

pub(super) enum IngestEvent {
    /// `completed` pages of `kind` have been fetched so far.
    Page { kind: ItemType, completed: u64 },
    /// Every page of `kind` was fetched and the table replaced with them.
    Saved { kind: ItemType, rows: usize },
}

/// Fetch pages `0..total` of `T` in order, then replace `T`'s table with
/// everything fetched. Ends after the first error.
pub(super) fn ingest<'a, T: Ingest>(
    repo: &'a Repository,
    source: &'a dyn PageSource,
    total: u64,
) -> impl Stream<Item = Result<IngestEvent>> + 'a {
    stream!({
        let mut items = Vec::new();
        for page in 0..total {
            match T::fetch(source, page).await.or_raise(|| ErrorKind::Source(T::KIND)) {
                Ok(batch) => items.extend(batch),
                Err(e) => {
                    yield Err(e);
                    return;
                },
            }
            tracing::debug!(kind = %T::KIND, page, total, "fetched page");
            yield Ok(IngestEvent::Page { kind: T::KIND, completed: page + 1 });
        }
        yield repo
            .replace_all(&items)
            .await
            .map(|rows| IngestEvent::Saved { kind: T::KIND, rows })
            .or_raise(|| ErrorKind::Write(T::KIND));
    })
}
