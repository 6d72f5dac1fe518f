use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::populate::error::{ErrorKind as PopulateErrorKind, Result as PopulateResult};
use crate::populate::ingest::{IngestEvent, ingest};
use crate::source::PageSource;
use async_stream::stream;
use exn::ResultExt;
use folio_asyncutils::ProgressAggregator;
use folio_cache::{Author, Cache, ItemType, Work};
use futures::stream::select;
use futures::{Stream, StreamExt};
use tracing::Instrument;

/// Progress events emitted by [`populate`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started), exactly once.
/// 2. For a catalog that is already populated: [`AlreadyPopulated`](Self::AlreadyPopulated),
///    then `Progress(1.0)`, then [`Complete`](Self::Complete). Nothing is
///    fetched or written.
/// 3. Otherwise an initial [`Progress`](Self::Progress), then one `Progress`
///    per fetched page and one [`Saved`](Self::Saved) per item type, in
///    whatever order the two streams produce them.
/// 4. [`Complete`](Self::Complete), exactly once, after both item types have
///    been saved.
///
/// An error terminates the stream early, in which case `Complete` is never
/// emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum PopulateEvent {
    Started,
    /// Both tables already have rows.
    AlreadyPopulated,
    /// Combined ratio of pages fetched across both item types, in `[0, 1]`.
    Progress(f64),
    /// A table was replaced with `rows` freshly fetched items and the
    /// database saved.
    Saved { kind: ItemType, rows: usize },
    Complete,
}

/// Populate an empty catalog from `source`.
///
/// Authors and works are fetched concurrently. Dropping the stream stops
/// both; a table whose write was in flight may be left partially replaced
/// in memory, but the database file only ever receives complete images.
pub fn populate<'a>(
    cache: &'a Cache,
    source: &'a dyn PageSource,
) -> impl Stream<Item = LibraryResult<PopulateEvent>> + 'a {
    let span = tracing::info_span!("populate");
    stream! {
        let mut inner = std::pin::pin!(populate_inner(cache, source));
        while let Some(event) = inner.next().instrument(span.clone()).await {
            yield event.or_raise(|| LibraryErrorKind::Populate);
        }
    }
}

fn populate_inner<'a>(
    cache: &'a Cache,
    source: &'a dyn PageSource,
) -> impl Stream<Item = PopulateResult<PopulateEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(PopulateEvent::Started);

        let repo = match cache.repository().await.or_raise(|| PopulateErrorKind::Cache) {
            Ok(repo) => repo,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        match repo.is_populated().await.or_raise(|| PopulateErrorKind::Cache) {
            Ok(false) => {},
            Ok(true) => {
                tracing::info!("catalog already populated");
                yield Ok(PopulateEvent::AlreadyPopulated);
                yield Ok(PopulateEvent::Progress(1.0));
                yield Ok(PopulateEvent::Complete);
                return;
            },
            Err(e) => {
                yield Err(e);
                return;
            },
        }

        let (authors, works) = match page_totals(source).await {
            Ok(totals) => totals,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        tracing::info!(authors, works, "populating catalog");
        let mut progress = ProgressAggregator::new([(ItemType::Authors, authors), (ItemType::Works, works)]);
        yield Ok(PopulateEvent::Progress(progress.ratio()));

        let merged = select(
            ingest::<Author>(&repo, source, authors),
            ingest::<Work>(&repo, source, works),
        );
        for await event in merged {
            match event {
                Ok(IngestEvent::Page { kind, completed }) => {
                    yield Ok(PopulateEvent::Progress(progress.update(&kind, completed)));
                },
                Ok(IngestEvent::Saved { kind, rows }) => {
                    yield Ok(PopulateEvent::Saved { kind, rows });
                },
                Err(e) => {
                    tracing::warn!(error = ?e, "populating catalog failed");
                    yield Err(e);
                    return;
                },
            }
        }

        tracing::info!("catalog populated");
        yield Ok(PopulateEvent::Complete);
    })
}

async fn page_totals(source: &dyn PageSource) -> PopulateResult<(u64, u64)> {
    let authors = source.total_pages(ItemType::Authors).await.or_raise(|| PopulateErrorKind::Source(ItemType::Authors))?;
    let works = source.total_pages(ItemType::Works).await.or_raise(|| PopulateErrorKind::Source(ItemType::Works))?;
    Ok((authors, works))
}
