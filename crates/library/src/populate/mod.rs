//! Filling an empty catalog from the remote source.
//!
//! Authors and works are fetched page by page, concurrently, and each list
//! replaces its table as soon as its last page arrives. Progress across both
//! is reported as a single ratio weighted by each stream's page count (see
//! [`ProgressAggregator`](folio_asyncutils::ProgressAggregator)).
//!
//! The primary entry point is [`populate`], which streams [`PopulateEvent`]s.
//! A catalog that already has rows in both tables is left alone: populating
//! is a one-shot gate, not a sync.

pub mod error;
mod ingest;
mod stream;

pub use self::stream::{PopulateEvent, populate};
