//! Error types for the [`populate`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.

use derive_more::{Display, Error};
use folio_cache::ItemType;

/// A populate error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for populate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a populate failure.
///
/// The [`ItemType`] names the stream that failed; its sibling was dropped
/// along with the populate stream.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Opening the cache or probing its tables failed.
    #[display("catalog cache unavailable")]
    Cache,
    /// The [`PageSource`](crate::source::PageSource) failed to count or fetch
    /// pages.
    #[display("fetching {_0} failed")]
    Source(#[error(not(source))] ItemType),
    /// The fetched items could not be written or saved.
    #[display("saving {_0} failed")]
    Write(#[error(not(source))] ItemType),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            _ => false,
        }
    }
}
