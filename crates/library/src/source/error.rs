//! Error types for the [`source`](super) module.

use derive_more::{Display, Error};

/// A page source error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for page source operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The remote service could not be reached, or the request failed.
    #[display("remote catalog unreachable")]
    Network,
    /// The remote service answered with something that isn't a page of
    /// catalog items.
    #[display("invalid response from remote catalog: {_0}")]
    InvalidResponse(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }
}
