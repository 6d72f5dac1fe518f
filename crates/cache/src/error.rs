//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The embedded engine could not be brought up. Nothing in the cache
    /// will work; there is no fallback engine.
    #[display("database engine initialization failed")]
    Engine,
    #[display("SQLite {_0} is too old, 3.27 or newer is required")]
    UnsupportedEngine(#[error(not(source))] String),
    #[display("database error")]
    Database,
    /// The cache was closed; it hands out no more databases.
    #[display("database has been closed")]
    Closed,
    #[display("schema creation failed")]
    Schema,
    /// Scratch files used to move database images in and out of the engine.
    #[display("staging area I/O error")]
    Staging,
    /// The host storage backend failed to resolve, read or write the file.
    #[display("storage error")]
    Storage,
    /// One or more rows of a bulk write failed. Rows that did succeed are
    /// still in the in-memory database; the file on disk was not touched.
    #[display("{} of {attempted} rows could not be written to {table}", failures.len())]
    Write {
        table: &'static str,
        attempted: usize,
        failures: Vec<RowFailure>,
    },
    /// Serialization/deserialization error.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::Staging)
    }
}

/// A single row that could not be inserted during a bulk write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// Position of the item in the list handed to the writer.
    pub index: usize,
    pub id: String,
    pub reason: String,
}
