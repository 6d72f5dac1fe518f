//! Bookkeeping for concurrent async work, shared by the folio crates.

pub mod progress;

pub use crate::progress::{Progress, ProgressAggregator};
