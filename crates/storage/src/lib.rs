//! Host storage primitives for the catalog database file.
//!
//! The catalog keeps exactly one binary file on disk. Everything the cache
//! needs from the host goes through [`StorageBackend`]: existence checks,
//! whole-file reads and writes, and recursive directory creation.

pub mod backend;
pub mod error;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
