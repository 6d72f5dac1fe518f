//! Embedded SQLite cache of the catalog.
//!
//! The catalog (every known author and work) is held in an in-memory SQLite
//! database and mirrored to a single file through a storage backend. The
//! file is never edited in place: after every successful change the whole
//! database is exported and the file overwritten with the new image.
//!
//! # Architecture
//! - [`Cache`] owns the lazily initialized [`Engine`] and [`Database`] for
//!   one file, resolving its [`DatabasePath`] on first use.
//! - [`Repository`] is the query layer and bulk writer. A bulk write
//!   replaces an entire table, then hands the database to [`Persistence`].
//! - The tables are `Authors` and `Works`; see [`Author`] and [`Work`].

mod db;
mod engine;
pub mod error;
mod handle;
mod item;
mod models;
mod path;
mod persist;
mod repo;
mod schema;

pub use crate::db::Database;
pub use crate::engine::Engine;
pub use crate::error::RowFailure;
pub use crate::handle::Cache;
pub use crate::item::{Author, AuthorRecord, Item, ItemType, SqliteQuery, UnknownItemType, Work, WorkRecord};
pub use crate::path::DatabasePath;
pub use crate::persist::Persistence;
pub use crate::repo::{Repository, SEARCH_LIMIT, SearchResults};
