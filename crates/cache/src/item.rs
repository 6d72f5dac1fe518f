//! Catalog entities, as received from the remote source and as read back
//! from the database.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use sqlx::Sqlite;
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;

/// A parameterized statement against the catalog database.
pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Which of the two catalog tables (and paginated sources) something is
/// about. Stored in the `type` column as its integer value.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum ItemType {
    #[display("authors")]
    Authors = 1,
    #[display("works")]
    Works = 2,
}
impl ItemType {
    /// Name of the table holding items of this type.
    pub const fn table(self) -> &'static str {
        match self {
            Self::Authors => "Authors",
            Self::Works => "Works",
        }
    }
}
impl From<ItemType> for i64 {
    fn from(kind: ItemType) -> Self {
        kind as i64
    }
}
impl TryFrom<i64> for ItemType {
    type Error = UnknownItemType;
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Authors),
            2 => Ok(Self::Works),
            other => Err(UnknownItemType(other)),
        }
    }
}

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("unknown item type: {_0}")]
pub struct UnknownItemType(#[error(not(source))] pub i64);

/// An author as received from the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    /// Stored as an empty string when absent.
    #[serde(default)]
    pub parent: Option<String>,
    pub permlink: String,
}

/// A work as received from the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemType,
    /// Stored as an empty string when absent.
    #[serde(default)]
    pub parent: Option<String>,
    pub permlink: String,
    pub composer: String,
    #[serde(rename = "worktitle")]
    pub work_title: String,
    pub icatno: String,
    #[serde(rename = "pageid")]
    pub page_id: i64,
}

/// An `Authors` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorRecord {
    pub id: String,
    pub kind: ItemType,
    pub parent: String,
    pub permlink: String,
}

/// A `Works` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkRecord {
    pub id: String,
    pub kind: ItemType,
    pub parent: String,
    pub permlink: String,
    pub composer: String,
    pub work_title: String,
    pub icatno: String,
    pub page_id: i64,
}

/// Something the bulk writer knows how to store.
///
/// Each implementation names its table's statements and binds its own
/// fields, so the writer itself never branches on [`ItemType`].
pub trait Item: Send + Sync {
    const KIND: ItemType;
    const TABLE: &'static str = Self::KIND.table();
    /// Removes every row of the table.
    const DELETE: &'static str;
    /// Inserts one row; the same text is used for every row of a batch.
    const INSERT: &'static str;

    fn id(&self) -> &str;

    /// Bind this item's fields, in column order, to [`Self::INSERT`].
    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}
