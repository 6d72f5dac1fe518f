use crate::error::{Error, ErrorKind};
use crate::item::{Author, AuthorRecord, Item, ItemType, SqliteQuery};
use exn::ResultExt;

#[derive(sqlx::FromRow)]
pub(crate) struct AuthorRow {
    id: String,
    #[sqlx(rename = "type")]
    kind: i64,
    parent: Option<String>,
    permlink: String,
}
impl TryFrom<AuthorRow> for AuthorRecord {
    type Error = Error;
    fn try_from(row: AuthorRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            kind: ItemType::try_from(row.kind).or_raise(|| ErrorKind::InvalidData("author type"))?,
            parent: row.parent.unwrap_or_default(),
            permlink: row.permlink,
        })
    }
}

impl Item for Author {
    const KIND: ItemType = ItemType::Authors;
    const DELETE: &'static str = include_str!("../../queries/delete_authors.sql");
    const INSERT: &'static str = include_str!("../../queries/insert_author.sql");

    fn id(&self) -> &str {
        &self.id
    }

    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.id.as_str())
            .bind(i64::from(self.kind))
            .bind(self.parent.as_deref().unwrap_or_default())
            .bind(self.permlink.as_str())
    }
}
