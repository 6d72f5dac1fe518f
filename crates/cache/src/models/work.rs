use crate::error::{Error, ErrorKind};
use crate::item::{Item, ItemType, SqliteQuery, Work, WorkRecord};
use exn::ResultExt;

#[derive(sqlx::FromRow)]
pub(crate) struct WorkRow {
    id: String,
    #[sqlx(rename = "type")]
    kind: i64,
    parent: Option<String>,
    permlink: String,
    composer: String,
    worktitle: String,
    icatno: String,
    pageid: i64,
}
impl TryFrom<WorkRow> for WorkRecord {
    type Error = Error;
    fn try_from(row: WorkRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            kind: ItemType::try_from(row.kind).or_raise(|| ErrorKind::InvalidData("work type"))?,
            parent: row.parent.unwrap_or_default(),
            permlink: row.permlink,
            composer: row.composer,
            work_title: row.worktitle,
            icatno: row.icatno,
            page_id: row.pageid,
        })
    }
}

impl Item for Work {
    const KIND: ItemType = ItemType::Works;
    const DELETE: &'static str = include_str!("../../queries/delete_works.sql");
    const INSERT: &'static str = include_str!("../../queries/insert_work.sql");

    fn id(&self) -> &str {
        &self.id
    }

    fn bind<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(self.id.as_str())
            .bind(i64::from(self.kind))
            .bind(self.parent.as_deref().unwrap_or_default())
            .bind(self.permlink.as_str())
            .bind(self.composer.as_str())
            .bind(self.work_title.as_str())
            .bind(self.icatno.as_str())
            .bind(self.page_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_record() {
        let row = WorkRow {
            id: "Goldberg Variations, BWV 988 (Bach, Johann Sebastian)".to_string(),
            kind: 2,
            parent: Some("Category:Bach, Johann Sebastian".to_string()),
            permlink: "https://imslp.org/wiki/Goldberg_Variations,_BWV_988_(Bach,_Johann_Sebastian)".to_string(),
            composer: "Bach, Johann Sebastian".to_string(),
            worktitle: "Goldberg Variations".to_string(),
            icatno: "BWV 988".to_string(),
            pageid: 1937,
        };
        let record = WorkRecord::try_from(row).unwrap();
        assert_eq!(record.kind, ItemType::Works);
        assert_eq!(record.work_title, "Goldberg Variations");
        assert_eq!(record.icatno, "BWV 988");
        assert_eq!(record.page_id, 1937);
    }
}
