//! Query layer and bulk writer for the catalog tables.
//!
//! Reads go straight to the in-memory database. Writes replace a whole table
//! and then save a complete image of the database to storage, all while
//! holding the database's write lock.

use crate::db::Database;
use crate::error::{ErrorKind, Result, RowFailure};
use crate::item::{Author, AuthorRecord, Item, ItemType, Work, WorkRecord};
use crate::models::{AuthorRow, WorkRow};
use crate::persist::Persistence;
use exn::ResultExt;
use tracing::instrument;

/// Maximum number of rows returned by a search.
pub const SEARCH_LIMIT: i64 = 10;

/// Search hits for one [`ItemType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResults {
    Authors(Vec<AuthorRecord>),
    Works(Vec<WorkRecord>),
}
impl SearchResults {
    pub fn kind(&self) -> ItemType {
        match self {
            Self::Authors(_) => ItemType::Authors,
            Self::Works(_) => ItemType::Works,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Authors(records) => records.len(),
            Self::Works(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers of every hit, in result order.
    pub fn ids(&self) -> Vec<&str> {
        match self {
            Self::Authors(records) => records.iter().map(|r| r.id.as_str()).collect(),
            Self::Works(records) => records.iter().map(|r| r.id.as_str()).collect(),
        }
    }
}

/// Repository over the `Authors` and `Works` tables of a live database.
///
/// Cheap to clone; clones share the database and its write lock.
#[derive(Debug, Clone)]
pub struct Repository {
    database: Database,
    persistence: Persistence,
}
impl Repository {
    pub fn new(database: Database, persistence: Persistence) -> Self {
        Self { database, persistence }
    }

    // =========================================================================
    // Bulk Write
    // =========================================================================

    /// Replace the entire contents of `T`'s table with `items`, then save the
    /// database to storage.
    ///
    /// Every item is attempted even after a failure. If any row fails, the
    /// error lists each failed row and the database file is left as it was;
    /// rows that were inserted stay in the in-memory table.
    #[instrument(level = "debug", skip_all, fields(table = T::TABLE, rows = items.len()))]
    pub async fn replace_all<T: Item>(&self, items: &[T]) -> Result<usize> {
        let _writer = self.database.lock_writes().await;
        let mut conn = self.database.pool().acquire().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(T::DELETE).execute(&mut *conn).await.or_raise(|| ErrorKind::Database)?;
        let mut failures = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if let Err(err) = item.bind(sqlx::query(T::INSERT)).execute(&mut *conn).await {
                failures.push(RowFailure { index, id: item.id().to_string(), reason: err.to_string() });
            }
        }
        drop(conn);
        if !failures.is_empty() {
            tracing::warn!(table = T::TABLE, failed = failures.len(), attempted = items.len(), "bulk write incomplete");
            exn::bail!(ErrorKind::Write { table: T::TABLE, attempted: items.len(), failures });
        }
        self.persistence.sync(&self.database).await?;
        tracing::info!(table = T::TABLE, rows = items.len(), "table replaced");
        Ok(items.len())
    }

    pub async fn save_authors(&self, authors: &[Author]) -> Result<usize> {
        self.replace_all(authors).await
    }

    pub async fn save_works(&self, works: &[Work]) -> Result<usize> {
        self.replace_all(works).await
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Both tables have at least one row.
    pub async fn is_populated(&self) -> Result<bool> {
        for query in [include_str!("../queries/any_author.sql"), include_str!("../queries/any_work.sql")] {
            let row: Option<i64> = sqlx::query_scalar(query)
                .fetch_optional(self.database.pool())
                .await
                .or_raise(|| ErrorKind::Database)?;
            if row.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn count(&self, kind: ItemType) -> Result<u64> {
        let sql = match kind {
            ItemType::Authors => include_str!("../queries/count_authors.sql"),
            ItemType::Works => include_str!("../queries/count_works.sql"),
        };
        let count: i64 = sqlx::query_scalar(sql).fetch_one(self.database.pool()).await.or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("row count"))
    }

    /// Authors whose identifier contains `query`, ignoring ASCII case.
    pub async fn search_authors(&self, query: &str) -> Result<Vec<AuthorRecord>> {
        let rows: Vec<AuthorRow> = sqlx::query_as(include_str!("../queries/search_authors.sql"))
            .bind(contains_pattern(query))
            .bind(SEARCH_LIMIT)
            .fetch_all(self.database.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(AuthorRecord::try_from).collect()
    }

    /// Works whose identifier contains `query`, ignoring ASCII case.
    pub async fn search_works(&self, query: &str) -> Result<Vec<WorkRecord>> {
        let rows: Vec<WorkRow> = sqlx::query_as(include_str!("../queries/search_works.sql"))
            .bind(contains_pattern(query))
            .bind(SEARCH_LIMIT)
            .fetch_all(self.database.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(WorkRecord::try_from).collect()
    }

    /// Up to [`SEARCH_LIMIT`] items of the given type, ordered by identifier.
    #[instrument(level = "debug", skip(self))]
    pub async fn search(&self, query: &str, kind: ItemType) -> Result<SearchResults> {
        Ok(match kind {
            ItemType::Authors => SearchResults::Authors(self.search_authors(query).await?),
            ItemType::Works => SearchResults::Works(self.search_works(query).await?),
        })
    }

    /// Every work whose composer is exactly `composer`, ordered by identifier.
    #[instrument(level = "debug", skip(self))]
    pub async fn find_by_composer(&self, composer: &str) -> Result<Vec<WorkRecord>> {
        let rows: Vec<WorkRow> = sqlx::query_as(include_str!("../queries/find_works_by_composer.sql"))
            .bind(composer)
            .fetch_all(self.database.pool())
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(WorkRecord::try_from).collect()
    }
}

/// `LIKE` pattern matching `query` anywhere, with wildcards in `query` taken
/// literally. Pairs with `ESCAPE '\'` in the search queries.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cache, Engine};
    use folio_storage::StorageBackend;
    use folio_storage::backend::MockBackend;
    use rstest::rstest;
    use std::path::Path;
    use std::sync::Arc;

    const FILE: &str = "catalog.sqlite3";

    fn author(id: &str) -> Author {
        Author {
            id: id.to_string(),
            kind: ItemType::Authors,
            parent: None,
            permlink: format!("https://imslp.org/wiki/{}", id.replace(' ', "_")),
        }
    }

    fn work(id: &str, composer: &str) -> Work {
        Work {
            id: id.to_string(),
            kind: ItemType::Works,
            parent: Some(format!("Category:{composer}")),
            permlink: format!("https://imslp.org/wiki/{}", id.replace(' ', "_")),
            composer: composer.to_string(),
            work_title: id.split(" (").next().unwrap_or(id).to_string(),
            icatno: String::new(),
            page_id: id.len() as i64,
        }
    }

    async fn fresh() -> (Arc<MockBackend>, Cache, Repository) {
        let backend = Arc::new(MockBackend::default());
        let cache = Cache::new(backend.clone(), FILE);
        let repo = cache.repository().await.unwrap();
        (backend, cache, repo)
    }

    #[rstest]
    #[case("bach", "%bach%")]
    #[case("100%", "%100\\%%")]
    #[case("a_b", "%a\\_b%")]
    #[case(r"C:\", r"%C:\\%")]
    #[case("o'brien", "%o'brien%")]
    fn test_contains_pattern(#[case] query: &str, #[case] expected: &str) {
        assert_eq!(contains_pattern(query), expected);
    }

    #[tokio::test]
    async fn test_replace_all_replaces_the_table() {
        let (_backend, _cache, repo) = fresh().await;
        let written = repo.save_authors(&[author("Category:A"), author("Category:B"), author("Category:C")]).await.unwrap();
        assert_eq!(written, 3);
        repo.save_authors(&[author("Category:D")]).await.unwrap();
        assert_eq!(repo.count(ItemType::Authors).await.unwrap(), 1);
        assert_eq!(repo.search("Category", ItemType::Authors).await.unwrap().ids(), vec!["Category:D"]);
    }

    #[tokio::test]
    async fn test_empty_replace_clears_the_table() {
        let (_backend, _cache, repo) = fresh().await;
        repo.save_works(&[work("Sonata (Nobody)", "Nobody")]).await.unwrap();
        assert_eq!(repo.save_works(&[]).await.unwrap(), 0);
        assert_eq!(repo.count(ItemType::Works).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fields_round_trip() {
        let (_backend, _cache, repo) = fresh().await;
        let mut with_parent = author("Category:Mozart, Wolfgang Amadeus");
        with_parent.parent = Some("Category:Composers".to_string());
        repo.save_authors(&[author("Category:Bach, Johann Sebastian"), with_parent]).await.unwrap();
        let found = repo.search_authors("Category:").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].parent, "");
        assert_eq!(found[0].kind, ItemType::Authors);
        assert_eq!(found[1].parent, "Category:Composers");
        assert_eq!(found[1].permlink, "https://imslp.org/wiki/Category:Mozart,_Wolfgang_Amadeus");

        let goldberg = work("Goldberg Variations, BWV 988 (Bach, Johann Sebastian)", "Bach, Johann Sebastian");
        repo.save_works(std::slice::from_ref(&goldberg)).await.unwrap();
        let found = repo.find_by_composer("Bach, Johann Sebastian").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].work_title, goldberg.work_title);
        assert_eq!(found[0].page_id, goldberg.page_id);
        assert_eq!(found[0].parent, "Category:Bach, Johann Sebastian");
    }

    #[tokio::test]
    async fn test_is_populated_needs_both_tables() {
        let (_backend, _cache, repo) = fresh().await;
        assert!(!repo.is_populated().await.unwrap());
        repo.save_authors(&[author("Category:Bach, Johann Sebastian")]).await.unwrap();
        assert!(!repo.is_populated().await.unwrap());
        repo.save_works(&[work("Mass in B minor, BWV 232 (Bach, Johann Sebastian)", "Bach, Johann Sebastian")])
            .await
            .unwrap();
        assert!(repo.is_populated().await.unwrap());
    }

    #[tokio::test]
    async fn test_search_is_capped_and_sorted() {
        let (_backend, _cache, repo) = fresh().await;
        let mut authors: Vec<Author> = (0..12).rev().map(|n| author(&format!("Category:Bach {n:02}"))).collect();
        authors.push(author("Category:BACH, Carl Philipp Emanuel"));
        authors.push(author("Category:Handel, George Frideric"));
        repo.save_authors(&authors).await.unwrap();

        let found = repo.search("bach", ItemType::Authors).await.unwrap();
        assert_eq!(found.kind(), ItemType::Authors);
        assert_eq!(found.len(), SEARCH_LIMIT as usize);
        let ids = found.ids();
        assert!(ids.iter().all(|id| id.to_lowercase().contains("bach")));
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(ids[0], "Category:BACH, Carl Philipp Emanuel");
    }

    #[rstest]
    #[case("o'brien", &["Category:O'Brien, Tim"])]
    #[case("100%", &["Category:100% Bach"])]
    #[case("a_b", &["Category:a_b"])]
    #[case("'; DROP TABLE Authors; --", &[])]
    #[tokio::test]
    async fn test_search_is_literal(#[case] query: &str, #[case] expected: &[&str]) {
        let (_backend, _cache, repo) = fresh().await;
        let ids = ["Category:O'Brien, Tim", "Category:100% Bach", "Category:100 Bach", "Category:a_b", "Category:axb"];
        repo.save_authors(&ids.map(author)).await.unwrap();
        assert_eq!(repo.search(query, ItemType::Authors).await.unwrap().ids(), expected);
        assert_eq!(repo.count(ItemType::Authors).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_find_by_composer_is_exact() {
        let (_backend, _cache, repo) = fresh().await;
        repo.save_works(&[
            work("Toccata and Fugue (J.S. Bach)", "J.S. Bach"),
            work("Cantata (J.S. Bach Jr.)", "J.S. Bach Jr."),
            work("Air (J.S. Bach)", "J.S. Bach"),
            work("Prelude (j.s. bach)", "j.s. bach"),
        ])
        .await
        .unwrap();
        let found = repo.find_by_composer("J.S. Bach").await.unwrap();
        let ids: Vec<_> = found.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["Air (J.S. Bach)", "Toccata and Fugue (J.S. Bach)"]);
        assert!(repo.find_by_composer("Nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_writes_reach_storage() {
        let (backend, cache, repo) = fresh().await;
        repo.save_authors(&[author("Category:Bach, Johann Sebastian")]).await.unwrap();
        cache.close().await;

        let reopened = Cache::new(backend.clone(), FILE).repository().await.unwrap();
        assert_eq!(reopened.count(ItemType::Authors).await.unwrap(), 1);
        assert_eq!(reopened.count(ItemType::Works).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_writers_both_persist() {
        let (backend, cache, repo) = fresh().await;
        let authors = [author("Category:Bach, Johann Sebastian")];
        let works = [work("Mass in B minor, BWV 232 (Bach, Johann Sebastian)", "Bach, Johann Sebastian")];
        let (a, w) = tokio::join!(repo.save_authors(&authors), repo.save_works(&works));
        assert_eq!((a.unwrap(), w.unwrap()), (1, 1));
        cache.close().await;

        let reopened = Cache::new(backend.clone(), FILE).repository().await.unwrap();
        assert!(reopened.is_populated().await.unwrap());
    }

    #[tokio::test]
    async fn test_storage_failure_after_insert() {
        let (backend, _cache, repo) = fresh().await;
        backend.set_read_only(true);
        let err = repo.save_authors(&[author("Category:Bach, Johann Sebastian")]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
    }

    #[tokio::test]
    async fn test_row_failures_are_collected() {
        // A file written by someone else, with a constraint the crate's own
        // schema doesn't have.
        let engine = Engine::init().await.unwrap();
        let seed = engine.create().await.unwrap();
        sqlx::raw_sql(
            r#"
                CREATE TABLE Authors (id TEXT CHECK (id NOT LIKE '%Bad%'), type INT, parent TEXT, permlink TEXT);
                CREATE TABLE Works (id TEXT, type INT, parent TEXT, permlink TEXT, composer TEXT, worktitle TEXT, icatno TEXT, pageid INT);
                INSERT INTO Authors VALUES ('Category:Old', 1, '', '');
            "#,
        )
        .execute(seed.pool())
        .await
        .unwrap();
        let image = seed.export().await.unwrap();
        let backend = Arc::new(MockBackend::with_files([(FILE, image.clone())]));
        let repo = Cache::new(backend.clone(), FILE).repository().await.unwrap();

        let batch = [author("Category:Good"), author("Category:Bad"), author("Category:Fine"), author("Category:Bad 2")];
        let err = repo.save_authors(&batch).await.unwrap_err();
        let ErrorKind::Write { table, attempted, failures } = &*err else {
            panic!("expected a write error, got {err:?}");
        };
        assert_eq!(*table, "Authors");
        assert_eq!(*attempted, 4);
        let failed: Vec<_> = failures.iter().map(|f| (f.index, f.id.as_str())).collect();
        assert_eq!(failed, vec![(1, "Category:Bad"), (3, "Category:Bad 2")]);
        assert!(failures.iter().all(|f| !f.reason.is_empty()));

        // No rollback in memory, no write to storage.
        assert_eq!(repo.search_authors("Category:").await.unwrap().len(), 2);
        assert_eq!(backend.read(Path::new(FILE)).await.unwrap(), image);
    }
}
