use crate::db::Database;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;

/// Create the `Authors` and `Works` tables in a freshly created database.
///
/// Only ever run against a database that was just created; a database loaded
/// from an image keeps the schema it was saved with.
pub(crate) async fn apply(db: &Database) -> Result<()> {
    sqlx::raw_sql(include_str!("../queries/schema.sql")).execute(db.pool()).await.or_raise(|| ErrorKind::Schema)?;
    tracing::debug!("catalog schema created");
    Ok(())
}
