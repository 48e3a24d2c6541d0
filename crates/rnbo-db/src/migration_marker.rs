//! Tracks which older on-disk-data "source versions" (pre-existing install
//! trees being imported from) still have un-migrated content, so the
//! controller can surface a one-time "import from version X" prompt instead
//! of silently re-importing on every start.

use rusqlite::params;

use crate::error::DbError;
use crate::store::Db;

pub struct MigrationMarkerQuery;

impl MigrationMarkerQuery {
    /// The most recent older source version that still has un-migrated data,
    /// if any. "Most recent" is the lexically greatest registered version
    /// string, which is sufficient for the dotted version strings this
    /// tracks.
    pub fn report_unmigrated(db: &Db) -> Result<Option<String>, DbError> {
        db.with_conn(|conn| {
            conn.query_row(
                "SELECT source_version FROM migration_markers WHERE migrated = 0
                 ORDER BY source_version DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional_or_none()
        })
    }

    pub fn register(db: &Db, source_version: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO migration_markers (source_version, migrated) VALUES (?1, 0)",
                params![source_version],
            )?;
            Ok(())
        })
    }

    pub fn mark_all_migrated(db: &Db) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute("UPDATE migration_markers SET migrated = 1", [])?;
            Ok(())
        })
    }
}

trait OptionalOrNone<T> {
    fn optional_or_none(self) -> Result<Option<T>, DbError>;
}

impl<T> OptionalOrNone<T> for rusqlite::Result<T> {
    fn optional_or_none(self) -> Result<Option<T>, DbError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DbError::from(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_most_recent_unmigrated() {
        let db = Db::in_memory().unwrap();
        MigrationMarkerQuery::register(&db, "1.9.0").unwrap();
        MigrationMarkerQuery::register(&db, "2.0.0").unwrap();
        assert_eq!(
            MigrationMarkerQuery::report_unmigrated(&db).unwrap(),
            Some("2.0.0".to_string())
        );
    }

    #[test]
    fn mark_all_migrated_clears_report() {
        let db = Db::in_memory().unwrap();
        MigrationMarkerQuery::register(&db, "1.9.0").unwrap();
        MigrationMarkerQuery::mark_all_migrated(&db).unwrap();
        assert_eq!(MigrationMarkerQuery::report_unmigrated(&db).unwrap(), None);
    }
}
