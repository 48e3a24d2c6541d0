//! Patcher rows: one per compiled, stored library.

use rusqlite::{params, OptionalExtension};

use crate::error::DbError;
use crate::store::Db;

#[derive(Debug, Clone, PartialEq)]
pub struct PatcherRow {
    pub id: i64,
    pub name: String,
    pub library_path: String,
    pub rnbo_version: String,
    pub config_json: String,
    pub patcher_file_path: String,
    pub created_at: String,
}

/// Filenames orphaned by a `destroy`, for the caller to unlink.
pub struct OrphanedFiles {
    pub library_path: String,
    pub patcher_file_path: String,
}

pub struct PatcherQuery;

impl PatcherQuery {
    /// Insert a new patcher row, then copy forward presets from the previous
    /// row with the same name (if any) so upgrading a patcher's compiled
    /// library doesn't lose its saved presets.
    pub fn store(
        db: &Db,
        name: &str,
        library_path: &str,
        rnbo_version: &str,
        config_json: &str,
        patcher_file_path: &str,
    ) -> Result<i64, DbError> {
        db.with_conn(|conn| {
            let previous_id: Option<i64> = conn
                .query_row(
                    "SELECT id FROM patchers WHERE name = ?1 ORDER BY id DESC LIMIT 1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            conn.execute(
                "INSERT INTO patchers (name, library_path, rnbo_version, config_json, patcher_file_path, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))",
                params![name, library_path, rnbo_version, config_json, patcher_file_path],
            )?;
            let new_id = conn.last_insert_rowid();

            if let Some(prev_id) = previous_id {
                conn.execute(
                    "INSERT INTO presets (patcher_id, name, content, is_initial)
                     SELECT ?1, name, content, is_initial FROM presets WHERE patcher_id = ?2",
                    params![new_id, prev_id],
                )?;
            }

            Ok(new_id)
        })
    }

    pub fn get_latest_by_name(db: &Db, name: &str) -> Result<Option<PatcherRow>, DbError> {
        db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, name, library_path, rnbo_version, config_json, patcher_file_path, created_at
                 FROM patchers WHERE name = ?1 ORDER BY id DESC LIMIT 1",
                params![name],
                Self::row_from,
            )
            .optional()
            .map_err(DbError::from)
        })
    }

    pub fn name_by_ordinal(db: &Db, index: i64) -> Result<Option<String>, DbError> {
        db.with_conn(|conn| {
            conn.query_row(
                "SELECT DISTINCT name FROM patchers ORDER BY name LIMIT 1 OFFSET ?1",
                params![index],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
        })
    }

    pub fn rename(db: &Db, id: i64, new_name: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE patchers SET name = ?1 WHERE id = ?2",
                params![new_name, id],
            )?;
            Ok(())
        })
    }

    pub fn destroy(db: &Db, id: i64) -> Result<OrphanedFiles, DbError> {
        db.with_conn(|conn| {
            let files = conn.query_row(
                "SELECT library_path, patcher_file_path FROM patchers WHERE id = ?1",
                params![id],
                |row| {
                    Ok(OrphanedFiles {
                        library_path: row.get(0)?,
                        patcher_file_path: row.get(1)?,
                    })
                },
            )?;
            conn.execute("DELETE FROM patchers WHERE id = ?1", params![id])?;
            Ok(files)
        })
    }

    pub fn list_all(db: &Db) -> Result<Vec<PatcherRow>, DbError> {
        db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, library_path, rnbo_version, config_json, patcher_file_path, created_at
                 FROM patchers ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], Self::row_from)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    fn row_from(row: &rusqlite::Row) -> rusqlite::Result<PatcherRow> {
        Ok(PatcherRow {
            id: row.get(0)?,
            name: row.get(1)?,
            library_path: row.get(2)?,
            rnbo_version: row.get(3)?,
            config_json: row.get(4)?,
            patcher_file_path: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Db {
        Db::in_memory().unwrap()
    }

    #[test]
    fn store_and_get_latest() {
        let db = db();
        PatcherQuery::store(&db, "synth", "synth-v1.so", "1.0", "{}", "synth.json").unwrap();
        let latest = PatcherQuery::get_latest_by_name(&db, "synth").unwrap().unwrap();
        assert_eq!(latest.library_path, "synth-v1.so");
    }

    #[test]
    fn restore_carries_forward_presets() {
        let db = db();
        let id1 = PatcherQuery::store(&db, "synth", "synth-v1.so", "1.0", "{}", "synth.json").unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO presets (patcher_id, name, content) VALUES (?1, 'lead', '{}')",
                params![id1],
            )?;
            Ok(())
        })
        .unwrap();

        let id2 = PatcherQuery::store(&db, "synth", "synth-v2.so", "1.1", "{}", "synth.json").unwrap();
        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM presets WHERE patcher_id = ?1",
                    params![id2],
                    |r| r.get(0),
                )
                .map_err(DbError::from)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn name_by_ordinal_is_alphabetical() {
        let db = db();
        PatcherQuery::store(&db, "zeta", "z.so", "1.0", "{}", "z.json").unwrap();
        PatcherQuery::store(&db, "alpha", "a.so", "1.0", "{}", "a.json").unwrap();
        assert_eq!(
            PatcherQuery::name_by_ordinal(&db, 0).unwrap(),
            Some("alpha".to_string())
        );
        assert_eq!(
            PatcherQuery::name_by_ordinal(&db, 1).unwrap(),
            Some("zeta".to_string())
        );
    }

    #[test]
    fn destroy_returns_orphaned_filenames() {
        let db = db();
        let id = PatcherQuery::store(&db, "synth", "synth.so", "1.0", "{}", "synth.json").unwrap();
        let orphaned = PatcherQuery::destroy(&db, id).unwrap();
        assert_eq!(orphaned.library_path, "synth.so");
        assert!(PatcherQuery::get_latest_by_name(&db, "synth").unwrap().is_none());
    }
}
