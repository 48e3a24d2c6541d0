//! Per-patcher presets.

use rusqlite::{params, OptionalExtension};

use crate::error::DbError;
use crate::store::Db;

#[derive(Debug, Clone, PartialEq)]
pub struct PresetSummary {
    pub name: String,
    pub is_initial: bool,
}

pub struct PresetQuery;

impl PresetQuery {
    /// Names and the initial flag, initial first then alphabetical.
    pub fn list(db: &Db, patcher_id: i64) -> Result<Vec<PresetSummary>, DbError> {
        db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, is_initial FROM presets WHERE patcher_id = ?1
                 ORDER BY is_initial DESC, name ASC",
            )?;
            let rows = stmt
                .query_map(params![patcher_id], |row| {
                    Ok(PresetSummary {
                        name: row.get(0)?,
                        is_initial: row.get::<_, i64>(1)? != 0,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_by_name(db: &Db, patcher_id: i64, name: &str) -> Result<Option<String>, DbError> {
        db.with_conn(|conn| {
            conn.query_row(
                "SELECT content FROM presets WHERE patcher_id = ?1 AND name = ?2",
                params![patcher_id, name],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
        })
    }

    /// Ordinal lookup: initial first, then alphabetical, matching `list`'s order.
    pub fn get_by_ordinal(db: &Db, patcher_id: i64, index: i64) -> Result<Option<(String, String)>, DbError> {
        db.with_conn(|conn| {
            conn.query_row(
                "SELECT name, content FROM presets WHERE patcher_id = ?1
                 ORDER BY is_initial DESC, name ASC LIMIT 1 OFFSET ?2",
                params![patcher_id, index],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(DbError::from)
        })
    }

    pub fn save(db: &Db, patcher_id: i64, name: &str, content: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO presets (patcher_id, name, content) VALUES (?1, ?2, ?3)
                 ON CONFLICT(patcher_id, name) DO UPDATE SET content = excluded.content",
                params![patcher_id, name, content],
            )?;
            Ok(())
        })
    }

    pub fn rename(db: &Db, patcher_id: i64, name: &str, new_name: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE presets SET name = ?1 WHERE patcher_id = ?2 AND name = ?3",
                params![new_name, patcher_id, name],
            )?;
            Ok(())
        })
    }

    /// Exactly one initial preset per patcher: clear any existing flag first.
    pub fn set_initial(db: &Db, patcher_id: i64, name: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "UPDATE presets SET is_initial = 0 WHERE patcher_id = ?1",
                params![patcher_id],
            )?;
            tx.execute(
                "UPDATE presets SET is_initial = 1 WHERE patcher_id = ?1 AND name = ?2",
                params![patcher_id, name],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn destroy(db: &Db, patcher_id: i64, name: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM presets WHERE patcher_id = ?1 AND name = ?2",
                params![patcher_id, name],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patcher::PatcherQuery;

    fn db_with_patcher() -> (Db, i64) {
        let db = Db::in_memory().unwrap();
        let id = PatcherQuery::store(&db, "synth", "synth.so", "1.0", "{}", "synth.json").unwrap();
        (db, id)
    }

    #[test]
    fn save_and_get_by_name() {
        let (db, id) = db_with_patcher();
        PresetQuery::save(&db, id, "lead", "{\"a\":1}").unwrap();
        assert_eq!(PresetQuery::get_by_name(&db, id, "lead").unwrap().unwrap(), "{\"a\":1}");
    }

    #[test]
    fn list_orders_initial_first_then_alphabetical() {
        let (db, id) = db_with_patcher();
        PresetQuery::save(&db, id, "zeta", "{}").unwrap();
        PresetQuery::save(&db, id, "alpha", "{}").unwrap();
        PresetQuery::set_initial(&db, id, "zeta").unwrap();

        let names: Vec<String> = PresetQuery::list(&db, id).unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn set_initial_is_exclusive() {
        let (db, id) = db_with_patcher();
        PresetQuery::save(&db, id, "a", "{}").unwrap();
        PresetQuery::save(&db, id, "b", "{}").unwrap();
        PresetQuery::set_initial(&db, id, "a").unwrap();
        PresetQuery::set_initial(&db, id, "b").unwrap();

        let list = PresetQuery::list(&db, id).unwrap();
        let initial_count = list.iter().filter(|p| p.is_initial).count();
        assert_eq!(initial_count, 1);
    }

    #[test]
    fn ordinal_matches_list_order() {
        let (db, id) = db_with_patcher();
        PresetQuery::save(&db, id, "b", "content-b").unwrap();
        PresetQuery::save(&db, id, "a", "content-a").unwrap();
        let (name, content) = PresetQuery::get_by_ordinal(&db, id, 0).unwrap().unwrap();
        assert_eq!(name, "a");
        assert_eq!(content, "content-a");
    }
}
