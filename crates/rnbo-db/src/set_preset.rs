//! Set-presets: named snapshots of the parameter state of every instance in a set.

use rusqlite::{params, OptionalExtension};

use crate::error::DbError;
use crate::set::SetQuery;
use crate::store::Db;

pub struct SetPresetQuery;

const INITIAL_NAME: &str = "initial";

impl SetPresetQuery {
    fn set_id(conn: &rusqlite::Connection, set_name: &str) -> rusqlite::Result<Option<i64>> {
        conn.query_row("SELECT id FROM sets WHERE name = ?1", params![set_name], |r| r.get(0))
            .optional()
    }

    /// Names, "initial" sorted first.
    pub fn list_names(db: &Db, set_name: &str) -> Result<Vec<String>, DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(Vec::new());
            };
            let mut stmt = conn.prepare(
                "SELECT DISTINCT name FROM set_presets WHERE set_id = ?1
                 ORDER BY CASE name WHEN ?2 THEN 0 ELSE 1 END, name ASC",
            )?;
            let rows = stmt
                .query_map(params![set_id, INITIAL_NAME], |r| r.get(0))?
                .collect::<Result<_, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_by_ordinal(db: &Db, set_name: &str, index: i64) -> Result<Option<String>, DbError> {
        let names = Self::list_names(db, set_name)?;
        Ok(names.into_iter().nth(index as usize))
    }

    /// Per-instance content for a named set-preset: `(instance_index, content)` pairs.
    pub fn get_content(db: &Db, set_name: &str, name: &str) -> Result<Vec<(i64, String)>, DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(Vec::new());
            };
            let mut stmt = conn.prepare(
                "SELECT instance_index, content FROM set_presets WHERE set_id = ?1 AND name = ?2",
            )?;
            let rows = stmt
                .query_map(params![set_id, name], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<_, _>>()?;
            Ok(rows)
        })
    }

    pub fn save(db: &Db, set_name: &str, instance_index: i64, name: &str, content: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            let set_id = Self::set_id(conn, set_name)?.ok_or_else(|| DbError::NotFound(set_name.to_string()))?;
            conn.execute(
                "INSERT INTO set_presets (set_id, instance_index, name, content) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(set_id, instance_index, name) DO UPDATE SET content = excluded.content",
                params![set_id, instance_index, name, content],
            )?;
            Ok(())
        })
    }

    pub fn rename(db: &Db, set_name: &str, name: &str, new_name: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(());
            };
            conn.execute(
                "UPDATE set_presets SET name = ?1 WHERE set_id = ?2 AND name = ?3",
                params![new_name, set_id, name],
            )?;
            Ok(())
        })
    }

    /// Destroy one named set-preset, or every set-preset in the set when
    /// `name` is `None`.
    pub fn destroy(db: &Db, set_name: &str, name: Option<&str>) -> Result<(), DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(());
            };
            match name {
                Some(name) => {
                    conn.execute(
                        "DELETE FROM set_presets WHERE set_id = ?1 AND name = ?2",
                        params![set_id, name],
                    )?;
                }
                None => {
                    conn.execute("DELETE FROM set_presets WHERE set_id = ?1", params![set_id])?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::{SetInstance, SetSnapshot};

    fn db_with_set() -> Db {
        let db = Db::in_memory().unwrap();
        SetQuery::save(
            &db,
            "my-set",
            &SetSnapshot {
                meta: "{}".to_string(),
                instances: vec![SetInstance {
                    instance_index: 0,
                    patcher_name: "synth".to_string(),
                    config_json: "{}".to_string(),
                    alias: String::new(),
                }],
                connections: vec![],
            },
        )
        .unwrap();
        db
    }

    #[test]
    fn initial_sorts_first() {
        let db = db_with_set();
        SetPresetQuery::save(&db, "my-set", 0, "zeta", "{}").unwrap();
        SetPresetQuery::save(&db, "my-set", 0, INITIAL_NAME, "{}").unwrap();
        let names = SetPresetQuery::list_names(&db, "my-set").unwrap();
        assert_eq!(names[0], INITIAL_NAME);
    }

    #[test]
    fn get_content_returns_per_instance_pairs() {
        let db = db_with_set();
        SetPresetQuery::save(&db, "my-set", 0, "live", "abc").unwrap();
        let content = SetPresetQuery::get_content(&db, "my-set", "live").unwrap();
        assert_eq!(content, vec![(0, "abc".to_string())]);
    }

    #[test]
    fn destroy_all_clears_every_preset() {
        let db = db_with_set();
        SetPresetQuery::save(&db, "my-set", 0, "a", "{}").unwrap();
        SetPresetQuery::save(&db, "my-set", 0, "b", "{}").unwrap();
        SetPresetQuery::destroy(&db, "my-set", None).unwrap();
        assert!(SetPresetQuery::list_names(&db, "my-set").unwrap().is_empty());
    }
}
