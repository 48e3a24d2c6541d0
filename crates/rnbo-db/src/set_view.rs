//! Set-views: ordered projections of parameters from instances in a set,
//! for UI consumption.

use rusqlite::{params, OptionalExtension};

use crate::error::DbError;
use crate::store::Db;

#[derive(Debug, Clone, PartialEq)]
pub struct SetView {
    pub sort_index: i64,
    pub name: String,
    pub params_json: String,
}

pub struct SetViewQuery;

impl SetViewQuery {
    fn set_id(conn: &rusqlite::Connection, set_name: &str) -> rusqlite::Result<Option<i64>> {
        conn.query_row("SELECT id FROM sets WHERE name = ?1", params![set_name], |r| r.get(0))
            .optional()
    }

    pub fn indexes(db: &Db, set_name: &str) -> Result<Vec<i64>, DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(Vec::new());
            };
            let mut stmt = conn.prepare(
                "SELECT sort_index FROM set_views WHERE set_id = ?1 ORDER BY sort_index",
            )?;
            let rows = stmt.query_map(params![set_id], |r| r.get(0))?.collect::<Result<_, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_by_index(db: &Db, set_name: &str, sort_index: i64) -> Result<Option<SetView>, DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(None);
            };
            conn.query_row(
                "SELECT sort_index, name, params_json FROM set_views WHERE set_id = ?1 AND sort_index = ?2",
                params![set_id, sort_index],
                Self::row_from,
            )
            .optional()
            .map_err(DbError::from)
        })
    }

    /// Creates a view. With `sort_index = None`, auto-assigns the next index
    /// (one past the current maximum).
    pub fn create(db: &Db, set_name: &str, sort_index: Option<i64>, name: &str, params_json: &str) -> Result<i64, DbError> {
        db.with_conn(|conn| {
            let set_id = Self::set_id(conn, set_name)?.ok_or_else(|| DbError::NotFound(set_name.to_string()))?;
            let index = match sort_index {
                Some(i) => i,
                None => {
                    let max: Option<i64> = conn.query_row(
                        "SELECT MAX(sort_index) FROM set_views WHERE set_id = ?1",
                        params![set_id],
                        |r| r.get(0),
                    )?;
                    max.map(|m| m + 1).unwrap_or(0)
                }
            };
            conn.execute(
                "INSERT INTO set_views (set_id, sort_index, name, params_json) VALUES (?1, ?2, ?3, ?4)",
                params![set_id, index, name, params_json],
            )?;
            Ok(index)
        })
    }

    pub fn update_params(db: &Db, set_name: &str, sort_index: i64, params_json: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(());
            };
            conn.execute(
                "UPDATE set_views SET params_json = ?1 WHERE set_id = ?2 AND sort_index = ?3",
                params![params_json, set_id, sort_index],
            )?;
            Ok(())
        })
    }

    pub fn update_name(db: &Db, set_name: &str, sort_index: i64, new_name: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(());
            };
            conn.execute(
                "UPDATE set_views SET name = ?1 WHERE set_id = ?2 AND sort_index = ?3",
                params![new_name, set_id, sort_index],
            )?;
            Ok(())
        })
    }

    /// Destroy one view, or every view in the set when `sort_index` is `None`.
    pub fn destroy(db: &Db, set_name: &str, sort_index: Option<i64>) -> Result<(), DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(());
            };
            match sort_index {
                Some(idx) => {
                    conn.execute(
                        "DELETE FROM set_views WHERE set_id = ?1 AND sort_index = ?2",
                        params![set_id, idx],
                    )?;
                }
                None => {
                    conn.execute("DELETE FROM set_views WHERE set_id = ?1", params![set_id])?;
                }
            }
            Ok(())
        })
    }

    /// Reorders views to match `new_order` (a permutation of sort indexes).
    /// Returns whether the stored order actually changed.
    pub fn update_sort_order(db: &Db, set_name: &str, new_order: &[i64]) -> Result<bool, DbError> {
        db.with_conn(|conn| {
            let Some(set_id) = Self::set_id(conn, set_name)? else {
                return Ok(false);
            };
            let mut stmt = conn.prepare(
                "SELECT sort_index FROM set_views WHERE set_id = ?1 ORDER BY sort_index",
            )?;
            let current: Vec<i64> = stmt.query_map(params![set_id], |r| r.get(0))?.collect::<Result<_, _>>()?;
            if current == new_order {
                return Ok(false);
            }

            let tx = conn.unchecked_transaction()?;
            // Shift into a disjoint range first to avoid UNIQUE collisions mid-reorder.
            for (new_pos, old_index) in new_order.iter().enumerate() {
                tx.execute(
                    "UPDATE set_views SET sort_index = ?1 WHERE set_id = ?2 AND sort_index = ?3",
                    params![-(new_pos as i64) - 1, set_id, old_index],
                )?;
            }
            for new_pos in 0..new_order.len() as i64 {
                tx.execute(
                    "UPDATE set_views SET sort_index = ?1 WHERE set_id = ?2 AND sort_index = ?3",
                    params![new_pos, set_id, -new_pos - 1],
                )?;
            }
            tx.commit()?;
            Ok(true)
        })
    }

    pub fn copy_all(db: &Db, from_set: &str, to_set: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            let from_id = Self::set_id(conn, from_set)?;
            let to_id = Self::set_id(conn, to_set)?;
            let (Some(from_id), Some(to_id)) = (from_id, to_id) else {
                return Ok(());
            };
            conn.execute(
                "INSERT INTO set_views (set_id, sort_index, name, params_json)
                 SELECT ?1, sort_index, name, params_json FROM set_views WHERE set_id = ?2",
                params![to_id, from_id],
            )?;
            Ok(())
        })
    }

    fn row_from(row: &rusqlite::Row) -> rusqlite::Result<SetView> {
        Ok(SetView {
            sort_index: row.get(0)?,
            name: row.get(1)?,
            params_json: row.get(2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::set::{SetQuery, SetSnapshot};

    fn db_with_sets() -> Db {
        let db = Db::in_memory().unwrap();
        SetQuery::save(&db, "a", &SetSnapshot { meta: "{}".into(), instances: vec![], connections: vec![] }).unwrap();
        SetQuery::save(&db, "b", &SetSnapshot { meta: "{}".into(), instances: vec![], connections: vec![] }).unwrap();
        db
    }

    #[test]
    fn create_auto_assigns_next_index() {
        let db = db_with_sets();
        let i0 = SetViewQuery::create(&db, "a", None, "view1", "[]").unwrap();
        let i1 = SetViewQuery::create(&db, "a", None, "view2", "[]").unwrap();
        assert_eq!(i0, 0);
        assert_eq!(i1, 1);
    }

    #[test]
    fn sort_order_update_detects_no_op() {
        let db = db_with_sets();
        SetViewQuery::create(&db, "a", None, "view1", "[]").unwrap();
        SetViewQuery::create(&db, "a", None, "view2", "[]").unwrap();
        let changed = SetViewQuery::update_sort_order(&db, "a", &[0, 1]).unwrap();
        assert!(!changed);
        let changed = SetViewQuery::update_sort_order(&db, "a", &[1, 0]).unwrap();
        assert!(changed);
        let names: Vec<String> = SetViewQuery::indexes(&db, "a")
            .unwrap()
            .into_iter()
            .map(|i| SetViewQuery::get_by_index(&db, "a", i).unwrap().unwrap().name)
            .collect();
        assert_eq!(names, vec!["view2", "view1"]);
    }

    #[test]
    fn copy_all_duplicates_views_into_destination_set() {
        let db = db_with_sets();
        SetViewQuery::create(&db, "a", None, "view1", "[1,2]").unwrap();
        SetViewQuery::copy_all(&db, "a", "b").unwrap();
        let copied = SetViewQuery::get_by_index(&db, "b", 0).unwrap().unwrap();
        assert_eq!(copied.name, "view1");
    }
}
