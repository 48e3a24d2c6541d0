//! Persisted OSC UDP listener set.

use rusqlite::params;

use crate::error::DbError;
use crate::store::Db;

#[derive(Debug, Clone, PartialEq)]
pub struct ListenerEntry {
    pub host: String,
    pub port: u16,
}

pub struct ListenerQuery;

impl ListenerQuery {
    pub fn exists(db: &Db, host: &str, port: u16) -> Result<bool, DbError> {
        db.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM listeners WHERE host = ?1 AND port = ?2",
                params![host, port],
                |r| r.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn add(db: &Db, host: &str, port: u16) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO listeners (host, port) VALUES (?1, ?2)",
                params![host, port],
            )?;
            Ok(())
        })
    }

    pub fn delete(db: &Db, host: &str, port: u16) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM listeners WHERE host = ?1 AND port = ?2",
                params![host, port],
            )?;
            Ok(())
        })
    }

    pub fn clear(db: &Db) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute("DELETE FROM listeners", [])?;
            Ok(())
        })
    }

    pub fn enumerate(db: &Db) -> Result<Vec<ListenerEntry>, DbError> {
        db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT host, port FROM listeners ORDER BY host, port")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(ListenerEntry {
                        host: row.get(0)?,
                        port: row.get::<_, i64>(1)? as u16,
                    })
                })?
                .collect::<Result<_, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_exists() {
        let db = Db::in_memory().unwrap();
        ListenerQuery::add(&db, "127.0.0.1", 9000).unwrap();
        assert!(ListenerQuery::exists(&db, "127.0.0.1", 9000).unwrap());
        assert!(!ListenerQuery::exists(&db, "127.0.0.1", 9001).unwrap());
    }

    #[test]
    fn clear_removes_everything() {
        let db = Db::in_memory().unwrap();
        ListenerQuery::add(&db, "a", 1).unwrap();
        ListenerQuery::add(&db, "b", 2).unwrap();
        ListenerQuery::clear(&db).unwrap();
        assert!(ListenerQuery::enumerate(&db).unwrap().is_empty());
    }
}
