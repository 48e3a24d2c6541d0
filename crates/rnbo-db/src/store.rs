//! Connection wrapper. Every public method on the per-entity query structs
//! takes `&Db` and serializes through this single mutex.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::error::DbError;
use crate::schema;

/// Cheaply cloneable: every clone shares the same connection behind its
/// mutex, so a preset-save worker thread can hold one of its own without a
/// second `sqlite` connection being opened.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl Db {
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let mut conn = Connection::open(path).map_err(|e| DbError::Open(e.to_string()))?;
        schema::migrate(&mut conn, Some(path))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> Result<Self, DbError> {
        let mut conn = Connection::open_in_memory().map_err(|e| DbError::Open(e.to_string()))?;
        schema::migrate(&mut conn, None)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
        })
    }

    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T, DbError>) -> Result<T, DbError> {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_and_migrates() {
        let db = Db::in_memory().unwrap();
        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |r| r.get(0))
                    .map_err(DbError::from)
            })
            .unwrap();
        assert_eq!(count, 16);
    }

    #[test]
    fn opens_file_backed_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rnbo.sqlite");
        {
            let _db = Db::open(&path).unwrap();
        }
        let db = Db::open(&path).unwrap();
        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |r| r.get(0))
                    .map_err(DbError::from)
            })
            .unwrap();
        assert_eq!(count, 16);
    }
}
