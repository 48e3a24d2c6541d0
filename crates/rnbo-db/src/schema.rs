//! Schema migration ladder. Runs unconditionally on every open: the highest
//! applied id is read from `schema_migrations`, and any migration above it is
//! applied in increasing order inside its own transaction. Before applying
//! the first new migration a best-effort file backup is taken.

use std::path::Path;

use rusqlite::Connection;

use crate::error::DbError;

/// `(version, sql)` in strictly increasing order. Each entry is applied
/// verbatim inside its own transaction.
const MIGRATIONS: &[(i32, &str)] = &[
    (
        1,
        "CREATE TABLE patchers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            library_path TEXT NOT NULL,
            created_at TEXT NOT NULL
        );",
    ),
    (
        2,
        "CREATE TABLE presets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patcher_id INTEGER NOT NULL REFERENCES patchers(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            content TEXT NOT NULL,
            UNIQUE(patcher_id, name)
        );",
    ),
    (3, "ALTER TABLE presets ADD COLUMN is_initial INTEGER NOT NULL DEFAULT 0;"),
    (
        4,
        "CREATE TABLE sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            meta TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );",
    ),
    (5, "ALTER TABLE sets ADD COLUMN is_initial INTEGER NOT NULL DEFAULT 0;"),
    (
        6,
        "CREATE TABLE set_instances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_id INTEGER NOT NULL REFERENCES sets(id) ON DELETE CASCADE,
            instance_index INTEGER NOT NULL,
            patcher_name TEXT NOT NULL,
            config_json TEXT NOT NULL DEFAULT '{}',
            UNIQUE(set_id, instance_index)
        );",
    ),
    (
        7,
        "CREATE TABLE set_connections (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_id INTEGER NOT NULL REFERENCES sets(id) ON DELETE CASCADE,
            source_name TEXT NOT NULL,
            source_instance_index INTEGER,
            dest_name TEXT NOT NULL,
            dest_instance_index INTEGER
        );",
    ),
    (
        8,
        "CREATE TABLE set_presets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_id INTEGER NOT NULL REFERENCES sets(id) ON DELETE CASCADE,
            instance_index INTEGER NOT NULL,
            name TEXT NOT NULL,
            content TEXT NOT NULL,
            UNIQUE(set_id, instance_index, name)
        );",
    ),
    (
        9,
        "CREATE TABLE set_views (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_id INTEGER NOT NULL REFERENCES sets(id) ON DELETE CASCADE,
            sort_index INTEGER NOT NULL,
            name TEXT NOT NULL,
            params_json TEXT NOT NULL DEFAULT '[]'
        );",
    ),
    (
        10,
        "CREATE TABLE listeners (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            host TEXT NOT NULL,
            port INTEGER NOT NULL,
            UNIQUE(host, port)
        );",
    ),
    (
        11,
        "CREATE TABLE migration_markers (
            source_version TEXT PRIMARY KEY,
            migrated INTEGER NOT NULL DEFAULT 0
        );",
    ),
    (12, "ALTER TABLE patchers ADD COLUMN rnbo_version TEXT NOT NULL DEFAULT '';"),
    (13, "ALTER TABLE patchers ADD COLUMN config_json TEXT NOT NULL DEFAULT '{}';"),
    (14, "ALTER TABLE patchers ADD COLUMN patcher_file_path TEXT NOT NULL DEFAULT '';"),
    (15, "ALTER TABLE set_instances ADD COLUMN alias TEXT NOT NULL DEFAULT '';"),
    (16, "CREATE INDEX idx_presets_patcher_id ON presets(patcher_id);
          CREATE INDEX idx_set_instances_set_id ON set_instances(set_id);
          CREATE INDEX idx_set_connections_set_id ON set_connections(set_id);
          CREATE INDEX idx_set_presets_set_id ON set_presets(set_id);
          CREATE INDEX idx_set_views_set_id ON set_views(set_id);"),
];

fn current_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
        [],
    )?;
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
}

fn backup_db_file(db_path: &Path) -> std::io::Result<()> {
    if !db_path.exists() {
        return Ok(());
    }
    let backup_dir = db_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("backups");
    std::fs::create_dir_all(&backup_dir)?;
    let file_name = db_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "db".to_string());
    let dest = backup_dir.join(format!("{file_name}.bak"));
    std::fs::copy(db_path, dest)?;
    Ok(())
}

/// Apply every migration above the current schema version, in order. `None`
/// for `db_path` skips the file backup step (in-memory databases).
pub fn migrate(conn: &mut Connection, db_path: Option<&Path>) -> Result<(), DbError> {
    conn.execute("PRAGMA foreign_keys = ON;", [])?;

    let current = current_version(conn)?;
    let pending: Vec<&(i32, &str)> = MIGRATIONS.iter().filter(|(v, _)| *v > current).collect();

    if pending.is_empty() {
        return Ok(());
    }

    if let Some(path) = db_path {
        if let Err(e) = backup_db_file(path) {
            log::warn!("schema backup failed, proceeding anyway: {e}");
        }
    }

    for (version, sql) in pending {
        let tx = conn.transaction()?;
        tx.execute_batch(sql)
            .map_err(|e| DbError::Migration(format!("migration {version} failed: {e}")))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            rusqlite::params![version],
        )?;
        tx.commit()?;
        log::info!("applied schema migration {version}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrates_from_scratch_to_latest() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, None).unwrap();
        let v = current_version(&conn).unwrap();
        assert_eq!(v, 16);
    }

    #[test]
    fn migrate_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, None).unwrap();
        migrate(&mut conn, None).unwrap();
        let v = current_version(&conn).unwrap();
        assert_eq!(v, 16);
    }

    #[test]
    fn foreign_keys_cascade() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn, None).unwrap();
        conn.execute(
            "INSERT INTO patchers (name, library_path, created_at) VALUES ('p', 'lib.so', datetime('now'))",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO presets (patcher_id, name, content) VALUES (1, 'init', '{}')",
            [],
        )
        .unwrap();
        conn.execute("DELETE FROM patchers WHERE id = 1", []).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM presets", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
