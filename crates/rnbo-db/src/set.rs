//! Sets: named collections of instances and their inter-port connections.

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::DbError;
use crate::store::Db;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetInstance {
    pub instance_index: i64,
    pub patcher_name: String,
    pub config_json: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetConnection {
    pub source_name: String,
    pub source_instance_index: Option<i64>,
    pub dest_name: String,
    pub dest_instance_index: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSnapshot {
    pub meta: String,
    pub instances: Vec<SetInstance>,
    pub connections: Vec<SetConnection>,
}

pub struct SetQuery;

impl SetQuery {
    fn find_id(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<Option<i64>> {
        conn.query_row("SELECT id FROM sets WHERE name = ?1", params![name], |r| r.get(0))
            .optional()
    }

    /// Insert on first use, otherwise replace instance and connection rows
    /// transactionally (the set row itself, and its meta, are updated too).
    pub fn save(db: &Db, name: &str, snapshot: &SetSnapshot) -> Result<i64, DbError> {
        db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;

            let set_id = match Self::find_id(&tx, name)? {
                Some(id) => {
                    tx.execute("UPDATE sets SET meta = ?1 WHERE id = ?2", params![snapshot.meta, id])?;
                    tx.execute("DELETE FROM set_instances WHERE set_id = ?1", params![id])?;
                    tx.execute("DELETE FROM set_connections WHERE set_id = ?1", params![id])?;
                    id
                }
                None => {
                    tx.execute(
                        "INSERT INTO sets (name, meta, created_at) VALUES (?1, ?2, datetime('now'))",
                        params![name, snapshot.meta],
                    )?;
                    tx.last_insert_rowid()
                }
            };

            for inst in &snapshot.instances {
                tx.execute(
                    "INSERT INTO set_instances (set_id, instance_index, patcher_name, config_json, alias)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![set_id, inst.instance_index, inst.patcher_name, inst.config_json, inst.alias],
                )?;
            }
            for conn_row in &snapshot.connections {
                tx.execute(
                    "INSERT INTO set_connections (set_id, source_name, source_instance_index, dest_name, dest_instance_index)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        set_id,
                        conn_row.source_name,
                        conn_row.source_instance_index,
                        conn_row.dest_name,
                        conn_row.dest_instance_index
                    ],
                )?;
            }

            tx.commit()?;
            Ok(set_id)
        })
    }

    /// Returns instances and connections. Endpoint names are rewritten from
    /// the current patcher name whenever an endpoint's `instance_index`
    /// still matches one of this set's instances, so a renamed patcher's
    /// connections stay valid.
    pub fn get(db: &Db, name: &str) -> Result<Option<SetSnapshot>, DbError> {
        db.with_conn(|conn| {
            let set_id = match Self::find_id(conn, name)? {
                Some(id) => id,
                None => return Ok(None),
            };
            let meta: String = conn.query_row("SELECT meta FROM sets WHERE id = ?1", params![set_id], |r| r.get(0))?;

            let mut stmt = conn.prepare(
                "SELECT instance_index, patcher_name, config_json, alias FROM set_instances
                 WHERE set_id = ?1 ORDER BY instance_index",
            )?;
            let instances: Vec<SetInstance> = stmt
                .query_map(params![set_id], |row| {
                    Ok(SetInstance {
                        instance_index: row.get(0)?,
                        patcher_name: row.get(1)?,
                        config_json: row.get(2)?,
                        alias: row.get(3)?,
                    })
                })?
                .collect::<Result<_, _>>()?;

            let by_index: std::collections::HashMap<i64, &str> = instances
                .iter()
                .map(|i| (i.instance_index, i.patcher_name.as_str()))
                .collect();

            let mut stmt = conn.prepare(
                "SELECT source_name, source_instance_index, dest_name, dest_instance_index
                 FROM set_connections WHERE set_id = ?1",
            )?;
            let connections: Vec<SetConnection> = stmt
                .query_map(params![set_id], |row| {
                    Ok(SetConnection {
                        source_name: row.get(0)?,
                        source_instance_index: row.get(1)?,
                        dest_name: row.get(2)?,
                        dest_instance_index: row.get(3)?,
                    })
                })?
                .collect::<Result<_, _>>()?;

            let connections = connections
                .into_iter()
                .map(|mut c| {
                    if let Some(idx) = c.source_instance_index {
                        if let Some(patcher_name) = by_index.get(&idx) {
                            c.source_name = patcher_name.to_string();
                        }
                    }
                    if let Some(idx) = c.dest_instance_index {
                        if let Some(patcher_name) = by_index.get(&idx) {
                            c.dest_name = patcher_name.to_string();
                        }
                    }
                    c
                })
                .collect();

            Ok(Some(SetSnapshot { meta, instances, connections }))
        })
    }

    pub fn list(db: &Db) -> Result<Vec<String>, DbError> {
        db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM sets ORDER BY name")?;
            let rows = stmt.query_map([], |r| r.get(0))?.collect::<Result<_, _>>()?;
            Ok(rows)
        })
    }

    pub fn destroy(db: &Db, name: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute("DELETE FROM sets WHERE name = ?1", params![name])?;
            Ok(())
        })
    }

    pub fn rename(db: &Db, name: &str, new_name: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            conn.execute("UPDATE sets SET name = ?1 WHERE name = ?2", params![new_name, name])?;
            Ok(())
        })
    }

    /// Exactly one initial set.
    pub fn set_initial(db: &Db, name: &str) -> Result<(), DbError> {
        db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("UPDATE sets SET is_initial = 0", [])?;
            tx.execute("UPDATE sets SET is_initial = 1 WHERE name = ?1", params![name])?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn name_by_ordinal(db: &Db, index: i64) -> Result<Option<String>, DbError> {
        db.with_conn(|conn| {
            conn.query_row(
                "SELECT name FROM sets ORDER BY is_initial DESC, name ASC LIMIT 1 OFFSET ?1",
                params![index],
                |row| row.get(0),
            )
            .optional()
            .map_err(DbError::from)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SetSnapshot {
        SetSnapshot {
            meta: "{}".to_string(),
            instances: vec![SetInstance {
                instance_index: 0,
                patcher_name: "synth".to_string(),
                config_json: "{}".to_string(),
                alias: String::new(),
            }],
            connections: vec![SetConnection {
                source_name: "system:capture_1".to_string(),
                source_instance_index: None,
                dest_name: "synth".to_string(),
                dest_instance_index: Some(0),
            }],
        }
    }

    #[test]
    fn save_then_get_round_trips() {
        let db = Db::in_memory().unwrap();
        SetQuery::save(&db, "my-set", &sample()).unwrap();
        let loaded = SetQuery::get(&db, "my-set").unwrap().unwrap();
        assert_eq!(loaded.instances.len(), 1);
        assert_eq!(loaded.connections.len(), 1);
    }

    #[test]
    fn save_twice_replaces_rows() {
        let db = Db::in_memory().unwrap();
        SetQuery::save(&db, "my-set", &sample()).unwrap();
        let mut second = sample();
        second.instances.clear();
        SetQuery::save(&db, "my-set", &second).unwrap();
        let loaded = SetQuery::get(&db, "my-set").unwrap().unwrap();
        assert!(loaded.instances.is_empty());
    }

    #[test]
    fn get_rewrites_endpoint_names_from_current_patcher_name() {
        let db = Db::in_memory().unwrap();
        let mut snap = sample();
        snap.connections[0].dest_name = "stale-name".to_string();
        SetQuery::save(&db, "my-set", &snap).unwrap();
        let loaded = SetQuery::get(&db, "my-set").unwrap().unwrap();
        assert_eq!(loaded.connections[0].dest_name, "synth");
    }
}
