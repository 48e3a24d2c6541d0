//! A process-wide JSON config document: reads return an optional value,
//! writes mark the document dirty and schedule a debounced flush.
//!
//! Debounce/dirty-flag mechanics follow the runner's `Config::write_if_dirty`:
//! a write doesn't hit disk immediately, it waits for the store to go quiet
//! for the debounce window, then the dispatcher's periodic tick flushes it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::Value;

use crate::io::{load_document, save_document};
use crate::paths;

const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(1);

pub struct ConfigStore {
    path: PathBuf,
    debounce: Duration,
    doc: Mutex<Value>,
    dirty: AtomicBool,
    dirty_since: Mutex<Option<Instant>>,
}

impl ConfigStore {
    pub fn open(path: PathBuf) -> Self {
        let doc = load_document(&path);
        Self {
            path,
            debounce: DEFAULT_DEBOUNCE,
            doc: Mutex::new(if doc.is_null() { Value::Object(Default::default()) } else { doc }),
            dirty: AtomicBool::new(false),
            dirty_since: Mutex::new(None),
        }
    }

    pub fn open_default() -> Self {
        Self::open(paths::default_config_path())
    }

    /// Read a dotted key path (e.g. `"jack.device"`), or a bare key.
    pub fn get(&self, key: &str) -> Option<Value> {
        let doc = self.doc.lock().unwrap();
        let mut cur = &*doc;
        for part in key.split('.') {
            cur = cur.get(part)?;
        }
        Some(cur.clone())
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(String::from))
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    /// Write a dotted key path, creating intermediate objects as needed, and
    /// mark the document dirty for a future debounced flush.
    pub fn set(&self, key: &str, value: Value) {
        let mut doc = self.doc.lock().unwrap();
        if !doc.is_object() {
            *doc = Value::Object(Default::default());
        }
        let parts: Vec<&str> = key.split('.').collect();
        let mut cur = &mut *doc;
        for part in &parts[..parts.len() - 1] {
            let entry = cur
                .as_object_mut()
                .unwrap()
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
            if !entry.is_object() {
                *entry = Value::Object(Default::default());
            }
            cur = entry;
        }
        cur.as_object_mut()
            .unwrap()
            .insert((*parts.last().unwrap()).to_string(), value);
        drop(doc);
        self.mark_dirty();
    }

    fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
        *self.dirty_since.lock().unwrap() = Some(Instant::now());
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Called from the dispatcher's periodic tick. Flushes to disk only once
    /// the document has been quiet for the debounce window.
    pub fn write_if_dirty(&self) -> Result<bool> {
        if !self.dirty.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let ready = {
            let since = self.dirty_since.lock().unwrap();
            match *since {
                Some(t) => t.elapsed() >= self.debounce,
                None => false,
            }
        };
        if !ready {
            return Ok(false);
        }
        let doc = self.doc.lock().unwrap().clone();
        save_document(&doc, &self.path)?;
        self.dirty.store(false, Ordering::SeqCst);
        *self.dirty_since.lock().unwrap() = None;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read the persisted first-run identifier, generating and persisting one if
/// this is the first start.
pub fn get_or_create_system_id(path: &Path) -> Result<uuid::Uuid> {
    if let Ok(contents) = std::fs::read_to_string(path) {
        if let Ok(id) = uuid::Uuid::parse_str(contents.trim()) {
            return Ok(id);
        }
    }
    let id = uuid::Uuid::new_v4();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, id.to_string())?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_on_missing_key_is_none() {
        let store = ConfigStore::open(std::env::temp_dir().join("nonexistent-rnbo-config.json"));
        assert_eq!(store.get("jack.device"), None);
    }

    #[test]
    fn set_then_get_nested() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("config.json"));
        store.set("jack.device", json!("hw:0"));
        assert_eq!(store.get_str("jack.device").as_deref(), Some("hw:0"));
        assert!(store.is_dirty());
    }

    #[test]
    fn write_if_dirty_waits_for_debounce() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore {
            path: path.clone(),
            debounce: Duration::from_millis(20),
            doc: Mutex::new(Value::Object(Default::default())),
            dirty: AtomicBool::new(false),
            dirty_since: Mutex::new(None),
        };
        store.set("foo", json!(1));
        assert!(!store.write_if_dirty().unwrap());
        std::thread::sleep(Duration::from_millis(30));
        assert!(store.write_if_dirty().unwrap());
        assert!(path.exists());
        assert!(!store.is_dirty());
    }

    #[test]
    fn system_id_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runner-id.txt");
        let id1 = get_or_create_system_id(&path).unwrap();
        let id2 = get_or_create_system_id(&path).unwrap();
        assert_eq!(id1, id2);
    }
}
