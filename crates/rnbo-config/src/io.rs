//! Generic JSON document load/save, generalized from the teacher's
//! YAML-specific `load_config`/`save_config` helpers.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Load a JSON document from `path`. Returns `Value::Null` (treated by
/// callers as "no document yet") if the file doesn't exist or fails to
/// parse.
pub fn load_document(path: &Path) -> Value {
    log::info!("load_document: loading from {:?}", path);

    if !path.exists() {
        log::info!("load_document: no existing config, starting empty");
        return Value::Null;
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Value>(&contents) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("load_document: failed to parse {:?}: {}, starting empty", path, e);
                Value::Null
            }
        },
        Err(e) => {
            log::warn!("load_document: failed to read {:?}: {}, starting empty", path, e);
            Value::Null
        }
    }
}

/// Save a JSON document to `path`, creating parent directories as needed.
pub fn save_document(doc: &Value, path: &Path) -> Result<()> {
    log::info!("save_document: saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory: {:?}", parent))?;
    }

    let text = serde_json::to_string_pretty(doc).context("failed to serialize config to JSON")?;
    std::fs::write(path, text).with_context(|| format!("failed to write config file: {:?}", path))?;

    log::info!("save_document: config saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn load_nonexistent_returns_null() {
        let doc = load_document(Path::new("/nonexistent/path/config.json"));
        assert!(doc.is_null());
    }

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let doc = json!({"jack": {"device": "hw:0"}});
        save_document(&doc, &path).unwrap();
        let loaded = load_document(&path);

        assert_eq!(loaded["jack"]["device"], "hw:0");
    }
}
