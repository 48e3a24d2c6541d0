//! The `file_*` family: reads, writes, and lists addressed by
//! `FileCategory`. Synthetic categories (`patchers`, `sets`, `versions`, ...)
//! have no backing directory and are answered straight from the database or
//! the runner's own version strings.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use md5::{Digest, Md5};
use rnbo_config::paths;
use rnbo_db::{PatcherQuery, SetQuery};
use rnbo_proto::error::FileCommandError;
use rnbo_proto::FileCategory;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CommandError;

use super::Controller;

#[derive(Deserialize)]
struct FileParams {
    category: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    content: String,
}

impl Controller {
    fn category_dir(&self, category: FileCategory) -> Option<&Path> {
        match category {
            FileCategory::DataFile => Some(&self.datafile_dir),
            FileCategory::SourceFile | FileCategory::PatcherFile => Some(&self.source_dir),
            FileCategory::PatcherLib => Some(&self.patcher_lib_dir),
            FileCategory::Set => Some(&self.save_dir),
            FileCategory::Package => Some(&self.package_dir),
            _ => None,
        }
    }

    fn resolve_path(&self, category: FileCategory, filename: &str) -> Result<PathBuf, CommandError> {
        let dir = self
            .category_dir(category)
            .ok_or_else(|| CommandError::File(FileCommandError::UnknownCategory(category.to_string())))?;
        let candidate = dir.join(filename);
        if !paths::is_within(dir, &candidate) {
            return Err(CommandError::File(FileCommandError::PathEscape(filename.to_string())));
        }
        Ok(candidate)
    }

    pub fn file_write(&self, params: Value) -> Result<Value, CommandError> {
        let params: FileParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed file_write params: {e}")))?;
        let category = FileCategory::from_str(&params.category).map_err(FileCommandError::UnknownCategory)?;
        if !category.is_writable() {
            return Err(CommandError::File(FileCommandError::UnknownCategory(params.category)));
        }
        let path = self.resolve_path(category, &params.filename)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FileCommandError::Io(e.to_string()))?;
        }
        std::fs::write(&path, params.content.as_bytes()).map_err(|e| FileCommandError::Io(e.to_string()))?;
        Ok(json!({ "path": path.to_string_lossy() }))
    }

    /// Same as `file_write`, but `content` is base64-encoded binary -- used
    /// for patcher libraries and other non-text payloads.
    pub fn file_write_extended(&self, params: Value) -> Result<Value, CommandError> {
        let params: FileParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed file_write_extended params: {e}")))?;
        let category = FileCategory::from_str(&params.category).map_err(FileCommandError::UnknownCategory)?;
        if !category.is_writable() {
            return Err(CommandError::File(FileCommandError::UnknownCategory(params.category)));
        }
        let bytes = BASE64.decode(params.content.as_bytes()).map_err(|e| FileCommandError::Io(e.to_string()))?;
        let path = self.resolve_path(category, &params.filename)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FileCommandError::Io(e.to_string()))?;
        }
        std::fs::write(&path, &bytes).map_err(|e| FileCommandError::Io(e.to_string()))?;
        Ok(json!({ "path": path.to_string_lossy() }))
    }

    pub fn file_read(&self, params: Value) -> Result<Value, CommandError> {
        let params: FileParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed file_read params: {e}")))?;
        let category = FileCategory::from_str(&params.category).map_err(FileCommandError::UnknownCategory)?;

        if let Some(listing) = self.synthetic_listing(category, &params.filename)? {
            return Ok(listing);
        }

        let path = self.resolve_path(category, &params.filename)?;
        let content = std::fs::read_to_string(&path).map_err(|_| FileCommandError::NotFound(params.filename))?;
        Ok(json!({ "content": content }))
    }

    /// Base64-encoded contents, for binary categories such as `patcherlib`.
    pub fn file_read64(&self, params: Value) -> Result<Value, CommandError> {
        let params: FileParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed file_read64 params: {e}")))?;
        let category = FileCategory::from_str(&params.category).map_err(FileCommandError::UnknownCategory)?;
        let path = self.resolve_path(category, &params.filename)?;
        let bytes = std::fs::read(&path).map_err(|_| FileCommandError::NotFound(params.filename))?;
        let mut hasher = Md5::new();
        hasher.update(&bytes);
        let checksum = format!("{:x}", hasher.finalize());
        Ok(json!({ "content": BASE64.encode(&bytes), "md5": checksum }))
    }

    pub fn file_delete(&self, params: Value) -> Result<Value, CommandError> {
        let params: FileParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed file_delete params: {e}")))?;
        let category = FileCategory::from_str(&params.category).map_err(FileCommandError::UnknownCategory)?;
        if !category.is_writable() {
            return Err(CommandError::File(FileCommandError::UnknownCategory(params.category)));
        }
        let path = self.resolve_path(category, &params.filename)?;
        std::fs::remove_file(&path).map_err(|_| FileCommandError::NotFound(params.filename))?;
        Ok(json!({}))
    }

    pub fn file_exists(&self, params: Value) -> Result<Value, CommandError> {
        let params: FileParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed file_exists params: {e}")))?;
        let category = FileCategory::from_str(&params.category).map_err(FileCommandError::UnknownCategory)?;
        let exists = match self.category_dir(category) {
            Some(_) => self.resolve_path(category, &params.filename)?.exists(),
            None => false,
        };
        Ok(json!({ "exists": exists }))
    }

    /// Answers the read-only, not-disk-backed categories directly from the
    /// database. Returns `None` for every on-disk category, so the caller
    /// falls through to reading an actual file.
    fn synthetic_listing(&self, category: FileCategory, filename: &str) -> Result<Option<Value>, CommandError> {
        let value = match category {
            FileCategory::Patchers => {
                let names: Vec<String> = PatcherQuery::list_all(&self.db)?.into_iter().map(|r| r.name).collect();
                json!({ "patchers": names })
            }
            FileCategory::Sets => json!({ "sets": SetQuery::list(&self.db)? }),
            FileCategory::Patcher => {
                let row = PatcherQuery::get_latest_by_name(&self.db, filename)?
                    .ok_or_else(|| CommandError::File(FileCommandError::NotFound(filename.to_string())))?;
                json!({ "name": row.name, "rnbo_version": row.rnbo_version, "created_at": row.created_at })
            }
            FileCategory::PatcherConfig => {
                let row = PatcherQuery::get_latest_by_name(&self.db, filename)?
                    .ok_or_else(|| CommandError::File(FileCommandError::NotFound(filename.to_string())))?;
                json!({ "config": row.config_json })
            }
            FileCategory::Presets => {
                let row = PatcherQuery::get_latest_by_name(&self.db, filename)?
                    .ok_or_else(|| CommandError::File(FileCommandError::NotFound(filename.to_string())))?;
                let names: Vec<String> = rnbo_db::PresetQuery::list(&self.db, row.id)?.into_iter().map(|p| p.name).collect();
                json!({ "presets": names })
            }
            FileCategory::Versions => json!({ "rnbo_version": self.rnbo_version, "runner_version": self.runner_version }),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}
