//! Preset save/load against the persistence store, plus the async
//! save-completion handoff from the DSP's serialize callback.

use rnbo_db::{Db, PatcherQuery, PresetQuery, SetPresetQuery};

use crate::error::InstanceError;

/// `{param_index: value}` snapshot of every parameter on an instance.
pub type PresetContent = serde_json::Value;

pub struct PresetStore;

impl PresetStore {
    pub fn save_patcher_preset(
        db: &Db,
        patcher_id: i64,
        name: &str,
        content: &PresetContent,
    ) -> Result<(), InstanceError> {
        let text = serde_json::to_string(content)?;
        PresetQuery::save(db, patcher_id, name, &text)?;
        Ok(())
    }

    /// `loadPreset(name[, set_name])`: resolve from the set-preset table if
    /// `set_name` is given and an entry matches `instance_index`, else fall
    /// back to the patcher preset table.
    pub fn resolve(
        db: &Db,
        patcher_name: &str,
        instance_index: i64,
        name: &str,
        set_name: Option<&str>,
    ) -> Result<PresetContent, InstanceError> {
        if let Some(set_name) = set_name {
            let content = SetPresetQuery::get_content(db, set_name, name)?;
            if let Some((_, raw)) = content.into_iter().find(|(idx, _)| *idx == instance_index) {
                return Ok(serde_json::from_str(&raw)?);
            }
        }

        let patcher = PatcherQuery::get_latest_by_name(db, patcher_name)?
            .ok_or_else(|| InstanceError::PresetNotFound(patcher_name.to_string()))?;
        let raw = PresetQuery::get_by_name(db, patcher.id, name)?
            .ok_or_else(|| InstanceError::PresetNotFound(name.to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_falls_back_to_patcher_preset_when_no_set_entry() {
        let db = Db::in_memory().unwrap();
        let patcher_id = PatcherQuery::store(&db, "synth", "synth.so", "1.0", "{}", "synth.json").unwrap();
        PresetStore::save_patcher_preset(&db, patcher_id, "lead", &json!({"gain": 0.5})).unwrap();

        let resolved = PresetStore::resolve(&db, "synth", 0, "lead", Some("no-such-set")).unwrap();
        assert_eq!(resolved["gain"], 0.5);
    }

    #[test]
    fn missing_preset_is_an_error() {
        let db = Db::in_memory().unwrap();
        PatcherQuery::store(&db, "synth", "synth.so", "1.0", "{}", "synth.json").unwrap();
        let result = PresetStore::resolve(&db, "synth", 0, "nope", None);
        assert!(matches!(result, Err(InstanceError::PresetNotFound(_))));
    }
}
