//! Sets, set-presets, and set-views: the `instance_set_*` family.

use rnbo_db::{SetConnection, SetInstance, SetPresetQuery, SetQuery, SetSnapshot, SetViewQuery};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CommandError;

use super::{Controller, UNTITLED_SET};

#[derive(Deserialize)]
struct NameParams {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct RenameParams {
    name: String,
    new_name: String,
}

#[derive(Deserialize)]
struct SetPresetParams {
    #[serde(default)]
    set_name: Option<String>,
    name: String,
}

#[derive(Deserialize)]
struct SetPresetRenameParams {
    #[serde(default)]
    set_name: Option<String>,
    name: String,
    new_name: String,
}

#[derive(Deserialize)]
struct SetViewCreateParams {
    #[serde(default)]
    set_name: Option<String>,
    name: String,
    #[serde(default)]
    sort_index: Option<i64>,
    #[serde(default)]
    params_json: String,
}

#[derive(Deserialize)]
struct SetViewIndexParams {
    #[serde(default)]
    set_name: Option<String>,
    #[serde(default)]
    sort_index: Option<i64>,
}

#[derive(Deserialize)]
struct SetViewOrderParams {
    #[serde(default)]
    set_name: Option<String>,
    order: Vec<i64>,
}

impl Controller {
    /// Snapshots every live instance's identity into a named set. Port
    /// connections aren't introspected from the live JACK graph here -- a
    /// saved set always has an empty connection list.
    pub fn instance_set_save(&self, params: Value) -> Result<Value, CommandError> {
        let params: NameParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_save params: {e}")))?;
        let name = params.name.unwrap_or_else(|| UNTITLED_SET.to_string());

        let instances: Vec<SetInstance> = self
            .instances
            .lock()
            .unwrap()
            .values()
            .map(|inst| SetInstance {
                instance_index: inst.index,
                patcher_name: inst.name.clone(),
                config_json: "{}".to_string(),
                alias: inst.alias(),
            })
            .collect();

        let snapshot = SetSnapshot { meta: "{}".to_string(), instances, connections: Vec::<SetConnection>::new() };
        SetQuery::save(&self.db, &name, &snapshot)?;
        *self.current_set.lock().unwrap() = name.clone();
        Ok(json!({ "name": name }))
    }

    /// Unloads every currently running instance and reloads the named set's
    /// instances in its place.
    pub fn instance_set_load(&self, params: Value) -> Result<Value, CommandError> {
        let params: NameParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_load params: {e}")))?;
        let name = params.name.unwrap_or_else(|| UNTITLED_SET.to_string());

        let snapshot = SetQuery::get(&self.db, &name)?.ok_or_else(|| CommandError::Other(format!("set not found: {name}")))?;

        self.instance_unload(json!({ "index": -1 }))?;

        let mut loaded = Vec::new();
        for inst in &snapshot.instances {
            let load_params = json!({ "name": inst.patcher_name, "index": inst.instance_index });
            let result = self.instance_load(load_params)?;
            if !inst.alias.is_empty() {
                if let Some(instance) = self.instances.lock().unwrap().get(&inst.instance_index) {
                    instance.set_alias(inst.alias.clone());
                }
            }
            loaded.push(result);
        }
        *self.current_set.lock().unwrap() = name.clone();
        Ok(json!({ "name": name, "instances": loaded }))
    }

    pub fn instance_set_delete(&self, params: Value) -> Result<Value, CommandError> {
        let params: NameParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_delete params: {e}")))?;
        let name = params.name.unwrap_or_else(|| UNTITLED_SET.to_string());
        SetQuery::destroy(&self.db, &name)?;
        Ok(json!({}))
    }

    pub fn instance_set_rename(&self, params: Value) -> Result<Value, CommandError> {
        let params: RenameParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_rename params: {e}")))?;
        SetQuery::rename(&self.db, &params.name, &params.new_name)?;
        Ok(json!({}))
    }

    pub fn instance_set_initial(&self, params: Value) -> Result<Value, CommandError> {
        let params: NameParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_initial params: {e}")))?;
        let name = params.name.unwrap_or_else(|| UNTITLED_SET.to_string());
        SetQuery::set_initial(&self.db, &name)?;
        Ok(json!({}))
    }

    /// Saves the current parameter state of every live instance as one named
    /// set-preset entry per instance.
    pub fn instance_set_preset_save(&self, params: Value) -> Result<Value, CommandError> {
        let params: SetPresetParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_preset_save params: {e}")))?;
        let set_name = params.set_name.unwrap_or_else(|| UNTITLED_SET.to_string());

        let instances = self.instances.lock().unwrap();
        for (index, instance) in instances.iter() {
            let mut content = serde_json::Map::new();
            for i in 0..instance.patcher().param_count() {
                content.insert(i.to_string(), json!(instance.patcher().get_param(i)));
            }
            let content = serde_json::Value::Object(content).to_string();
            SetPresetQuery::save(&self.db, &set_name, *index, &params.name, &content)?;
        }
        Ok(json!({ "set_name": set_name, "name": params.name }))
    }

    /// Applies a named set-preset's per-instance content to every currently
    /// matching live instance.
    pub fn instance_set_preset_load(&self, params: Value) -> Result<Value, CommandError> {
        let params: SetPresetParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_preset_load params: {e}")))?;
        let set_name = params.set_name.unwrap_or_else(|| UNTITLED_SET.to_string());

        let content = SetPresetQuery::get_content(&self.db, &set_name, &params.name)?;
        let instances = self.instances.lock().unwrap();
        for (index, text) in &content {
            let Some(instance) = instances.get(index) else { continue };
            let Ok(parsed) = serde_json::from_str::<serde_json::Value>(text) else { continue };
            let Some(map) = parsed.as_object() else { continue };
            for (key, value) in map {
                if let (Ok(param_index), Some(v)) = (key.parse::<usize>(), value.as_f64()) {
                    instance.set_param(param_index, v);
                }
            }
        }
        Ok(json!({ "set_name": set_name, "name": params.name }))
    }

    pub fn instance_set_preset_delete(&self, params: Value) -> Result<Value, CommandError> {
        let params: SetPresetParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_preset_delete params: {e}")))?;
        let set_name = params.set_name.unwrap_or_else(|| UNTITLED_SET.to_string());
        SetPresetQuery::destroy(&self.db, &set_name, Some(&params.name))?;
        Ok(json!({}))
    }

    pub fn instance_set_preset_rename(&self, params: Value) -> Result<Value, CommandError> {
        let params: SetPresetRenameParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_preset_rename params: {e}")))?;
        let set_name = params.set_name.unwrap_or_else(|| UNTITLED_SET.to_string());
        SetPresetQuery::rename(&self.db, &set_name, &params.name, &params.new_name)?;
        Ok(json!({}))
    }

    pub fn instance_set_view_create(&self, params: Value) -> Result<Value, CommandError> {
        let params: SetViewCreateParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_view_create params: {e}")))?;
        let set_name = params.set_name.unwrap_or_else(|| UNTITLED_SET.to_string());
        let index = SetViewQuery::create(&self.db, &set_name, params.sort_index, &params.name, &params.params_json)?;
        Ok(json!({ "sort_index": index }))
    }

    pub fn instance_set_view_destroy(&self, params: Value) -> Result<Value, CommandError> {
        let params: SetViewIndexParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_view_destroy params: {e}")))?;
        let set_name = params.set_name.unwrap_or_else(|| UNTITLED_SET.to_string());
        SetViewQuery::destroy(&self.db, &set_name, params.sort_index)?;
        Ok(json!({}))
    }

    pub fn instance_set_view_order(&self, params: Value) -> Result<Value, CommandError> {
        let params: SetViewOrderParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_set_view_order params: {e}")))?;
        let set_name = params.set_name.unwrap_or_else(|| UNTITLED_SET.to_string());
        let changed = SetViewQuery::update_sort_order(&self.db, &set_name, &params.order)?;
        Ok(json!({ "changed": changed }))
    }
}
