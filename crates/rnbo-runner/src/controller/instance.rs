//! `instance_load`, `instance_unload`, and patcher-row management
//! (`patcherstore`, `patcher_destroy`, `patcher_rename`).

use std::path::Path;

use rnbo_db::PatcherQuery;
use rnbo_instance::Instance;
use rnbo_patcher::PatcherFactory;
use rnbo_tree::{AccessMode, ParamValue};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CommandError;

use super::Controller;

#[derive(Deserialize)]
struct LoadParams {
    name: String,
    #[serde(default)]
    index: Option<i64>,
}

#[derive(Deserialize)]
struct UnloadParams {
    #[serde(default = "default_unload_index")]
    index: i64,
}

fn default_unload_index() -> i64 {
    -1
}

#[derive(Deserialize)]
struct PatcherDestroyParams {
    name: String,
}

#[derive(Deserialize)]
struct PatcherRenameParams {
    name: String,
    new_name: String,
}

impl Controller {
    /// Loads the latest stored revision of a named patcher into a new (or
    /// requested) instance index, binds its parameters into the tree, and,
    /// if the audio host is active, wires it into the JACK graph and starts
    /// its fade-in.
    pub fn instance_load(&self, params: Value) -> Result<Value, CommandError> {
        let params: LoadParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_load params: {e}")))?;

        let row = PatcherQuery::get_latest_by_name(&self.db, &params.name)?
            .ok_or_else(|| CommandError::Other(format!("patcher not found: {}", params.name)))?;

        let index = match params.index {
            Some(i) => i,
            None => self.next_free_index(),
        };
        if self.instances.lock().unwrap().contains_key(&index) {
            return Err(CommandError::Other(format!("instance {index} already loaded")));
        }

        let patcher_instance = PatcherFactory::load(Path::new(&row.library_path))?.create_instance()?;
        let prefix = format!("/rnbo/inst/{index}");
        let instance = Instance::new(patcher_instance, self.tree.clone(), prefix.clone(), row.name.clone(), index, self.db.clone());
        instance.activate();
        instance.connect();
        self.bind_patcher_io(&row.name, &instance);

        if self.audio_active.load(std::sync::atomic::Ordering::SeqCst) {
            self.start_instance_audio(index, &instance)?;
        }

        self.instances.lock().unwrap().insert(index, instance);
        log::info!("instance {index} loaded patcher {}", row.name);
        Ok(json!({ "index": index }))
    }

    /// Starts one instance's JACK client and begins its fade-in. Split out
    /// so both `instance_load` and `activate_audio` (loading already-bound
    /// instances once the host comes up) share it.
    pub(super) fn start_instance_audio(&self, index: i64, instance: &std::sync::Arc<Instance>) -> Result<(), CommandError> {
        let client_name = format!("rnbo-inst-{index}");
        let policy = self.auto_connect_policy();
        let client = rnbo_audio::activate_instance(instance.clone(), &client_name, policy)?;
        self.audio_clients.lock().unwrap().insert(index, client);
        instance.start(self.fade_in_ms());
        Ok(())
    }

    /// Publishes `patchers/<name>/io`: `[audio_in, audio_out, midi_in, midi_out]`.
    /// MIDI in/out are fixed at 1 each -- every patcher instance gets exactly
    /// one MIDI in and one MIDI out port.
    fn bind_patcher_io(&self, patcher_name: &str, instance: &std::sync::Arc<Instance>) {
        let num_in = instance.patcher().num_inputs() as i64;
        let num_out = instance.patcher().num_outputs() as i64;
        self.tree.build_branch(format!("/rnbo/patchers/{patcher_name}"), |branch| {
            branch.add_param(
                "io",
                rnbo_tree::Parameter::new(
                    AccessMode::Get,
                    ParamValue::List(vec![
                        ParamValue::Int(num_in),
                        ParamValue::Int(num_out),
                        ParamValue::Int(1),
                        ParamValue::Int(1),
                    ]),
                ),
            );
        });
    }

    /// Unloads one instance, or every instance when `index` is negative:
    /// fades out, drops its audio client, and removes its tree branch.
    pub fn instance_unload(&self, params: Value) -> Result<Value, CommandError> {
        let params: UnloadParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed instance_unload params: {e}")))?;

        let targets: Vec<i64> = if params.index < 0 {
            self.instances.lock().unwrap().keys().copied().collect()
        } else {
            vec![params.index]
        };

        for index in &targets {
            self.unload_one(*index);
        }
        Ok(json!({ "unloaded": targets }))
    }

    fn unload_one(&self, index: i64) {
        let fade_ms = self.fade_out_ms();
        if let Some(instance) = self.instances.lock().unwrap().remove(&index) {
            instance.stop(fade_ms);
        }
        self.audio_clients.lock().unwrap().remove(&index);
        self.tree.remove_subtree(&format!("/rnbo/inst/{index}"));
    }

    /// Renames a patcher row and, if any live instance was created from it,
    /// renames that instance's set-facing alias source too.
    pub fn patcher_rename(&self, params: Value) -> Result<Value, CommandError> {
        let params: PatcherRenameParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed patcher_rename params: {e}")))?;
        let row = PatcherQuery::get_latest_by_name(&self.db, &params.name)?
            .ok_or_else(|| CommandError::Other(format!("patcher not found: {}", params.name)))?;
        PatcherQuery::rename(&self.db, row.id, &params.new_name)?;
        Ok(json!({}))
    }

    /// Destroys a patcher row and unlinks its orphaned library/source files.
    pub fn patcher_destroy(&self, params: Value) -> Result<Value, CommandError> {
        let params: PatcherDestroyParams = serde_json::from_value(params)
            .map_err(|e| CommandError::Other(format!("malformed patcher_destroy params: {e}")))?;
        let row = PatcherQuery::get_latest_by_name(&self.db, &params.name)?
            .ok_or_else(|| CommandError::Other(format!("patcher not found: {}", params.name)))?;
        let orphaned = PatcherQuery::destroy(&self.db, row.id)?;
        let _ = std::fs::remove_file(&orphaned.library_path);
        if !orphaned.patcher_file_path.is_empty() {
            let _ = std::fs::remove_file(&orphaned.patcher_file_path);
        }
        Ok(json!({}))
    }
}
