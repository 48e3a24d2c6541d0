//! Owns every live subsystem a command handler might touch: the database,
//! the config document, the node tree, the compile supervisor, the set of
//! active instances and their audio clients, and the update-peer mirror.
//! Each feature area's handlers live in their own sibling module, all
//! `impl Controller` blocks over the one struct defined here.

mod audio;
mod compile;
mod file;
mod install;
mod instance;
mod listener;
mod midi;
mod package;
mod set;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rnbo_audio::InstanceAudioClient;
use rnbo_compile::CompileSupervisor;
use rnbo_config::ConfigStore;
use rnbo_db::Db;
use rnbo_instance::Instance;
use rnbo_tree::Tree;
use rnbo_update::UpdateMirror;

pub const UNTITLED_SET: &str = "untitled";

/// A compile job's caller-side context, kept until the job's outcome is
/// polled so `compile`'s load-on-success step knows what it was building.
pub struct PendingCompile {
    pub patcher_name: String,
    pub patcher_file_path: String,
    pub config_json: String,
    pub requested_index: Option<i64>,
}

pub struct Controller {
    pub(crate) db: Db,
    pub(crate) config: ConfigStore,
    pub(crate) tree: Arc<Tree>,
    pub(crate) compile: CompileSupervisor,
    pub(crate) instances: Mutex<HashMap<i64, Arc<Instance>>>,
    /// Name of the set last saved or loaded, used as the scope for the
    /// MIDI-program-change set-preset selector.
    pub(crate) current_set: Mutex<String>,
    pub(crate) audio_clients: Mutex<HashMap<i64, InstanceAudioClient>>,
    pub(crate) pending_compiles: Mutex<HashMap<String, PendingCompile>>,
    pub(crate) update: UpdateMirror,
    pub(crate) audio_active: AtomicBool,
    pub(crate) rnbo_version: String,
    pub(crate) runner_version: String,
    pub(crate) target_id: String,
    pub(crate) patcher_lib_dir: PathBuf,
    pub(crate) source_dir: PathBuf,
    pub(crate) datafile_dir: PathBuf,
    pub(crate) save_dir: PathBuf,
    pub(crate) package_dir: PathBuf,
    pub(crate) compile_cache_dir: PathBuf,
}

impl Controller {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Db,
        config: ConfigStore,
        tree: Arc<Tree>,
        update: UpdateMirror,
        rnbo_version: impl Into<String>,
        runner_version: impl Into<String>,
        target_id: impl Into<String>,
        patcher_lib_dir: PathBuf,
        source_dir: PathBuf,
        datafile_dir: PathBuf,
        save_dir: PathBuf,
        package_dir: PathBuf,
        compile_cache_dir: PathBuf,
    ) -> Self {
        Self {
            db,
            config,
            tree,
            compile: CompileSupervisor::new(),
            instances: Mutex::new(HashMap::new()),
            current_set: Mutex::new(UNTITLED_SET.to_string()),
            audio_clients: Mutex::new(HashMap::new()),
            pending_compiles: Mutex::new(HashMap::new()),
            update,
            audio_active: AtomicBool::new(false),
            rnbo_version: rnbo_version.into(),
            runner_version: runner_version.into(),
            target_id: target_id.into(),
            patcher_lib_dir,
            source_dir,
            datafile_dir,
            save_dir,
            package_dir,
            compile_cache_dir,
        }
    }

    fn next_free_index(&self) -> i64 {
        let instances = self.instances.lock().unwrap();
        let mut index = 0;
        while instances.contains_key(&index) {
            index += 1;
        }
        index
    }

    fn fade_in_ms(&self) -> f64 {
        self.config
            .get_i64(rnbo_config::keys::AUDIO_FADE_IN_MS)
            .unwrap_or(rnbo_config::keys::DEFAULT_FADE_IN_MS as i64) as f64
    }

    fn fade_out_ms(&self) -> f64 {
        self.config
            .get_i64(rnbo_config::keys::AUDIO_FADE_OUT_MS)
            .unwrap_or(rnbo_config::keys::DEFAULT_FADE_OUT_MS as i64) as f64
    }

    fn auto_connect_policy(&self) -> rnbo_audio::AutoConnectPolicy {
        use rnbo_audio::AutoConnectPolicy;
        use rnbo_config::keys::*;
        if self.config.get_bool(INSTANCE_AUTO_CONNECT_AUDIO).unwrap_or(true) {
            AutoConnectPolicy::Audio
        } else if self.config.get_bool(INSTANCE_AUTO_CONNECT_AUDIO_INDEXED).unwrap_or(false) {
            AutoConnectPolicy::Indexed
        } else if self.config.get_bool(INSTANCE_AUTO_CONNECT_MIDI_HARDWARE).unwrap_or(false) {
            AutoConnectPolicy::MidiHardware
        } else if self.config.get_bool(INSTANCE_AUTO_CONNECT_MIDI).unwrap_or(false) {
            AutoConnectPolicy::Midi
        } else if self.config.get_bool(INSTANCE_AUTO_CONNECT_PORT_GROUP).unwrap_or(false) {
            AutoConnectPolicy::PortGroup
        } else {
            AutoConnectPolicy::None
        }
    }

    /// Called from the dispatcher's periodic tick: flushes the config
    /// document if it's been quiet long enough, drains every live
    /// instance's event queue, refreshes the update-peer mirror, and polls
    /// for a finished compile job. A finished job surfaces as an internal
    /// response the dispatcher echoes to stdout instead of the response node.
    pub fn tick(&self) -> Option<rnbo_proto::command::CommandResponse> {
        if let Err(e) = self.config.write_if_dirty() {
            log::warn!("config flush failed: {e}");
        }
        self.update.refresh();

        let program_changes: Vec<(u8, u8)> = {
            let instances = self.instances.lock().unwrap();
            for instance in instances.values() {
                instance.process_events();
            }
            instances.values().flat_map(|i| i.take_program_changes()).collect()
        };
        for (channel, program) in program_changes {
            self.handle_program_change(channel, program);
        }

        self.poll_compile()
    }
}
