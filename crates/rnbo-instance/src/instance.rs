//! A single live incarnation of a patcher.
//!
//! Owns the loaded DSP (`PatcherInstance`), a dedicated branch of the node
//! tree, the MIDI/OSC maps that route messages into it, a dataref worker for
//! loading sample buffers off the audio thread, and the preset store. The
//! realtime `process()` call and the JACK port graph live in the audio host;
//! this type only exposes what that host needs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rtrb::{Consumer, Producer};

use rnbo_db::Db;
use rnbo_patcher::PatcherInstance;
use rnbo_proto::midimap;
use rnbo_tree::{AccessMode, Domain, ParamValue, Tree};

use crate::dataref::{AudioDatarefSlot, DatarefEvent, DatarefWorker};
use crate::error::InstanceError;
use crate::events::{event_channel, InstanceEvent};
use crate::fade::Fade;
use crate::midi_map::{MidiMap, MidiTarget};
use crate::osc_map::{OscMap, OscTarget};
use crate::preset::PresetStore;
use crate::preset_worker::PresetWorker;

/// Parameters whose name starts with this prefix are treated as internal
/// and are not exposed as tree nodes or mappable targets.
const DEBUG_PARAM_PREFIX: &str = "__";

fn sanitize_path_segment(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

pub struct Instance {
    pub name: String,
    pub index: i64,
    alias: Mutex<String>,
    prefix: String,
    tree: Arc<Tree>,
    patcher: PatcherInstance,
    fade: Fade,
    db: Db,
    events_tx: Mutex<Option<Producer<InstanceEvent>>>,
    events_rx: Mutex<Consumer<InstanceEvent>>,
    midi_map: Mutex<MidiMap>,
    osc_map: Mutex<OscMap>,
    dataref_worker: DatarefWorker,
    dataref_slots: Mutex<HashMap<String, AudioDatarefSlot>>,
    preset_worker: PresetWorker,
    param_paths: Mutex<HashMap<usize, String>>,
    inport_index_by_tag: Mutex<HashMap<String, usize>>,
    outport_paths: Mutex<HashMap<usize, String>>,
    program_changes: Mutex<Vec<(u8, u8)>>,
    last_preset: Mutex<Option<String>>,
}

impl Instance {
    pub fn new(
        patcher: PatcherInstance,
        tree: Arc<Tree>,
        prefix: impl Into<String>,
        name: impl Into<String>,
        index: i64,
        db: Db,
    ) -> Arc<Self> {
        let (tx, rx) = event_channel();
        Arc::new(Self {
            name: name.into(),
            index,
            alias: Mutex::new(String::new()),
            prefix: prefix.into(),
            tree,
            patcher,
            fade: Fade::default(),
            db,
            events_tx: Mutex::new(Some(tx)),
            events_rx: Mutex::new(rx),
            midi_map: Mutex::new(MidiMap::new()),
            osc_map: Mutex::new(OscMap::new()),
            dataref_worker: DatarefWorker::spawn(),
            dataref_slots: Mutex::new(HashMap::new()),
            preset_worker: PresetWorker::spawn(),
            param_paths: Mutex::new(HashMap::new()),
            inport_index_by_tag: Mutex::new(HashMap::new()),
            outport_paths: Mutex::new(HashMap::new()),
            program_changes: Mutex::new(Vec::new()),
            last_preset: Mutex::new(None),
        })
    }

    pub fn alias(&self) -> String {
        self.alias.lock().unwrap().clone()
    }

    pub fn set_alias(&self, alias: impl Into<String>) {
        *self.alias.lock().unwrap() = alias.into();
    }

    pub fn patcher(&self) -> &PatcherInstance {
        &self.patcher
    }

    pub fn fade(&self) -> &Fade {
        &self.fade
    }

    /// Hands the audio-side producer to the host wiring this instance into
    /// the process graph. Can only be taken once; a second call returns
    /// `None`, since `Producer` has exactly one owner at a time.
    pub fn take_events_producer(&self) -> Option<Producer<InstanceEvent>> {
        self.events_tx.lock().unwrap().take()
    }

    /// Binds the DSP's parameters, inports, and outports into tree nodes
    /// under this instance's branch.
    ///
    /// Non-debug numeric parameters become `params/<id>` nodes, each
    /// bi-directional with the DSP's own range as a clipping domain and its
    /// current value as the initial value; writes are pushed straight back
    /// into the DSP. Declared inports become settable `messages/in/<tag>`
    /// nodes that deliver straight to the DSP; declared outports become
    /// get-only `messages/out/<tag>` nodes, populated as the DSP fires them.
    pub fn activate(self: &Arc<Self>) {
        let count = self.patcher.param_count();
        let mut paths = self.param_paths.lock().unwrap();
        let mut inport_index_by_tag = self.inport_index_by_tag.lock().unwrap();
        let mut outport_paths = self.outport_paths.lock().unwrap();

        self.tree.build_branch(&self.prefix, |branch| {
            branch.add_branch("params");
            for index in 0..count {
                let raw_name = self.patcher.param_name(index);
                if raw_name.starts_with(DEBUG_PARAM_PREFIX) {
                    continue;
                }
                let relative = format!("params/{}", sanitize_path_segment(&raw_name));
                let min = self.patcher.param_min(index);
                let max = self.patcher.param_max(index);
                let initial = self.patcher.get_param(index);

                let inst = Arc::clone(self);
                let parameter = rnbo_tree::Parameter::new(AccessMode::Bi, ParamValue::Float(initial))
                    .with_description(raw_name.clone())
                    .with_domain(Domain::numeric(min, max, true))
                    .with_callback(Box::new(move |value: &ParamValue| {
                        if let Some(v) = value.as_f64() {
                            inst.patcher.set_param(index, v);
                        }
                    }));
                branch.add_param(&relative, parameter);
                paths.insert(index, relative);
            }

            branch.add_branch("messages/in");
            for index in 0..self.patcher.inport_count() {
                let tag = self.patcher.inport_tag(index);
                let relative = format!("messages/in/{}", sanitize_path_segment(&tag));

                let inst = Arc::clone(self);
                let parameter = rnbo_tree::Parameter::new(AccessMode::Set, ParamValue::Float(0.0))
                    .with_description(format!("inport {tag}"))
                    .with_callback(Box::new(move |value: &ParamValue| {
                        if let Some(v) = value.as_f64() {
                            inst.patcher.send_inport(index, v);
                        }
                    }));
                branch.add_param(&relative, parameter);
                inport_index_by_tag.insert(tag, index);
            }

            branch.add_branch("messages/out");
            for index in 0..self.patcher.outport_count() {
                let tag = self.patcher.outport_tag(index);
                let relative = format!("messages/out/{}", sanitize_path_segment(&tag));
                let parameter =
                    rnbo_tree::Parameter::new(AccessMode::Get, ParamValue::Float(0.0)).with_description(format!("outport {tag}"));
                branch.add_param(&relative, parameter);
                outport_paths.insert(index, relative);
            }
        });
        log::debug!(
            "instance {} activated with {} params, {} inports, {} outports",
            self.name,
            paths.len(),
            inport_index_by_tag.len(),
            outport_paths.len()
        );
    }

    /// Auto-wiring of audio/MIDI ports happens in the audio host once this
    /// instance is added to its graph; this only marks intent.
    pub fn connect(&self) {
        log::debug!("instance {} ready for port auto-connect", self.name);
    }

    pub fn start(&self, fade_ms: f64) {
        self.fade.start(fade_ms);
    }

    pub fn stop(&self, fade_ms: f64) {
        self.fade.stop(fade_ms);
    }

    /// Drains the audio-thread event ring, the preset-save worker's
    /// completion queue, and the dataref worker's completion queue,
    /// reflecting all three into the tree. Must be called from the control
    /// thread only -- this is where retired dataref buffers are actually
    /// freed.
    pub fn process_events(&self) {
        while let Ok(event) = self.events_rx.lock().unwrap().pop() {
            self.handle_event(event);
        }
        while let Some(event) = self.preset_worker.try_recv_event() {
            self.handle_event(event);
        }

        while let Some(event) = self.dataref_worker.try_recv_event() {
            match event {
                DatarefEvent::Loaded { id, buffer } => {
                    self.dataref_slots.lock().unwrap().entry(id).or_default().swap(buffer);
                }
                DatarefEvent::LoadFailed { id, error } => {
                    log::warn!("instance {} dataref {} failed to load: {}", self.name, id, error);
                }
                DatarefEvent::Unloaded { id } => {
                    self.dataref_slots.lock().unwrap().remove(&id);
                }
            }
        }

        for slot in self.dataref_slots.lock().unwrap().values_mut() {
            slot.drain_retired();
        }
    }

    fn handle_event(&self, event: InstanceEvent) {
        match event {
            InstanceEvent::ParamChanged { index, value } => {
                let paths = self.param_paths.lock().unwrap();
                if let Some(path) = paths.get(&index) {
                    let full = format!("{}/{}", self.prefix, path);
                    if self.tree.get_value(&full) != Some(ParamValue::Float(value)) {
                        self.tree.set_value(&full, ParamValue::Float(value));
                    }
                }
            }
            InstanceEvent::PortMessage { index, value } => {
                let paths = self.outport_paths.lock().unwrap();
                if let Some(path) = paths.get(&index) {
                    let full = format!("{}/{}", self.prefix, path);
                    self.tree.set_value(&full, ParamValue::Float(value));
                }
            }
            InstanceEvent::PresetSaveCompleted { name, .. } => {
                *self.last_preset.lock().unwrap() = Some(name);
            }
            InstanceEvent::MetaUpdate { key, value } => {
                log::debug!("instance {} meta update {} = {:?}", self.name, key, value);
            }
            InstanceEvent::ProgramChange { channel, program } => {
                self.program_changes.lock().unwrap().push((channel, program));
            }
        }
    }

    /// Hands every program change reported since the last call to the
    /// caller (the controller, which matches it against the configured
    /// selector channels). Clears the buffer.
    pub fn take_program_changes(&self) -> Vec<(u8, u8)> {
        std::mem::take(&mut self.program_changes.lock().unwrap())
    }

    pub fn load_dataref(&self, id: impl Into<String>, path: impl Into<std::path::PathBuf>) {
        self.dataref_worker.request_load(id, path);
    }

    pub fn unload_dataref(&self, id: impl Into<String>) {
        self.dataref_worker.request_unload(id);
    }

    pub fn map_midi_param(&self, key: u16, param_index: usize) {
        self.midi_map.lock().unwrap().map_param(key, param_index);
    }

    pub fn map_midi_inport(&self, key: u16, tag: impl Into<String>) {
        self.midi_map.lock().unwrap().map_inport(key, tag);
    }

    pub fn map_osc_param(&self, address: impl Into<String>, param_index: usize) {
        self.osc_map.lock().unwrap().map_param(address, param_index);
    }

    pub fn map_osc_port(&self, address: impl Into<String>, tag: impl Into<String>) {
        self.osc_map.lock().unwrap().map_port(address, tag);
    }

    /// Dispatches a raw incoming MIDI message against this instance's map,
    /// scaling each normalized `[0,1]` (or bipolar `[-1,1]` for pitch bend)
    /// value into the target parameter's actual range.
    ///
    /// Realtime-safe: called from the audio callback. Every tree-visible
    /// side effect (a bound parameter's new value, a detected program
    /// change) is reported through `events_tx` instead of touching the tree
    /// or `param_paths` directly, since both are guarded by control-thread
    /// mutexes.
    pub fn dispatch_midi(&self, status: u8, data0: u8, data1: u8, events_tx: &mut Producer<InstanceEvent>) {
        if midimap::is_program_change(status) {
            let _ = events_tx.push(InstanceEvent::ProgramChange { channel: status & 0x0F, program: data0 });
        }

        let targets = self.midi_map.lock().unwrap().dispatch(status, data0, data1);
        for target in targets {
            match target {
                MidiTarget::Param(index, value) => {
                    let written = self.write_param_normalized_rt(index, value);
                    let _ = events_tx.push(InstanceEvent::ParamChanged { index, value: written });
                }
                MidiTarget::Inport(tag, value) => {
                    if let Some(&index) = self.inport_index_by_tag.lock().unwrap().get(&tag) {
                        self.patcher.send_inport(index, value);
                    }
                }
            }
        }
    }

    pub fn dispatch_osc(&self, address: &str, value: ParamValue) {
        let targets: Vec<OscTarget> = {
            let map = self.osc_map.lock().unwrap();
            map.targets_for_address(address).to_vec()
        };
        for target in targets {
            match target {
                OscTarget::Param(index) => {
                    if let Some(v) = value.as_f64() {
                        self.set_param(index, v);
                    }
                }
                OscTarget::Port(tag) => {
                    if let Some(&index) = self.inport_index_by_tag.lock().unwrap().get(&tag) {
                        if let Some(v) = value.as_f64() {
                            self.patcher.send_inport(index, v);
                        }
                    }
                }
            }
        }
    }

    /// Realtime-safe: only touches the DSP, never the tree. Returns the
    /// absolute value written so the audio callback can report it through
    /// the event ring instead of writing the tree from the callback itself.
    fn write_param_normalized_rt(&self, index: usize, normalized: f64) -> f64 {
        let min = self.patcher.param_min(index);
        let max = self.patcher.param_max(index);
        let frac = if normalized < 0.0 { (normalized + 1.0) / 2.0 } else { normalized };
        let value = min + frac * (max - min);
        self.patcher.set_param(index, value);
        value
    }

    /// Writes a parameter both to the DSP and its tree node, if bound. Only
    /// safe to call from the control thread (OSC dispatch, presets, RPCs).
    pub fn set_param(&self, index: usize, value: f64) {
        self.patcher.set_param(index, value);
        let path = self.param_paths.lock().unwrap().get(&index).cloned();
        if let Some(path) = path {
            let full = format!("{}/{}", self.prefix, path);
            self.tree.set_value(&full, ParamValue::Float(value));
        }
    }

    /// Asks the preset worker to serialize the current parameter state and
    /// persist it off this thread; completion arrives later as a
    /// `PresetSaveCompleted` event drained by `process_events`.
    pub fn save_preset(&self, patcher_id: i64, name: &str) {
        let mut content = serde_json::Map::new();
        for index in 0..self.patcher.param_count() {
            content.insert(index.to_string(), serde_json::json!(self.patcher.get_param(index)));
        }
        self.preset_worker.request_save(self.db.clone(), patcher_id, name, serde_json::Value::Object(content));
    }

    pub fn load_preset(&self, patcher_name: &str, name: &str, set_name: Option<&str>) -> Result<(), InstanceError> {
        let content = PresetStore::resolve(&self.db, patcher_name, self.index, name, set_name)?;
        if let Some(map) = content.as_object() {
            for (key, value) in map {
                if let (Ok(index), Some(v)) = (key.parse::<usize>(), value.as_f64()) {
                    self.set_param(index, v);
                }
            }
        }
        *self.last_preset.lock().unwrap() = Some(name.to_string());
        Ok(())
    }

    pub fn last_preset(&self) -> Option<String> {
        self.last_preset.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rnbo_tree::LoggingTransport;

    // PatcherInstance can only be constructed through a loaded library, so
    // these tests exercise the parts of Instance that don't touch the DSP:
    // the dataref, midi, and osc routing surfaces are covered by their own
    // modules. This test checks path sanitization and fade independently.
    #[test]
    fn sanitize_path_segment_strips_non_identifier_chars() {
        assert_eq!(sanitize_path_segment("cut off (hz)"), "cut_off__hz_");
        assert_eq!(sanitize_path_segment("gain"), "gain");
    }

    #[test]
    fn tree_survives_without_an_instance_bound_to_it() {
        let tree = Tree::new(Arc::new(LoggingTransport));
        tree.build_branch("/rnbo/inst/0", |b| b.add_branch("params"));
        assert!(tree.children("/rnbo/inst/0").len() == 1);
    }
}
