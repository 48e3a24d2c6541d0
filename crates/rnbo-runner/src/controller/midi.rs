//! MIDI-program-change-driven selection: the four independent selectors
//! (patcher, set, set-preset, instance-preset), each gated behind its own
//! configured channel so a single program-change message can drive more
//! than one of them at once.

use rnbo_config::keys::{self, MidiProgramChangeChannel};
use rnbo_db::{PatcherQuery, PresetQuery, SetPresetQuery, SetQuery};
use serde_json::json;

use super::Controller;

impl Controller {
    fn configured_channel(&self, key: &str) -> MidiProgramChangeChannel {
        MidiProgramChangeChannel::from_json_number(self.config.get_i64(key).unwrap_or(-1))
    }

    /// Runs every selector against one program-change message. Each
    /// selector only fires if its own channel config matches; all four can
    /// fire off the same message.
    pub(super) fn handle_program_change(&self, channel: u8, program: u8) {
        self.select_patcher_by_program_change(channel, program);
        self.select_set_by_program_change(channel, program);
        self.select_set_preset_by_program_change(channel, program);
        self.select_instance_preset_by_program_change(channel, program);
    }

    fn select_patcher_by_program_change(&self, channel: u8, program: u8) {
        if !self.configured_channel(keys::PRESET_MIDI_PROGRAM_CHANGE_CHANNEL_PATCHER).matches(channel) {
            return;
        }
        match PatcherQuery::name_by_ordinal(&self.db, program as i64) {
            Ok(Some(name)) => {
                if let Err(e) = self.instance_load(json!({ "name": name, "index": 0 })) {
                    log::warn!("midi program-change patcher select failed: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("patcher ordinal lookup failed: {e}"),
        }
    }

    fn select_set_by_program_change(&self, channel: u8, program: u8) {
        if !self.configured_channel(keys::PRESET_MIDI_PROGRAM_CHANGE_CHANNEL_SET).matches(channel) {
            return;
        }
        match SetQuery::name_by_ordinal(&self.db, program as i64) {
            Ok(Some(name)) => {
                if let Err(e) = self.instance_set_load(json!({ "name": name })) {
                    log::warn!("midi program-change set select failed: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("set ordinal lookup failed: {e}"),
        }
    }

    fn select_set_preset_by_program_change(&self, channel: u8, program: u8) {
        if !self.configured_channel(keys::PRESET_MIDI_PROGRAM_CHANGE_CHANNEL_SET_PRESET).matches(channel) {
            return;
        }
        let set_name = self.current_set.lock().unwrap().clone();
        match SetPresetQuery::get_by_ordinal(&self.db, &set_name, program as i64) {
            Ok(Some(name)) => {
                if let Err(e) = self.instance_set_preset_load(json!({ "set_name": set_name, "name": name })) {
                    log::warn!("midi program-change set-preset select failed: {e}");
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("set-preset ordinal lookup failed: {e}"),
        }
    }

    /// Unlike the other three, this selector is per-instance: every live
    /// instance resolves `program` against its own patcher's preset list,
    /// so the same program-change can jump every instance's own preset at
    /// once.
    fn select_instance_preset_by_program_change(&self, channel: u8, program: u8) {
        if !self.configured_channel(keys::PRESET_MIDI_PROGRAM_CHANGE_CHANNEL_INSTANCE_PRESET).matches(channel) {
            return;
        }
        for instance in self.instances.lock().unwrap().values() {
            let Ok(Some(row)) = PatcherQuery::get_latest_by_name(&self.db, &instance.name) else {
                continue;
            };
            let Ok(Some((name, _))) = PresetQuery::get_by_ordinal(&self.db, row.id, program as i64) else {
                continue;
            };
            if let Err(e) = instance.load_preset(&instance.name, &name, None) {
                log::warn!("midi program-change instance-preset select failed on instance {}: {e}", instance.index);
            }
        }
    }
}
