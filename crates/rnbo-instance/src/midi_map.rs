//! Per-instance MIDI mapping: a compact 16-bit key (status|chan, data0)
//! identifies a message shape, and two tables route it to parameters and to
//! inport tags. Byte-to-value conversion lives in `rnbo_proto::midimap`.

use std::collections::HashMap;

use rnbo_proto::midimap;

#[derive(Debug, Clone, PartialEq)]
pub enum MidiTarget {
    Param(usize, f64),
    Inport(String, f64),
}

#[derive(Default)]
pub struct MidiMap {
    param_map: HashMap<u16, Vec<usize>>,
    param_reverse: HashMap<usize, u16>,
    inport_map: HashMap<u16, Vec<String>>,
}

impl MidiMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_param(&mut self, key: u16, param_index: usize) {
        self.unmap_param(param_index);
        self.param_map.entry(key).or_default().push(param_index);
        self.param_reverse.insert(param_index, key);
    }

    pub fn unmap_param(&mut self, param_index: usize) {
        if let Some(old_key) = self.param_reverse.remove(&param_index) {
            if let Some(list) = self.param_map.get_mut(&old_key) {
                list.retain(|&i| i != param_index);
            }
        }
    }

    pub fn map_inport(&mut self, key: u16, tag: impl Into<String>) {
        self.inport_map.entry(key).or_default().push(tag.into());
    }

    pub fn unmap_inport(&mut self, key: u16, tag: &str) {
        if let Some(list) = self.inport_map.get_mut(&key) {
            list.retain(|t| t != tag);
        }
    }

    /// Resolve an incoming raw MIDI message into every mapped target, with
    /// the raw bytes already normalized to a `[0,1]` (or `[-1,1]` for pitch
    /// bend) value.
    pub fn dispatch(&self, status: u8, data0: u8, data1: u8) -> Vec<MidiTarget> {
        let key = midimap::key(status, data0);
        let value = midimap::value(status, data0, data1);

        let mut targets = Vec::new();
        if let Some(indices) = self.param_map.get(&key) {
            targets.extend(indices.iter().map(|&i| MidiTarget::Param(i, value)));
        }
        if let Some(tags) = self.inport_map.get(&key) {
            targets.extend(tags.iter().map(|t| MidiTarget::Inport(t.clone(), value)));
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE_ON: u8 = 0x90;
    const CONTROL_CHANGE: u8 = 0xB0;

    #[test]
    fn dispatch_routes_to_mapped_param() {
        let mut map = MidiMap::new();
        let key = midimap::key(CONTROL_CHANGE, 7);
        map.map_param(key, 3);

        let targets = map.dispatch(CONTROL_CHANGE, 7, 64);
        assert_eq!(targets.len(), 1);
        assert!(matches!(targets[0], MidiTarget::Param(3, _)));
    }

    #[test]
    fn remapping_a_param_drops_the_old_key() {
        let mut map = MidiMap::new();
        let key_a = midimap::key(CONTROL_CHANGE, 7);
        let key_b = midimap::key(CONTROL_CHANGE, 10);
        map.map_param(key_a, 3);
        map.map_param(key_b, 3);

        assert!(map.dispatch(CONTROL_CHANGE, 7, 64).is_empty());
        assert_eq!(map.dispatch(CONTROL_CHANGE, 10, 64).len(), 1);
    }

    #[test]
    fn dispatch_can_hit_params_and_inports_at_once() {
        let mut map = MidiMap::new();
        let key = midimap::key(NOTE_ON, 60);
        map.map_param(key, 1);
        map.map_inport(key, "gate");

        let targets = map.dispatch(NOTE_ON, 60, 100);
        assert_eq!(targets.len(), 2);
    }
}
