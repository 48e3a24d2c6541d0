//! Per-instance OSC address mapping: a parameter or port may declare an
//! address in metadata. Writes to the bound node re-dispatch to the
//! address; incoming OSC to that address mirrors to every locally mapped
//! node.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum OscTarget {
    Param(usize),
    Port(String),
}

#[derive(Default)]
pub struct OscMap {
    address_to_targets: HashMap<String, Vec<OscTarget>>,
    param_to_address: HashMap<usize, String>,
}

impl OscMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_param(&mut self, address: impl Into<String>, param_index: usize) {
        let address = address.into();
        self.param_to_address.insert(param_index, address.clone());
        self.address_to_targets
            .entry(address)
            .or_default()
            .push(OscTarget::Param(param_index));
    }

    pub fn map_port(&mut self, address: impl Into<String>, tag: impl Into<String>) {
        self.address_to_targets
            .entry(address.into())
            .or_default()
            .push(OscTarget::Port(tag.into()));
    }

    pub fn address_for_param(&self, param_index: usize) -> Option<&str> {
        self.param_to_address.get(&param_index).map(String::as_str)
    }

    /// Every node mapped to an incoming OSC address.
    pub fn targets_for_address(&self, address: &str) -> &[OscTarget] {
        self.address_to_targets
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_write_resolves_its_address() {
        let mut map = OscMap::new();
        map.map_param("/lead/gain", 2);
        assert_eq!(map.address_for_param(2), Some("/lead/gain"));
    }

    #[test]
    fn incoming_address_mirrors_to_every_mapped_target() {
        let mut map = OscMap::new();
        map.map_param("/lead/gate", 5);
        map.map_port("/lead/gate", "gate_in");

        let targets = map.targets_for_address("/lead/gate");
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn unmapped_address_has_no_targets() {
        let map = OscMap::new();
        assert!(map.targets_for_address("/nowhere").is_empty());
    }
}
