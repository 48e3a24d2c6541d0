//! Auto-connect policies applied once, at instance activation.
//!
//! `jack`'s Rust binding doesn't expose the JACK metadata API, so the
//! `PortGroup` policy approximates the `rnbo-graph-user-io` marker property
//! by matching a port alias convention (`"rnbo-graph-user-io:*"`) instead of
//! a real property lookup.

use jack::{Client, PortFlags};

const PORT_GROUP_ALIAS_MARKER: &str = "rnbo-graph-user-io";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoConnectPolicy {
    Audio,
    Indexed,
    Midi,
    MidiHardware,
    PortGroup,
    None,
}

fn is_through_or_virtual(name: &str, aliases: &[String]) -> bool {
    let lower = name.to_lowercase();
    if lower.contains("through") || lower.contains("virtual") {
        return true;
    }
    aliases.iter().any(|a| {
        let a = a.to_lowercase();
        a.contains("through") || a.contains("virtual")
    })
}

fn port_aliases(client: &Client, port_name: &str) -> Vec<String> {
    match client.port_by_name(port_name) {
        Some(port) => port.aliases().unwrap_or_default(),
        None => Vec::new(),
    }
}

/// Connects physical outputs to `our_inputs` in order (and symmetrically for
/// `our_outputs` against physical inputs).
pub fn connect_audio(client: &Client, our_inputs: &[String], our_outputs: &[String]) {
    let physical_outputs = client.ports(None, Some("32 bit float mono audio"), PortFlags::IS_OUTPUT | PortFlags::IS_PHYSICAL);
    for (src, dst) in physical_outputs.iter().zip(our_inputs.iter()) {
        connect(client, src, dst);
    }

    let physical_inputs = client.ports(None, Some("32 bit float mono audio"), PortFlags::IS_INPUT | PortFlags::IS_PHYSICAL);
    for (src, dst) in our_outputs.iter().zip(physical_inputs.iter()) {
        connect(client, src, dst);
    }
}

/// Matches ports by ordinal position rather than physical/virtual status.
pub fn connect_indexed(client: &Client, system_ports: &[String], our_ports: &[String]) {
    for (src, dst) in system_ports.iter().zip(our_ports.iter()) {
        connect(client, src, dst);
    }
}

pub fn connect_midi(client: &Client, our_midi_in: &[String], physical_only: bool) {
    let mut flags = PortFlags::IS_OUTPUT;
    if physical_only {
        flags |= PortFlags::IS_PHYSICAL;
    }
    let candidates = client.ports(None, Some("8 bit raw midi"), flags);

    let mut dst_iter = our_midi_in.iter();
    for src in candidates {
        let aliases = port_aliases(client, &src);
        if is_through_or_virtual(&src, &aliases) {
            continue;
        }
        if let Some(dst) = dst_iter.next() {
            connect(client, &src, dst);
        } else {
            break;
        }
    }
}

pub fn connect_port_group(client: &Client, our_ports: &[String]) {
    let all_outputs = client.ports(None, None, PortFlags::IS_OUTPUT);
    let marked: Vec<String> = all_outputs
        .into_iter()
        .filter(|name| {
            port_aliases(client, name)
                .iter()
                .any(|a| a.contains(PORT_GROUP_ALIAS_MARKER))
        })
        .collect();

    for (src, dst) in marked.iter().zip(our_ports.iter()) {
        connect(client, src, dst);
    }
}

fn connect(client: &Client, src: &str, dst: &str) {
    if let Err(e) = client.connect_ports_by_name(src, dst) {
        log::warn!("auto-connect failed {} -> {}: {}", src, dst, e);
    } else {
        log::info!("auto-connected {} -> {}", src, dst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn through_and_virtual_names_are_filtered() {
        assert!(is_through_or_virtual("system:midi_through_1", &[]));
        assert!(is_through_or_virtual("a2j:Virtual Raw MIDI", &[]));
        assert!(!is_through_or_virtual("system:midi_capture_1", &[]));
    }

    #[test]
    fn alias_can_also_mark_through_ports() {
        assert!(is_through_or_virtual("ttymidi:MIDI_in", &["Through 0".to_string()]));
    }
}
