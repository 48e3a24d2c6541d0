//! Lock-free events crossing the audio/control boundary, ported from the
//! engine's `rtrb`-based command channel shape: one SPSC ring per event kind,
//! drained once per `process_events` cycle on the control thread.

use rtrb::{Consumer, Producer, RingBuffer};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum InstanceEvent {
    /// A parameter changed inside the DSP (e.g. from automation or a
    /// MIDI-mapped control) and needs to be reflected to the tree.
    ParamChanged { index: usize, value: f64 },
    /// An outport fired. Carries the outport's index rather than its tag so
    /// the audio thread never has to allocate a string to report it; the
    /// control thread resolves the index back to a tag and a tree path.
    PortMessage { index: usize, value: f64 },
    /// An asynchronous preset-save completed; ready to persist.
    PresetSaveCompleted { name: String, content: serde_json::Value },
    MetaUpdate { key: String, value: serde_json::Value },
    /// A MIDI program change arrived on the audio thread; the control
    /// thread resolves it against the configured selector channels.
    ProgramChange { channel: u8, program: u8 },
}

pub fn event_channel() -> (Producer<InstanceEvent>, Consumer<InstanceEvent>) {
    RingBuffer::new(EVENT_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_flow_producer_to_consumer() {
        let (mut tx, mut rx) = event_channel();
        tx.push(InstanceEvent::ParamChanged { index: 0, value: 0.5 }).unwrap();
        match rx.pop().unwrap() {
            InstanceEvent::ParamChanged { index, value } => {
                assert_eq!(index, 0);
                assert_eq!(value, 0.5);
            }
            _ => panic!("wrong event"),
        }
    }
}
