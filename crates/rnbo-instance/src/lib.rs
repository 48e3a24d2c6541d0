//! A live incarnation of a loaded patcher: lifecycle, parameter binding,
//! presets, datarefs, and the MIDI/OSC maps that route messages into it.

pub mod dataref;
pub mod error;
pub mod events;
pub mod fade;
pub mod instance;
pub mod midi_map;
pub mod osc_map;
pub mod preset;
pub mod preset_worker;

pub use dataref::{AudioDatarefSlot, DatarefBuffer, DatarefEvent, DatarefWorker};
pub use error::InstanceError;
pub use events::{event_channel, InstanceEvent};
pub use fade::Fade;
pub use instance::Instance;
pub use midi_map::{MidiMap, MidiTarget};
pub use osc_map::{OscMap, OscTarget};
pub use preset::{PresetContent, PresetStore};
pub use preset_worker::PresetWorker;
