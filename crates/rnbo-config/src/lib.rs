//! Process-wide JSON config document with debounced flush, default path
//! helpers, well-known key constants, and the first-run system id.

pub mod io;
pub mod keys;
pub mod paths;
pub mod store;

pub use keys::MidiProgramChangeChannel;
pub use store::{get_or_create_system_id, ConfigStore};
