//! The JACK bridge: one client per instance running its realtime process
//! callback, plus the always-on introspection client, auto-connect
//! policies, and the optional recorder subsystem.

pub mod auto_connect;
pub mod client;
pub mod error;
pub mod midi_bridge;
pub mod recorder;
pub mod timestamp;
pub mod transport;

pub use auto_connect::AutoConnectPolicy;
pub use client::{activate_instance, register_info_client, InstanceAudioClient, INFO_CLIENT_NAME};
pub use error::AudioError;
pub use recorder::{RecorderChannel, RecorderHandle};
pub use transport::TransportSnapshot;
