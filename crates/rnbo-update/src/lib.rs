pub mod local;
pub mod mirror;
pub mod peer;

pub use local::LocalUpdatePeer;
pub use mirror::UpdateMirror;
pub use peer::{UpdatePeer, UpdateState};
