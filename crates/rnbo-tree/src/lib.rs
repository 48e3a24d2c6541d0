//! A rooted tree of named nodes, mutated only under one build mutex so
//! external readers see a consistent snapshot. The OSCQuery wire encoding
//! itself is an external collaborator; `OscQueryTransport` is the only
//! thing the rest of the system assumes about it.

pub mod node;
pub mod parameter;
pub mod transport;
pub mod tree;
pub mod types;

pub use node::Node;
pub use parameter::Parameter;
pub use transport::{LoggingTransport, OscQueryTransport};
pub use tree::{Branch, Tree};
pub use types::{AccessMode, Domain, ParamValue};
