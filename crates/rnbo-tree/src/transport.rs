//! The boundary to the OSCQuery wire encoder, which is an external
//! collaborator the rest of the system only assumes this interface about.

use crate::types::ParamValue;

pub trait OscQueryTransport: Send + Sync {
    fn publish(&self, path: &str, value: &ParamValue);
    fn node_added(&self, _path: &str) {}
    fn node_removed(&self, _path: &str) {}
}

/// No-op transport that logs instead of serving OSCQuery, for tests and
/// stand-alone runs with no control surface attached.
#[derive(Default)]
pub struct LoggingTransport;

impl OscQueryTransport for LoggingTransport {
    fn publish(&self, path: &str, value: &ParamValue) {
        log::debug!("publish {path} = {value:?}");
    }

    fn node_added(&self, path: &str) {
        log::debug!("node added {path}");
    }

    fn node_removed(&self, path: &str) {
        log::debug!("node removed {path}");
    }
}
