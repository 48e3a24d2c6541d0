//! Mirrors an `UpdatePeer`'s properties into the node tree. Called from the
//! control thread's periodic tick; never touches the tree from any other
//! thread.

use std::sync::Arc;

use rnbo_tree::{AccessMode, ParamValue, Tree};

use crate::peer::UpdatePeer;

pub struct UpdateMirror {
    tree: Arc<Tree>,
    peer: Arc<dyn UpdatePeer>,
    prefix: String,
}

impl UpdateMirror {
    /// Builds the `state`/`status`/`outdated_packages` nodes under `prefix`
    /// and seeds them from the peer's current values.
    pub fn new(tree: Arc<Tree>, peer: Arc<dyn UpdatePeer>, prefix: &str) -> Self {
        tree.build_branch(prefix, |b| {
            b.add_param(
                "state",
                rnbo_tree::Parameter::new(AccessMode::Get, ParamValue::String(peer.state().as_str().to_string())),
            );
            b.add_param("status", rnbo_tree::Parameter::new(AccessMode::Get, ParamValue::String(peer.status())));
            b.add_param(
                "outdated_packages",
                rnbo_tree::Parameter::new(AccessMode::Get, ParamValue::Int(peer.outdated_packages() as i64)),
            );
        });
        Self {
            tree,
            peer,
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Re-reads the peer's properties and writes any that changed. Cheap
    /// enough to call on every control-thread tick.
    pub fn refresh(&self) {
        let state = self.peer.state().as_str().to_string();
        let status = self.peer.status();
        let outdated = self.peer.outdated_packages() as i64;

        self.tree.set_value(&format!("{}/state", self.prefix), ParamValue::String(state));
        self.tree.set_value(&format!("{}/status", self.prefix), ParamValue::String(status));
        self.tree
            .set_value(&format!("{}/outdated_packages", self.prefix), ParamValue::Int(outdated));
    }

    pub fn peer(&self) -> &Arc<dyn UpdatePeer> {
        &self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalUpdatePeer;
    use rnbo_tree::LoggingTransport;

    #[test]
    fn seeds_tree_nodes_from_peer_on_construction() {
        let tree = Arc::new(Tree::new(Arc::new(LoggingTransport)));
        let peer: Arc<dyn UpdatePeer> = Arc::new(LocalUpdatePeer::new());
        let _mirror = UpdateMirror::new(tree.clone(), peer, "/rnbo/update");

        assert_eq!(
            tree.get_value("/rnbo/update/state"),
            Some(ParamValue::String("idle".to_string()))
        );
        assert_eq!(tree.get_value("/rnbo/update/outdated_packages"), Some(ParamValue::Int(0)));
    }

    #[test]
    fn refresh_rewrites_status_after_an_install_request() {
        let tree = Arc::new(Tree::new(Arc::new(LoggingTransport)));
        let peer = Arc::new(LocalUpdatePeer::new());
        let mirror = UpdateMirror::new(tree.clone(), peer.clone(), "/rnbo/update");

        peer.queue_runner_install("2.0.0").unwrap();
        mirror.refresh();

        match tree.get_value("/rnbo/update/status") {
            Some(ParamValue::String(s)) => assert!(s.contains("2.0.0")),
            other => panic!("unexpected status value: {other:?}"),
        }
    }
}
