//! The tree itself: a `BTreeMap<path, Node>` behind one build mutex.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::node::Node;
use crate::parameter::Parameter;
use crate::transport::OscQueryTransport;
use crate::types::ParamValue;

pub struct Tree {
    nodes: Mutex<BTreeMap<String, Node>>,
    transport: Arc<dyn OscQueryTransport>,
}

impl Tree {
    pub fn new(transport: Arc<dyn OscQueryTransport>) -> Self {
        Self {
            nodes: Mutex::new(BTreeMap::new()),
            transport,
        }
    }

    /// Hands a subsystem a builder scoped to `prefix`, under the build
    /// mutex. This is the only way instances and audio hosts extend the
    /// tree: they can only touch nodes under the branch they were handed.
    pub fn build_branch<R>(&self, prefix: &str, f: impl FnOnce(&mut Branch<'_>) -> R) -> R {
        let guard = self.nodes.lock().unwrap();
        let mut branch = Branch {
            prefix: prefix.trim_end_matches('/').to_string(),
            nodes: guard,
            transport: &self.transport,
        };
        f(&mut branch)
    }

    pub fn get_value(&self, path: &str) -> Option<ParamValue> {
        let nodes = self.nodes.lock().unwrap();
        nodes.get(path).and_then(|n| n.parameter.as_ref()).map(|p| p.value.clone())
    }

    pub fn set_value(&self, path: &str, value: ParamValue) {
        let mut nodes = self.nodes.lock().unwrap();
        if let Some(node) = nodes.get_mut(path) {
            if let Some(param) = &mut node.parameter {
                param.set(value);
                self.transport.publish(path, &param.value);
            }
        }
    }

    pub fn children(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.trim_end_matches('/');
        let nodes = self.nodes.lock().unwrap();
        nodes
            .keys()
            .filter(|p| p.starts_with(prefix) && *p != prefix)
            .cloned()
            .collect()
    }

    pub fn remove_subtree(&self, prefix: &str) {
        let prefix = prefix.trim_end_matches('/').to_string();
        let mut nodes = self.nodes.lock().unwrap();
        let to_remove: Vec<String> = nodes
            .keys()
            .filter(|p| **p == prefix || p.starts_with(&format!("{prefix}/")))
            .cloned()
            .collect();
        for path in to_remove {
            nodes.remove(&path);
            self.transport.node_removed(&path);
        }
    }
}

/// A scoped handle into the tree, bounded to one branch prefix.
pub struct Branch<'a> {
    prefix: String,
    nodes: MutexGuard<'a, BTreeMap<String, Node>>,
    transport: &'a Arc<dyn OscQueryTransport>,
}

impl<'a> Branch<'a> {
    fn full_path(&self, relative: &str) -> String {
        if relative.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{}", self.prefix, relative.trim_start_matches('/'))
        }
    }

    pub fn add_param(&mut self, relative_path: &str, parameter: Parameter) {
        let path = self.full_path(relative_path);
        self.nodes.insert(path.clone(), Node::leaf(path.clone(), parameter));
        self.transport.node_added(&path);
    }

    pub fn add_branch(&mut self, relative_path: &str) {
        let path = self.full_path(relative_path);
        self.nodes.entry(path.clone()).or_insert_with(|| Node::branch(path.clone()));
        self.transport.node_added(&path);
    }

    pub fn remove(&mut self, relative_path: &str) {
        let path = self.full_path(relative_path);
        self.nodes.remove(&path);
        self.transport.node_removed(&path);
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoggingTransport;
    use crate::types::AccessMode;

    #[test]
    fn build_branch_scopes_paths_under_prefix() {
        let tree = Tree::new(Arc::new(LoggingTransport));
        tree.build_branch("/rnbo/inst/0", |b| {
            b.add_param("params/gain", Parameter::new(AccessMode::Bi, ParamValue::Float(0.5)));
        });
        assert_eq!(
            tree.get_value("/rnbo/inst/0/params/gain"),
            Some(ParamValue::Float(0.5))
        );
    }

    #[test]
    fn set_value_invokes_callback_and_publishes() {
        let tree = Tree::new(Arc::new(LoggingTransport));
        tree.build_branch("/rnbo/inst/0", |b| {
            b.add_param("params/gain", Parameter::new(AccessMode::Bi, ParamValue::Float(0.0)));
        });
        tree.set_value("/rnbo/inst/0/params/gain", ParamValue::Float(0.9));
        assert_eq!(
            tree.get_value("/rnbo/inst/0/params/gain"),
            Some(ParamValue::Float(0.9))
        );
    }

    #[test]
    fn remove_subtree_drops_every_descendant() {
        let tree = Tree::new(Arc::new(LoggingTransport));
        tree.build_branch("/rnbo/inst/0", |b| {
            b.add_param("params/gain", Parameter::new(AccessMode::Bi, ParamValue::Float(0.0)));
            b.add_param("params/freq", Parameter::new(AccessMode::Bi, ParamValue::Float(440.0)));
        });
        tree.remove_subtree("/rnbo/inst/0");
        assert!(tree.children("/rnbo/inst/0").is_empty());
    }
}
