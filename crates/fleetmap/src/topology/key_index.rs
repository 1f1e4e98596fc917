//! Multi-key node index.
//!
//! Discovery records refer to each other by node id, but lookups and
//! relations may also use an alternate key such as a hardware address. The
//! index maps every id and every declared identifier to the canonical node
//! id. It is built fresh for every build.

use std::collections::HashMap;

use log::trace;

use fleetmap_core::{identifier::Id, model::Node};

/// Maps node ids and alternate identifiers to canonical node ids.
///
/// Keys are registered in input order, each node's id before its identifiers.
/// When two registrations use the same key the later one wins.
#[derive(Debug, Default, Clone)]
pub struct KeyIndex {
    keys: HashMap<Id, Id>,
}

impl KeyIndex {
    /// Builds the index over `nodes`.
    pub fn new<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let mut index = Self::default();
        for node in nodes {
            index.register(node.id(), node.id());
            for &identifier in node.identifiers() {
                index.register(identifier, node.id());
            }
        }
        index
    }

    fn register(&mut self, key: Id, node: Id) {
        match self.keys.insert(key, node) {
            Some(previous) if previous != node => {
                trace!(key:% = key, previous:% = previous, node:% = node; "Index key reassigned");
            }
            _ => {}
        }
    }

    /// Canonical node id for `key`, if any node claims it
    pub fn resolve(&self, key: Id) -> Option<Id> {
        self.keys.get(&key).copied()
    }

    /// Canonical node id for a key given as a string
    pub fn resolve_str(&self, key: &str) -> Option<Id> {
        self.resolve(Id::new(key))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
