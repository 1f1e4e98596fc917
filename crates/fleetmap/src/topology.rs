//! Rooted topology graph built from discovery records.
//!
//! This module turns the loosely linked inventory data (nodes, relation
//! lists, lookups, docker host tags) into one consistent rooted graph, a
//! [`RootContext`]. The graph is rebuilt wholesale on every refresh; there is
//! no incremental diffing.
//!
//! # Architecture
//!
//! - [`KeyIndex`]: maps every node id and alternate identifier to its node
//! - [`build`]: the pure transform from records to a [`RootContext`]
//! - [`TopologyNode`]: an input [`Node`] plus what the builder derived for it
//! - [`Edge`]: a directed pair used for simulation and rendering only
//!
//! Input records are never modified. Derived data (attached lookups, tree
//! children, container flags, mass) lives on [`TopologyNode`], positions
//! live in the layout layer.

mod builder;
mod key_index;

pub use builder::{DEFAULT_ROOT_NAME, TopologyBuilder, build};
pub use key_index::KeyIndex;

use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};

use fleetmap_core::{
    identifier::Id,
    model::{Lookup, Node},
};

/// A transient connection between two nodes.
///
/// Edges only feed the spring simulation and the renderer. They are directed
/// so that both directions of a pair may be registered. Equality and hashing
/// look at the directed pair only, so a graph stores each pair once with the
/// kind it was first registered under.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    from: Id,
    to: Id,
    kind: EdgeKind,
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.from.hash(state);
        self.to.hash(state);
    }
}

impl Edge {
    pub fn new(from: Id, to: Id, kind: EdgeKind) -> Self {
        Self { from, to, kind }
    }

    pub fn from(self) -> Id {
        self.from
    }

    pub fn to(self) -> Id {
        self.to
    }

    pub fn kind(self) -> EdgeKind {
        self.kind
    }

    /// True when the edge joins `a` and `b` in either direction
    pub fn connects(self, a: Id, b: Id) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

/// Why an edge was registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Root to a container it hosts.
    Container,
    /// Root to a node owning a network lookup.
    Lookup,
    /// Child to its tree parent (or to the root when it has none).
    Tree,
    /// Enclosure to an enclosed node; not part of the tree.
    Encloses,
}

/// Flags the builder derives for a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// Drawn as a docker container. Only containers hosted by the root get
    /// this; containers on other hosts are drawn like any other host.
    pub is_docker_container: bool,
    /// Is a container hosted by the root node.
    pub is_root_docker_container: bool,
    /// Has an `encloses` relation.
    pub is_enclosure: bool,
}

/// An input node together with the data derived for it during a build.
#[derive(Debug, Clone)]
pub struct TopologyNode {
    node: Node,
    lookups: Vec<Lookup>,
    children: Vec<Id>,
    flags: NodeFlags,
    mass: f32,
}

impl TopologyNode {
    fn new(node: Node, mass: f32) -> Self {
        Self {
            node,
            lookups: Vec::new(),
            children: Vec::new(),
            flags: NodeFlags::default(),
            mass,
        }
    }

    pub fn id(&self) -> Id {
        self.node.id()
    }

    /// The untouched input record
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Lookups attached to this node, in input order, without duplicates
    pub fn lookups(&self) -> &[Lookup] {
        &self.lookups
    }

    /// Tree children, in attachment order, without duplicates
    pub fn children(&self) -> &[Id] {
        &self.children
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Simulation weight
    pub fn mass(&self) -> f32 {
        self.mass
    }

    fn attach_lookup(&mut self, lookup: &Lookup) -> bool {
        if self.lookups.contains(lookup) {
            return false;
        }
        self.lookups.push(lookup.clone());
        true
    }

    fn attach_child(&mut self, child: Id) -> bool {
        if self.children.contains(&child) {
            return false;
        }
        self.children.push(child);
        true
    }
}

/// The rooted graph produced by one build.
///
/// Every non-root node is either one of the root's docker containers or part
/// of the forest hanging off the root ([`RootContext::root_children`]).
#[derive(Debug, Clone)]
pub struct RootContext {
    root: Id,
    gateway_address: Option<String>,
    nodes: IndexMap<Id, TopologyNode>,
    docker_containers: Vec<Id>,
    other_nodes: Vec<Id>,
    edges: IndexSet<Edge>,
}

impl RootContext {
    /// Id of the root node
    pub fn root_id(&self) -> Id {
        self.root
    }

    pub fn root(&self) -> &TopologyNode {
        &self.nodes[&self.root]
    }

    /// Gateway address from the inventory configuration
    pub fn gateway_address(&self) -> Option<&str> {
        self.gateway_address.as_deref()
    }

    pub fn node(&self, id: Id) -> Option<&TopologyNode> {
        self.nodes.get(&id)
    }

    /// All nodes, root included, in input order
    pub fn nodes(&self) -> impl Iterator<Item = &TopologyNode> {
        self.nodes.values()
    }

    pub fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Containers hosted by the root, in input order
    pub fn docker_containers(&self) -> &[Id] {
        &self.docker_containers
    }

    /// Every node of the forest, flattened in input order
    pub fn other_nodes(&self) -> &[Id] {
        &self.other_nodes
    }

    /// Roots of the forest: the root's direct non-container children
    pub fn root_children(&self) -> &[Id] {
        self.root().children()
    }

    /// Tree children of `id`; empty for unknown ids
    pub fn children(&self, id: Id) -> &[Id] {
        self.nodes
            .get(&id)
            .map(TopologyNode::children)
            .unwrap_or_default()
    }

    /// Docker containers followed by forest nodes; the order placement uses
    pub fn placement_order(&self) -> impl Iterator<Item = Id> + '_ {
        self.docker_containers
            .iter()
            .chain(self.other_nodes.iter())
            .copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.edges.iter().copied()
    }

    pub fn edges_count(&self) -> usize {
        self.edges.len()
    }

    /// True when some edge joins `a` and `b` in either direction
    pub fn has_edge_between(&self, a: Id, b: Id) -> bool {
        self.edges.iter().any(|edge| edge.connects(a, b))
    }

    /// Walks the forest depth-first, yielding `(depth, node)` pairs.
    ///
    /// Depth 0 are the root's direct children. This is the order a tree-view
    /// inspector lists the hardware hierarchy in.
    pub fn walk_forest(&self) -> Vec<(usize, &TopologyNode)> {
        let mut visited = Vec::with_capacity(self.other_nodes.len());
        let mut stack: Vec<(usize, Id)> = self
            .root_children()
            .iter()
            .rev()
            .map(|&id| (0, id))
            .collect();

        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            visited.push((depth, node));
            stack.extend(node.children().iter().rev().map(|&child| (depth + 1, child)));
        }

        visited
    }
}
