//! Topology graph builder.
//!
//! The builder is a pure function of its inputs. It never fails; malformed or
//! incomplete records degrade to documented defaults:
//!
//! - no root node, or more than one → no [`RootContext`]
//! - a lookup naming an unknown node → dropped
//! - an unresolvable, self-referencing, container or cyclic parent → the node
//!   hangs directly off the root
//! - repeated tags, lookups, children or edges → stored once

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace, warn};

use fleetmap_core::{
    identifier::Id,
    model::{DOCKER_HOST_TAG_PREFIX, GatewayConfig, Lookup, Node},
};

use super::{Edge, EdgeKind, KeyIndex, RootContext, TopologyNode};

/// Name of the root node in a default inventory.
pub const DEFAULT_ROOT_NAME: &str = "Local RackHD";

/// Builds [`RootContext`]s from discovery records.
///
/// # Examples
///
/// ```
/// use fleetmap::topology::TopologyBuilder;
/// use fleetmap_core::model::{GatewayConfig, Node};
///
/// let nodes = vec![
///     Node::new("root", "Local RackHD"),
///     Node::new("a", "container").with_tags(["dockerHost:root"]),
///     Node::new("b", "compute-01"),
/// ];
///
/// let context = TopologyBuilder::new()
///     .build(&nodes, &[], &GatewayConfig::default())
///     .expect("inventory has a root");
/// assert_eq!(context.docker_containers().len(), 1);
/// assert_eq!(context.root_children().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    root_name: String,
    node_mass: f32,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyBuilder {
    /// Creates a builder looking for the default root name, with unit mass.
    pub fn new() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            node_mass: 1.0,
        }
    }

    /// Set the name identifying the root node
    pub fn with_root_name(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    /// Set the simulation weight given to every node
    pub fn with_node_mass(mut self, node_mass: f32) -> Self {
        self.node_mass = node_mass;
        self
    }

    /// Builds the rooted graph for one refresh cycle.
    ///
    /// Returns `None` when the inventory has no node named after the root, or
    /// more than one; callers treat that as "no topology yet".
    pub fn build(
        &self,
        nodes: &[Node],
        lookups: &[Lookup],
        config: &GatewayConfig,
    ) -> Option<RootContext> {
        let index = KeyIndex::new(nodes);

        // Repeated ids keep their first position but the last record.
        let mut unique: IndexMap<Id, &Node> = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            unique.insert(node.id(), node);
        }

        let root = self.find_root(&unique)?;

        let mut topology: IndexMap<Id, TopologyNode> = unique
            .values()
            .map(|&node| (node.id(), TopologyNode::new(node.clone(), self.node_mass)))
            .collect();
        let mut edges: IndexSet<Edge> = IndexSet::new();

        let (docker_containers, other_nodes) =
            partition_nodes(root, &mut topology, &mut edges);

        attach_lookups(root, lookups, &index, &mut topology, &mut edges);

        let members: HashSet<Id> = other_nodes.iter().copied().collect();
        let mut parents = resolve_parents(root, &other_nodes, &members, &index, &topology);
        break_parent_cycles(&mut parents);
        attach_children(root, &parents, &mut topology, &mut edges);

        register_enclosures(&index, &mut topology, &mut edges);

        debug!(
            root:% = root,
            nodes_count = topology.len(),
            docker_containers_count = docker_containers.len(),
            other_nodes_count = other_nodes.len(),
            edges_count = edges.len();
            "Topology built"
        );

        Some(RootContext {
            root,
            gateway_address: config.gateway_address().map(str::to_string),
            nodes: topology,
            docker_containers,
            other_nodes,
            edges,
        })
    }

    fn find_root(&self, unique: &IndexMap<Id, &Node>) -> Option<Id> {
        let mut candidates = unique
            .values()
            .filter(|node| node.name() == self.root_name)
            .map(|node| node.id());

        let root = candidates.next();
        let extra = candidates.count();

        match root {
            None => {
                debug!(root_name = self.root_name.as_str(); "No root node in inventory");
                None
            }
            Some(_) if extra > 0 => {
                warn!(
                    root_name = self.root_name.as_str(),
                    candidates_count = extra + 1;
                    "Ambiguous root node, skipping topology"
                );
                None
            }
            Some(root) => Some(root),
        }
    }
}

/// Builds a [`RootContext`] with the default [`TopologyBuilder`].
pub fn build(nodes: &[Node], lookups: &[Lookup], config: &GatewayConfig) -> Option<RootContext> {
    TopologyBuilder::new().build(nodes, lookups, config)
}

/// Splits non-root nodes into root-hosted containers and forest candidates.
fn partition_nodes(
    root: Id,
    topology: &mut IndexMap<Id, TopologyNode>,
    edges: &mut IndexSet<Edge>,
) -> (Vec<Id>, Vec<Id>) {
    let root_host = root.to_string();
    let mut docker_containers = Vec::new();
    let mut other_nodes = Vec::new();

    for (&id, entry) in topology.iter_mut() {
        if id == root {
            continue;
        }

        let hosted_by_root = entry
            .node
            .tags()
            .iter()
            .filter_map(|tag| tag.strip_prefix(DOCKER_HOST_TAG_PREFIX))
            .any(|host| host == root_host);

        if hosted_by_root {
            entry.flags.is_docker_container = true;
            entry.flags.is_root_docker_container = true;
            edges.insert(Edge::new(root, id, EdgeKind::Container));
            docker_containers.push(id);
        } else {
            other_nodes.push(id);
        }
    }

    (docker_containers, other_nodes)
}

fn attach_lookups(
    root: Id,
    lookups: &[Lookup],
    index: &KeyIndex,
    topology: &mut IndexMap<Id, TopologyNode>,
    edges: &mut IndexSet<Edge>,
) {
    for lookup in lookups {
        let owner = lookup
            .node()
            .and_then(|node| index.resolve(node))
            .or_else(|| lookup.mac_address().and_then(|mac| index.resolve_str(mac)));

        let Some(owner) = owner else {
            trace!(lookup:? = lookup; "Dropping lookup without a known owner");
            continue;
        };
        let Some(entry) = topology.get_mut(&owner) else {
            continue;
        };

        if entry.attach_lookup(lookup) && owner != root {
            edges.insert(Edge::new(root, owner, EdgeKind::Lookup));
            edges.insert(Edge::new(owner, root, EdgeKind::Lookup));
        }
    }
}

/// Picks a tree parent for every forest node.
///
/// Relations are scanned in order, `encloses` relations are skipped and every
/// relation with exactly one target overwrites the candidate, so the last one
/// wins even when its target cannot be resolved. Candidates that are the root,
/// the node itself, or not a forest node resolve to no parent.
fn resolve_parents(
    root: Id,
    other_nodes: &[Id],
    members: &HashSet<Id>,
    index: &KeyIndex,
    topology: &IndexMap<Id, TopologyNode>,
) -> IndexMap<Id, Option<Id>> {
    other_nodes
        .iter()
        .map(|&id| {
            let mut candidate = None;
            for relation in topology[&id].node.relations() {
                if relation.is_encloses() {
                    continue;
                }
                if let Some(target) = relation.single_target() {
                    candidate = index.resolve(target);
                }
            }

            let parent = candidate.filter(|&parent| {
                let accepted = parent != id && parent != root && members.contains(&parent);
                if !accepted && parent != root {
                    trace!(node:% = id, parent:% = parent; "Ignoring parent outside the forest");
                }
                accepted
            });

            (id, parent)
        })
        .collect()
}

/// Cuts parent cycles so every forest node stays reachable from the root.
///
/// Nodes are visited in input order; the first visited member of a cycle is
/// detached and hangs directly off the root.
fn break_parent_cycles(parents: &mut IndexMap<Id, Option<Id>>) {
    let ids: Vec<Id> = parents.keys().copied().collect();
    for id in ids {
        let mut cursor = parents.get(&id).copied().flatten();
        let mut hops = 0;
        while let Some(current) = cursor {
            if current == id {
                debug!(node:% = id; "Breaking parent cycle");
                parents.insert(id, None);
                break;
            }
            hops += 1;
            if hops > parents.len() {
                break;
            }
            cursor = parents.get(&current).copied().flatten();
        }
    }
}

fn attach_children(
    root: Id,
    parents: &IndexMap<Id, Option<Id>>,
    topology: &mut IndexMap<Id, TopologyNode>,
    edges: &mut IndexSet<Edge>,
) {
    for (&id, &parent) in parents {
        let parent = parent.unwrap_or(root);
        let Some(entry) = topology.get_mut(&parent) else {
            continue;
        };
        if entry.attach_child(id) {
            edges.insert(Edge::new(id, parent, EdgeKind::Tree));
        }
    }
}

/// Marks enclosures and links them to every resolvable enclosed node.
fn register_enclosures(
    index: &KeyIndex,
    topology: &mut IndexMap<Id, TopologyNode>,
    edges: &mut IndexSet<Edge>,
) {
    for (&id, entry) in topology.iter_mut() {
        for relation in entry.node.relations().filter(|relation| relation.is_encloses()) {
            entry.flags.is_enclosure = true;
            for &target in relation.targets() {
                match index.resolve(target) {
                    Some(target) if target != id => {
                        edges.insert(Edge::new(id, target, EdgeKind::Encloses));
                    }
                    Some(_) => {}
                    None => {
                        trace!(node:% = id, target:% = target; "Dropping unknown enclosed node");
                    }
                }
            }
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use super::*;

    /// Small inventories with dense, messy cross references.
    fn inventory_strategy() -> impl Strategy<Value = Vec<Node>> {
        let node_count = 1usize..12;
        node_count.prop_flat_map(|count| {
            let key = move || (0..count + 2).prop_map(|i| format!("n{i}"));
            let node = (
                prop::collection::vec((prop::bool::ANY, key()), 0..4),
                prop::collection::vec(key(), 0..3),
                prop::bool::ANY,
                prop::collection::vec(key(), 0..3),
            );
            (
                prop::collection::vec(node, count),
                prop::option::of(0..count),
            )
                .prop_map(|(specs, root_at)| {
                    specs
                        .into_iter()
                        .enumerate()
                        .map(|(i, (relations, enclosed, hosted, identifiers))| {
                            let name = if Some(i) == root_at {
                                DEFAULT_ROOT_NAME.to_string()
                            } else {
                                format!("node {i}")
                            };
                            let mut node = Node::new(format!("n{i}"), name)
                                .with_identifiers(identifiers);
                            if hosted {
                                node = node.with_tags(["dockerHost:n0", "dockerHost:n0"]);
                            }
                            for (encloses, target) in relations {
                                let kind = if encloses { "encloses" } else { "containedBy" };
                                node = node.with_relation(kind, [target]);
                            }
                            if !enclosed.is_empty() {
                                node = node.with_relation("encloses", enclosed);
                            }
                            node
                        })
                        .collect()
                })
        })
    }

    fn check_root_detection(nodes: &[Node]) -> Result<(), TestCaseError> {
        let roots: Vec<Id> = nodes
            .iter()
            .filter(|node| node.name() == DEFAULT_ROOT_NAME)
            .map(Node::id)
            .collect();
        let context = build(nodes, &[], &GatewayConfig::default());

        match roots.as_slice() {
            [root] => prop_assert_eq!(context.map(|c| c.root_id()), Some(*root)),
            _ => prop_assert!(context.is_none()),
        }
        Ok(())
    }

    fn check_every_node_once(nodes: &[Node]) -> Result<(), TestCaseError> {
        let Some(context) = build(nodes, &[], &GatewayConfig::default()) else {
            return Ok(());
        };

        let mut seen: HashMap<Id, usize> = HashMap::new();
        for &id in context.docker_containers() {
            *seen.entry(id).or_default() += 1;
        }
        for (_, node) in context.walk_forest() {
            *seen.entry(node.id()).or_default() += 1;
        }

        for node in context.nodes() {
            let id = node.id();
            let expected = usize::from(id != context.root_id());
            prop_assert_eq!(seen.get(&id).copied().unwrap_or(0), expected, "node {}", id);
        }
        Ok(())
    }

    fn check_no_dangling_edges(nodes: &[Node]) -> Result<(), TestCaseError> {
        let Some(context) = build(nodes, &[], &GatewayConfig::default()) else {
            return Ok(());
        };
        for edge in context.edges() {
            prop_assert!(context.contains(edge.from()));
            prop_assert!(context.contains(edge.to()));
            prop_assert_ne!(edge.from(), edge.to());
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn root_detection(nodes in inventory_strategy()) {
            check_root_detection(&nodes)?;
        }

        #[test]
        fn every_node_once(nodes in inventory_strategy()) {
            check_every_node_once(&nodes)?;
        }

        #[test]
        fn no_dangling_edges(nodes in inventory_strategy()) {
            check_no_dangling_edges(&nodes)?;
        }
    }
}
