//! Discovery records consumed by the layout engine.
//!
//! These types mirror what the data-access layer polls from the inventory
//! service: [`Node`] records, network [`Lookup`]s and the [`GatewayConfig`].
//! They are plain immutable values. Everything the engine derives from them
//! (tree edges, attached lookups, container flags, positions) is kept in
//! separate structures so these records stay free of layout state.
//!
//! Field names follow the wire format (`relationType`, `macAddress`, ...) and
//! every field is optional on the wire; missing data decodes to an empty
//! default instead of failing.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// Relation type marking structural containment.
pub const ENCLOSES: &str = "encloses";

/// Prefix of the tag that marks a node as a container of a docker host.
pub const DOCKER_HOST_TAG_PREFIX: &str = "dockerHost:";

/// A discovered infrastructure entity (host, container, enclosure, ...).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    id: Id,
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    tags: IndexSet<String>,
    /// Entries may be `null` on the wire; those are skipped when iterating.
    #[serde(default)]
    relations: Vec<Option<Relation>>,
    #[serde(default)]
    identifiers: Vec<Id>,
    #[serde(default)]
    docker: Option<DockerInfo>,
}

impl Node {
    /// Creates a node with the given id and name and no other data.
    ///
    /// ```
    /// use fleetmap_core::model::Node;
    ///
    /// let node = Node::new("b", "compute-01")
    ///     .with_tags(["rack:1"])
    ///     .with_relation("containedBy", ["chassis-9"]);
    /// assert_eq!(node.relations().count(), 1);
    /// ```
    pub fn new(id: impl Into<Id>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: String::new(),
            tags: IndexSet::new(),
            relations: Vec::new(),
            identifiers: Vec::new(),
            docker: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Appends a relation of `relation_type` pointing at `targets`
    pub fn with_relation<I, T>(mut self, relation_type: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        self.relations.push(Some(Relation::new(relation_type, targets)));
        self
    }

    pub fn with_identifiers<I, T>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        self.identifiers
            .extend(identifiers.into_iter().map(Into::into));
        self
    }

    pub fn with_docker(mut self, docker: DockerInfo) -> Self {
        self.docker = Some(docker);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The inventory node type ("compute", "enclosure", ...)
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn tags(&self) -> &IndexSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Relations in wire order, skipping `null` entries
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter().flatten()
    }

    pub fn identifiers(&self) -> &[Id] {
        &self.identifiers
    }

    pub fn docker(&self) -> Option<&DockerInfo> {
        self.docker.as_ref()
    }

    /// Returns the docker host id if the node carries a `dockerHost:<id>` tag.
    ///
    /// When several such tags are present the first one wins.
    pub fn docker_host(&self) -> Option<&str> {
        self.tags
            .iter()
            .find_map(|tag| tag.strip_prefix(DOCKER_HOST_TAG_PREFIX))
    }
}

/// A typed, ordered list of related node keys.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(default)]
    relation_type: String,
    #[serde(default)]
    targets: Vec<Id>,
}

impl Relation {
    pub fn new<I, T>(relation_type: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Id>,
    {
        Self {
            relation_type: relation_type.into(),
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn relation_type(&self) -> &str {
        &self.relation_type
    }

    pub fn targets(&self) -> &[Id] {
        &self.targets
    }

    pub fn is_encloses(&self) -> bool {
        self.relation_type == ENCLOSES
    }

    /// The only target, when the relation has exactly one
    pub fn single_target(&self) -> Option<Id> {
        match self.targets.as_slice() {
            [target] => Some(*target),
            _ => None,
        }
    }
}

/// A network lookup entry tying an address to a node.
///
/// The owning node is named either by node id (`node`) or by hardware address
/// (`macAddress`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lookup {
    #[serde(default)]
    node: Option<Id>,
    #[serde(default)]
    mac_address: Option<String>,
    #[serde(default)]
    ip_address: Option<String>,
}

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, node: impl Into<Id>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_mac_address(mut self, mac_address: impl Into<String>) -> Self {
        self.mac_address = Some(mac_address.into());
        self
    }

    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn node(&self) -> Option<Id> {
        self.node
    }

    pub fn mac_address(&self) -> Option<&str> {
        self.mac_address.as_deref()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    /// Text shown for this lookup: the IP address, else the MAC address
    pub fn display_address(&self) -> Option<&str> {
        self.ip_address().or(self.mac_address())
    }
}

/// Docker metadata attached to container nodes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DockerInfo {
    #[serde(default)]
    container: Option<ContainerState>,
}

impl DockerInfo {
    pub fn new(container: ContainerState) -> Self {
        Self {
            container: Some(container),
        }
    }

    pub fn container(&self) -> Option<&ContainerState> {
        self.container.as_ref()
    }
}

/// Runtime state reported by the docker daemon for one container.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContainerState {
    #[serde(default, rename = "State")]
    state: String,
    #[serde(default, rename = "Status")]
    status: String,
}

impl ContainerState {
    pub fn new(state: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            status: status.into(),
        }
    }

    /// Short state, e.g. "running" or "exited"
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Human readable status, e.g. "Up 3 hours"
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.state == "running"
    }
}

/// Gateway settings read from the inventory service configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default, rename = "gatewayaddr")]
    gateway_address: Option<String>,
}

impl GatewayConfig {
    pub fn new(gateway_address: impl Into<String>) -> Self {
        Self {
            gateway_address: Some(gateway_address.into()),
        }
    }

    pub fn gateway_address(&self) -> Option<&str> {
        self.gateway_address.as_deref()
    }
}
