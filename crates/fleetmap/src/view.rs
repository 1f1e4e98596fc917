//! Render-ready views of a laid out topology.
//!
//! A [`Snapshot`] carries everything a renderer needs to draw the topology
//! without any graph logic of its own: one [`NodeView`] per placed node with
//! its box, colors, label and sockets, and one [`EdgeView`] per connected
//! node pair naming the sockets it joins.

use std::collections::HashSet;

use serde::Serialize;

use fleetmap_core::{
    color::Color,
    geometry::{Bounds, Point},
    identifier::Id,
};

use crate::{
    config::Palette,
    layout::LayoutState,
    topology::{EdgeKind, RootContext, TopologyNode},
};

/// Socket on the root's left side, used by the root's docker containers.
pub const ROOT_SOCKET_LEFT: &str = "localRackHDSocketLeft";

/// Socket on the root's right side, used by every other node.
pub const ROOT_SOCKET_RIGHT: &str = "localRackHDSocketRight";

/// Vertical offset of an edge's root end while the simulation runs.
const SIMULATING_ROOT_OFFSET_Y: f32 = -300.0;

/// Vertical offset of an edge's node end.
const NODE_OFFSET_Y: f32 = -80.0;

/// What a node view represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeRole {
    Root,
    DockerContainer,
    Host,
    Enclosure,
}

/// Which side of a node box a socket sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SocketSide {
    Left,
    Right,
}

impl SocketSide {
    /// Unit direction an attached edge leaves the box in
    pub fn direction(self) -> Point {
        match self {
            Self::Left => Point::new(-1.0, 0.0),
            Self::Right => Point::new(1.0, 0.0),
        }
    }
}

/// An attachment point for edges on a node box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketView {
    id: String,
    side: SocketSide,
    color: Color,
}

impl SocketView {
    fn new(id: impl Into<String>, side: SocketSide, color: Color) -> Self {
        Self {
            id: id.into(),
            side,
            color,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn side(&self) -> SocketSide {
        self.side
    }

    pub fn color(&self) -> Color {
        self.color
    }
}

/// A positioned node ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    id: Id,
    name: String,
    role: NodeRole,
    color: Color,
    label: String,
    label_color: Color,
    bounds: Bounds,
    sockets: Vec<SocketView>,
}

impl NodeView {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Fill color hint
    pub fn color(&self) -> Color {
        self.color
    }

    /// Secondary text: container state, network addresses or the gateway address
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn label_color(&self) -> Color {
        self.label_color
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn sockets(&self) -> &[SocketView] {
        &self.sockets
    }

    /// The socket with `id`, if this node exposes it
    pub fn socket(&self, id: &str) -> Option<&SocketView> {
        self.sockets.iter().find(|socket| socket.id == id)
    }
}

/// What an edge view represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeRole {
    /// Root to one of its docker containers.
    DockerContainer,
    /// Tree or lookup link.
    Host,
    /// Enclosure to an enclosed node.
    Enclosure,
}

/// A link between two node sockets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    id: String,
    from_node: Id,
    to_node: Id,
    from_socket: String,
    to_socket: String,
    role: EdgeRole,
    color: Color,
    offset_from_y: f32,
    offset_to_y: f32,
}

impl EdgeView {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn from_node(&self) -> Id {
        self.from_node
    }

    pub fn to_node(&self) -> Id {
        self.to_node
    }

    pub fn from_socket(&self) -> &str {
        &self.from_socket
    }

    pub fn to_socket(&self) -> &str {
        &self.to_socket
    }

    pub fn role(&self) -> EdgeRole {
        self.role
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Vertical offset applied to the `from` end
    pub fn offset_from_y(&self) -> f32 {
        self.offset_from_y
    }

    /// Vertical offset applied to the `to` end
    pub fn offset_to_y(&self) -> f32 {
        self.offset_to_y
    }

    /// True when the edge joins `a` and `b` in either direction
    pub fn connects(&self, a: Id, b: Id) -> bool {
        (self.from_node == a && self.to_node == b) || (self.from_node == b && self.to_node == a)
    }
}

/// A versioned set of node and edge views.
///
/// `version` changes only when the topology is rebuilt, not when nodes move,
/// so renderers can key long-lived resources on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    version: u64,
    simulating: bool,
    nodes: Vec<NodeView>,
    edges: Vec<EdgeView>,
}

impl Snapshot {
    /// A snapshot with no topology, as emitted when the root disappears
    pub fn empty(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the force simulation was running when the snapshot was taken
    pub fn simulating(&self) -> bool {
        self.simulating
    }

    /// Root first, then docker containers, then forest nodes
    pub fn nodes(&self) -> &[NodeView] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeView] {
        &self.edges
    }

    pub fn node(&self, id: Id) -> Option<&NodeView> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Smallest box containing every node, if any
    pub fn extent(&self) -> Option<Bounds> {
        let mut boxes = self.nodes.iter().map(NodeView::bounds);
        let first = boxes.next()?;
        Some(boxes.fold(first, |acc, bounds| {
            Bounds::new(
                Point::new(acc.min_x().min(bounds.min_x()), acc.min_y().min(bounds.min_y())),
                Point::new(acc.max_x().max(bounds.max_x()), acc.max_y().max(bounds.max_y())),
            )
        }))
    }
}

/// Turns a [`RootContext`] and its [`LayoutState`] into a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct ViewBuilder {
    palette: Palette,
    origin: Point,
}

impl ViewBuilder {
    pub fn new(palette: Palette, origin: Point) -> Self {
        Self { palette, origin }
    }

    /// Builds the views for the current placement.
    ///
    /// Nodes without bounds are left out along with their edges.
    pub fn build(
        &self,
        context: &RootContext,
        state: &LayoutState,
        simulating: bool,
        version: u64,
    ) -> Snapshot {
        let root = context.root();
        let mut nodes = Vec::with_capacity(context.nodes_count());
        if let Some(bounds) = state.get(root.id()) {
            nodes.push(self.root_view(context, bounds));
        }
        nodes.extend(context.placement_order().filter_map(|id| {
            let node = context.node(id)?;
            let bounds = state.get(id)?;
            Some(self.node_view(node, bounds))
        }));

        let placed: HashSet<Id> = nodes.iter().map(NodeView::id).collect();
        let edges = self.edge_views(context, &placed, simulating);

        Snapshot {
            version,
            simulating,
            nodes,
            edges,
        }
    }

    fn root_view(&self, context: &RootContext, bounds: Bounds) -> NodeView {
        let root = context.root();
        NodeView {
            id: root.id(),
            name: root.node().name().to_string(),
            role: NodeRole::Root,
            color: self.palette.root,
            label: context.gateway_address().unwrap_or_default().to_string(),
            label_color: self.palette.host,
            bounds,
            sockets: vec![
                SocketView::new(ROOT_SOCKET_LEFT, SocketSide::Left, self.palette.docker_container),
                SocketView::new(ROOT_SOCKET_RIGHT, SocketSide::Right, self.palette.host),
            ],
        }
    }

    fn node_view(&self, node: &TopologyNode, bounds: Bounds) -> NodeView {
        let flags = node.flags();
        let base_color = if flags.is_docker_container {
            self.palette.docker_container
        } else {
            self.palette.host
        };

        let (role, color) = if flags.is_enclosure {
            (NodeRole::Enclosure, self.palette.enclosure)
        } else if flags.is_docker_container {
            (NodeRole::DockerContainer, base_color)
        } else {
            (NodeRole::Host, base_color)
        };

        let (label, label_color) = if flags.is_root_docker_container {
            let container = node.node().docker().and_then(|docker| docker.container());
            let running = container.is_some_and(|container| container.is_running());
            let state = container.map(|container| container.state()).unwrap_or_default();
            let label_color = if running {
                base_color
            } else {
                self.palette.stopped_container
            };
            (state.to_string(), label_color)
        } else {
            let addresses: Vec<&str> = node
                .lookups()
                .iter()
                .filter_map(|lookup| lookup.display_address())
                .collect();
            (addresses.join(" "), base_color)
        };

        // Sockets face the root: nodes left of the origin connect on their right.
        let side = if bounds.max_x() < self.origin.x() {
            SocketSide::Right
        } else {
            SocketSide::Left
        };

        NodeView {
            id: node.id(),
            name: node.node().name().to_string(),
            role,
            color,
            label,
            label_color,
            bounds,
            sockets: vec![SocketView::new(socket_id(node.id()), side, base_color)],
        }
    }

    fn edge_views(&self, context: &RootContext, placed: &HashSet<Id>, simulating: bool) -> Vec<EdgeView> {
        let root = context.root_id();
        let root_offset = if simulating { SIMULATING_ROOT_OFFSET_Y } else { 0.0 };
        let mut seen: HashSet<(Id, Id)> = HashSet::new();
        let mut views = Vec::new();

        // A pair joined by an encloses edge draws as an enclosure link even
        // when a tree edge between the same nodes came first.
        let enclosed: HashSet<(Id, Id)> = context
            .edges()
            .filter(|edge| edge.kind() == EdgeKind::Encloses)
            .map(|edge| (edge.from(), edge.to()))
            .collect();

        for edge in context.edges() {
            let (from, to) = (edge.from(), edge.to());
            if !placed.contains(&from) || !placed.contains(&to) {
                continue;
            }
            if seen.contains(&(to, from)) || !seen.insert((from, to)) {
                continue;
            }

            let view = if from == root || to == root {
                let other = if from == root { to } else { from };
                let is_container = context
                    .node(other)
                    .is_some_and(|node| node.flags().is_root_docker_container);
                let (socket, role, color) = if is_container {
                    (ROOT_SOCKET_LEFT, EdgeRole::DockerContainer, self.palette.docker_edge)
                } else {
                    (ROOT_SOCKET_RIGHT, EdgeRole::Host, self.palette.host_edge)
                };
                EdgeView {
                    id: format!("link-{other}"),
                    from_node: root,
                    to_node: other,
                    from_socket: socket.to_string(),
                    to_socket: socket_id(other),
                    role,
                    color,
                    offset_from_y: root_offset,
                    offset_to_y: NODE_OFFSET_Y,
                }
            } else {
                let (role, color) =
                    if enclosed.contains(&(from, to)) || enclosed.contains(&(to, from)) {
                        (EdgeRole::Enclosure, self.palette.enclosure_edge)
                    } else {
                        (EdgeRole::Host, self.palette.host_edge)
                    };
                EdgeView {
                    id: format!("link-{from}-{to}"),
                    from_node: from,
                    to_node: to,
                    from_socket: socket_id(from),
                    to_socket: socket_id(to),
                    role,
                    color,
                    offset_from_y: NODE_OFFSET_Y,
                    offset_to_y: NODE_OFFSET_Y,
                }
            };
            views.push(view);
        }

        views
    }
}

/// Socket id of a non-root node
pub fn socket_id(id: Id) -> String {
    format!("socket-{id}")
}
