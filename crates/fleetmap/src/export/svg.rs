//! SVG drawing of a snapshot.
//!
//! Nodes are rounded boxes with their name and label, edges are straight
//! lines between the sockets they name. The drawing is cropped to the
//! snapshot's extent plus a margin.

use std::{
    collections::HashMap,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, error, info};
use svg::{
    Document,
    node::{Text as SvgText, element as svg_element},
};

use fleetmap_core::geometry::{Bounds, Point};

use crate::{
    error::FleetmapError,
    export::Exporter,
    view::{EdgeView, NodeView, Snapshot, SocketSide},
};

const MARGIN: f32 = 50.0;
const CORNER_RADIUS: f32 = 12.0;
const ROOT_CORNER_RADIUS: f32 = 48.0;
const NAME_FONT_SIZE: f32 = 16.0;
const LABEL_FONT_SIZE: f32 = 13.0;
const FONT_FAMILY: &str = "Helvetica, Arial, sans-serif";
const BACKGROUND: &str = "#222";
const NAME_COLOR: &str = "#eee";

/// Writes snapshots as SVG documents.
#[derive(Debug, Clone)]
pub struct Svg {
    path: PathBuf,
}

impl Svg {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Draws `snapshot` into a standalone document
    pub fn render(snapshot: &Snapshot) -> Document {
        let extent = snapshot
            .extent()
            .unwrap_or_else(|| Bounds::from_center(0.0, 0.0));
        let offset = Point::new(MARGIN - extent.min_x(), MARGIN - extent.min_y());
        let width = extent.width() + MARGIN * 2.0;
        let height = extent.height() + MARGIN * 2.0;
        debug!(width = width, height = height; "SVG dimensions");

        let sockets: HashMap<&str, Point> = snapshot
            .nodes()
            .iter()
            .flat_map(|node| {
                node.sockets()
                    .iter()
                    .map(move |socket| (socket.id(), socket_anchor(node, socket.side())))
            })
            .collect();

        let mut edges = svg_element::Group::new().set("data-layer", "edges");
        for edge in snapshot.edges() {
            if let Some(line) = render_edge(edge, &sockets, offset) {
                edges = edges.add(line);
            }
        }

        let mut nodes = svg_element::Group::new().set("data-layer", "nodes");
        for node in snapshot.nodes() {
            nodes = nodes.add(render_node(node, offset));
        }

        Document::new()
            .set("viewBox", format!("0 0 {width} {height}"))
            .set("width", width)
            .set("height", height)
            .set("data-version", snapshot.version())
            .add(
                svg_element::Rectangle::new()
                    .set("width", "100%")
                    .set("height", "100%")
                    .set("fill", BACKGROUND),
            )
            .add(edges)
            .add(nodes)
    }

    fn write_document(&self, doc: &Document) -> Result<(), FleetmapError> {
        info!(path:? = self.path; "Creating SVG file");
        let mut file = File::create(&self.path).inspect_err(|err| {
            error!(path:? = self.path, err:% = err; "Failed to create SVG file");
        })?;

        write!(file, "{doc}").inspect_err(|err| {
            error!(path:? = self.path, err:% = err; "Failed to write SVG content");
        })?;
        Ok(())
    }
}

impl Exporter for Svg {
    fn export_snapshot(&self, snapshot: &Snapshot) -> Result<(), FleetmapError> {
        let doc = Self::render(snapshot);
        debug!("SVG document rendered");
        self.write_document(&doc)
    }
}

/// Where an edge attaches to `node` for a socket on `side`
fn socket_anchor(node: &NodeView, side: SocketSide) -> Point {
    let bounds = node.bounds();
    let x = match side {
        SocketSide::Left => bounds.min_x(),
        SocketSide::Right => bounds.max_x(),
    };
    Point::new(x, bounds.center().y())
}

fn render_node(node: &NodeView, offset: Point) -> svg_element::Group {
    let bounds = node.bounds().translate(offset);
    let center = bounds.center();
    let radius = if node.sockets().len() > 1 {
        ROOT_CORNER_RADIUS
    } else {
        CORNER_RADIUS
    };

    let body = svg_element::Rectangle::new()
        .set("x", bounds.min_x())
        .set("y", bounds.min_y())
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set("rx", radius)
        .set("fill", BACKGROUND)
        .set("stroke", &node.color())
        .set("stroke-width", 2.0);

    let name = svg_element::Text::new("")
        .set("x", center.x())
        .set("y", center.y() - NAME_FONT_SIZE * 0.6)
        .set("text-anchor", "middle")
        .set("dominant-baseline", "central")
        .set("font-family", FONT_FAMILY)
        .set("font-size", NAME_FONT_SIZE)
        .set("fill", NAME_COLOR)
        .add(SvgText::new(node.name()));

    let mut group = svg_element::Group::new()
        .set("id", node.id().to_string())
        .add(body)
        .add(name);

    if !node.label().is_empty() {
        let label = svg_element::Text::new("")
            .set("x", center.x())
            .set("y", center.y() + LABEL_FONT_SIZE)
            .set("text-anchor", "middle")
            .set("dominant-baseline", "central")
            .set("font-family", FONT_FAMILY)
            .set("font-size", LABEL_FONT_SIZE)
            .set("fill", &node.label_color())
            .add(SvgText::new(node.label()));
        group = group.add(label);
    }

    for socket in node.sockets() {
        let anchor = socket_anchor(node, socket.side()).add_point(offset);
        group = group.add(
            svg_element::Circle::new()
                .set("cx", anchor.x())
                .set("cy", anchor.y())
                .set("r", 5.0)
                .set("fill", &socket.color()),
        );
    }

    group
}

fn render_edge(
    edge: &EdgeView,
    sockets: &HashMap<&str, Point>,
    offset: Point,
) -> Option<svg_element::Line> {
    let from = sockets.get(edge.from_socket())?.add_point(offset);
    let to = sockets.get(edge.to_socket())?.add_point(offset);

    Some(
        svg_element::Line::new()
            .set("id", edge.id())
            .set("x1", from.x())
            .set("y1", from.y())
            .set("x2", to.x())
            .set("y2", to.y())
            .set("stroke", &edge.color())
            .set("stroke-width", 2.0),
    )
}
