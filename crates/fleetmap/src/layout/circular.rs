//! Deterministic ring placement.

use log::debug;

use fleetmap_core::geometry::{Bounds, Circle, Point, Size};

use crate::{config::LayoutConfig, topology::RootContext};

use super::LayoutState;

/// Places the root on the world origin and every other node on one ring.
///
/// Docker containers come first, then the forest nodes, each in input order.
/// The ring radius grows with the number of placed nodes so neighbours keep
/// roughly the same spacing.
#[derive(Debug, Clone)]
pub struct CircularLayout {
    origin: Point,
    root_size: Size,
    node_size: Size,
    ring_spacing: f32,
    gap_skip: usize,
}

impl CircularLayout {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            origin: config.world_origin(),
            root_size: config.root_size(),
            node_size: config.node_size(),
            ring_spacing: config.ring_spacing(),
            gap_skip: config.ring_gap_skip(),
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// The root's box, centered on the world origin
    pub fn root_bounds(&self) -> Bounds {
        Bounds::from_center(self.root_size.width(), self.root_size.height()).translate(self.origin)
    }

    /// Assigns bounds to every node of `context` that has none.
    ///
    /// With `force` all existing bounds are discarded first. Returns the
    /// number of nodes that received new bounds.
    pub fn place(&self, context: &RootContext, state: &mut LayoutState, force: bool) -> usize {
        if force {
            state.clear();
        }

        let mut placed = 0;
        let root = context.root_id();
        if !state.contains(root) {
            state.set(root, self.root_bounds());
            placed += 1;
        }

        let ordered: Vec<_> = context.placement_order().collect();
        let radius = ordered.len() as f32 * self.ring_spacing;
        let steps = Circle::from_radius(radius)
            .with_gap_skip(self.gap_skip)
            .steps(ordered.len());
        let node_box = Bounds::from_center(self.node_size.width(), self.node_size.height());

        for (id, step) in ordered.into_iter().zip(steps) {
            if state.contains(id) {
                continue;
            }
            state.set(id, node_box.translate(step).translate(self.origin));
            placed += 1;
        }

        debug!(radius = radius, placed = placed, force = force; "Circular placement applied");
        placed
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use fleetmap_core::{
        identifier::Id,
        model::{GatewayConfig, Node},
    };

    use super::*;
    use crate::topology;

    fn context(count: usize) -> RootContext {
        let mut nodes = vec![Node::new("root", "Local RackHD")];
        nodes.extend((0..count).map(|i| Node::new(format!("n{i}"), format!("host {i}"))));
        topology::build(&nodes, &[], &GatewayConfig::default()).unwrap()
    }

    #[test]
    fn test_root_centered_on_origin() {
        let layout = CircularLayout::new(&LayoutConfig::default());
        let context = context(0);
        let mut state = LayoutState::new();

        assert_eq!(layout.place(&context, &mut state, false), 1);

        let root = state.get(context.root_id()).unwrap();
        assert_eq!(root.min_point(), Point::new(1350.0, 1350.0));
        assert_eq!(root.max_point(), Point::new(1650.0, 1650.0));
    }

    #[test]
    fn test_nodes_on_ring() {
        let config = LayoutConfig::default();
        let layout = CircularLayout::new(&config);
        let context = context(6);
        let mut state = LayoutState::new();

        assert_eq!(layout.place(&context, &mut state, false), 7);

        let radius = 6.0 * config.ring_spacing();
        for &id in context.other_nodes() {
            let bounds = state.get(id).unwrap();
            assert!(approx_eq!(f32, bounds.width(), 240.0, epsilon = 0.01));
            assert!(approx_eq!(f32, bounds.height(), 80.0, epsilon = 0.01));
            let distance = bounds.center().distance(config.world_origin());
            assert!(approx_eq!(f32, distance, radius, epsilon = 0.01));
        }
    }

    #[test]
    fn test_ring_gap_skip_from_config() {
        let config = LayoutConfig::default().with_ring_gap_skip(0);
        let layout = CircularLayout::new(&config);
        let context = context(4);
        let mut state = LayoutState::new();
        layout.place(&context, &mut state, false);

        // Without gaps the second node sits a quarter turn from the first.
        let second = state.get(Id::new("n1")).unwrap().center();
        assert!(approx_eq!(f32, second.x(), 1500.0, epsilon = 0.01));
        assert!(approx_eq!(f32, second.y(), 1650.0, epsilon = 0.01));

        let gapped = CircularLayout::new(&LayoutConfig::default());
        let mut gapped_state = LayoutState::new();
        gapped.place(&context, &mut gapped_state, false);
        let gapped_second = gapped_state.get(Id::new("n1")).unwrap().center();
        assert!(!approx_eq!(f32, gapped_second.x(), 1500.0, epsilon = 1.0));
    }

    #[test]
    fn test_existing_bounds_kept_unless_forced() {
        let layout = CircularLayout::new(&LayoutConfig::default());
        let context = context(3);
        let mut state = LayoutState::new();
        layout.place(&context, &mut state, false);

        let moved = Id::new("n1");
        let custom = Bounds::from_center(10.0, 10.0);
        state.set(moved, custom);

        assert_eq!(layout.place(&context, &mut state, false), 0);
        assert_eq!(state.get(moved), Some(custom));

        assert_eq!(layout.place(&context, &mut state, true), 4);
        assert_ne!(state.get(moved), Some(custom));
    }

    #[test]
    fn test_placement_is_deterministic() {
        let layout = CircularLayout::new(&LayoutConfig::default());
        let context = context(9);

        let mut first = LayoutState::new();
        let mut second = LayoutState::new();
        layout.place(&context, &mut first, false);
        layout.place(&context, &mut second, false);

        assert_eq!(first, second);
    }
}
