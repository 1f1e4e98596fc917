//! Force-directed repositioning.
//!
//! [`ForceDirectedAdapter`] feeds a [`RootContext`] into a [`Simulation`],
//! ticks it at a fixed interval and writes every simulated position back into
//! the [`LayoutState`] as world bounds. Redraw requests from ticks are
//! coalesced through a [`ScheduledTask`] so the renderer sees at most one
//! redraw per render window, however fast the simulation ticks.

mod spring;

pub use spring::{Simulation, SpringSimulation};

use std::time::{Duration, Instant};

use log::{debug, info, trace};
use rand::{Rng, SeedableRng, rngs::StdRng};

use fleetmap_core::{
    geometry::{Bounds, Point, Size},
    identifier::Id,
};

use crate::{
    config::{LayoutConfig, SimulationConfig},
    schedule::ScheduledTask,
    topology::RootContext,
};

use super::LayoutState;

/// Half-width of the random offset added to seeded positions, in simulation units.
const SEED_JITTER: f32 = 0.05;

/// Drives a [`Simulation`] and maps its positions into world space.
///
/// The adapter is clock-agnostic: [`ForceDirectedAdapter::advance`] receives
/// the current instant and runs however many ticks are due.
#[derive(Debug)]
pub struct ForceDirectedAdapter<S = SpringSimulation> {
    simulation: S,
    root: Option<Id>,

    origin: Point,
    root_size: Size,
    node_size: Size,
    zoom: f32,

    timestep: f32,
    min_energy: f32,
    tick_interval: Duration,
    max_ticks_per_advance: u32,

    rng: StdRng,
    running: bool,
    settled: bool,
    next_tick: Option<Instant>,
    render: ScheduledTask,
    ticks: u64,
}

impl ForceDirectedAdapter<SpringSimulation> {
    /// Creates an adapter around the bundled [`SpringSimulation`]
    pub fn new(layout: &LayoutConfig, config: &SimulationConfig) -> Self {
        Self::with_simulation(SpringSimulation::new(config), layout, config)
    }
}

impl<S: Simulation> ForceDirectedAdapter<S> {
    /// Creates an adapter around any [`Simulation`] implementation
    pub fn with_simulation(simulation: S, layout: &LayoutConfig, config: &SimulationConfig) -> Self {
        let rng = match config.seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            simulation,
            root: None,
            origin: layout.world_origin(),
            root_size: layout.root_size(),
            node_size: layout.node_size(),
            zoom: config.zoom(),
            timestep: config.timestep(),
            min_energy: config.min_energy(),
            tick_interval: config.tick_interval(),
            max_ticks_per_advance: config.max_ticks_per_advance(),
            rng,
            running: false,
            settled: false,
            next_tick: None,
            render: ScheduledTask::new(config.render_interval()),
            ticks: 0,
        }
    }

    /// Begins or resumes ticking on the next [`advance`](Self::advance)
    pub fn start(&mut self) {
        self.running = true;
        self.settled = false;
        self.next_tick = None;
        debug!(nodes_count = self.simulation.len(); "Force simulation started");
    }

    /// Halts ticking.
    ///
    /// With `clear` a pending coalesced render is cancelled as well, so no
    /// redraw from the halted simulation fires after this returns.
    pub fn stop(&mut self, clear: bool) {
        self.running = false;
        self.next_tick = None;
        let cancelled = clear && self.render.cancel();
        debug!(clear = clear, cancelled_render = cancelled; "Force simulation stopped");
    }

    /// Replaces the simulated graph with `context`.
    ///
    /// Prior simulation state is discarded; particles are seeded from the
    /// bounds currently in `state`. With `auto_start` ticking begins right
    /// away and `false` is returned. Otherwise the adapter stays halted and
    /// returns `true`, asking the caller for one static render.
    pub fn update(&mut self, context: &RootContext, state: &LayoutState, auto_start: bool) -> bool {
        self.stop(true);
        self.simulation.clear();
        self.root = Some(context.root_id());
        self.settled = false;

        for node in context.nodes() {
            let position = self.seed_position(state.get(node.id()));
            self.simulation.add_node(node.id(), node.mass(), position);
        }
        for edge in context.edges() {
            self.simulation.add_edge(edge.from(), edge.to());
        }

        trace!(
            nodes_count = self.simulation.len(),
            edges_count = context.edges_count(),
            auto_start = auto_start;
            "Force simulation reloaded"
        );

        if auto_start {
            self.start();
            false
        } else {
            true
        }
    }

    /// Runs every tick due at `now`, then fires a pending render if its window elapsed.
    ///
    /// At most `max_ticks_per_advance` ticks run per call; a larger backlog is
    /// dropped rather than caught up. Returns `true` when the coalesced
    /// render fired and the caller should redraw.
    pub fn advance(&mut self, now: Instant, state: &mut LayoutState) -> bool {
        if self.running {
            self.run_due_ticks(now, state);
        }
        self.render.poll(now)
    }

    fn run_due_ticks(&mut self, now: Instant, state: &mut LayoutState) {
        let mut next = self.next_tick.unwrap_or(now);
        let mut ran = 0;

        while next <= now && ran < self.max_ticks_per_advance {
            let energy = self.simulation.tick(self.timestep);
            self.ticks += 1;
            ran += 1;
            next += self.tick_interval;

            self.write_positions(state);
            self.render.arm(now);

            if energy < self.min_energy {
                info!(ticks = self.ticks, energy = energy; "Force simulation settled");
                self.running = false;
                self.settled = true;
                self.next_tick = None;
                return;
            }
        }

        if next <= now {
            trace!(ticks = ran; "Dropping force simulation backlog");
            next = now + self.tick_interval;
        }
        self.next_tick = Some(next);
    }

    fn write_positions(&mut self, state: &mut LayoutState) {
        let root = self.root;
        let root_box = Bounds::from_center(self.root_size.width(), self.root_size.height());
        let node_box = Bounds::from_center(self.node_size.width(), self.node_size.height());
        let origin = self.origin;
        let zoom = self.zoom;

        self.simulation.for_each_position(&mut |id, position| {
            let base = if Some(id) == root { root_box } else { node_box };
            state.set(id, base.translate(origin).translate(position.scale(zoom)));
        });
    }

    fn seed_position(&mut self, bounds: Option<Bounds>) -> Point {
        let anchor = bounds
            .map(|bounds| bounds.center().sub_point(self.origin).scale(1.0 / self.zoom))
            .unwrap_or_default();
        let jitter = Point::new(
            self.rng.random_range(-SEED_JITTER..SEED_JITTER),
            self.rng.random_range(-SEED_JITTER..SEED_JITTER),
        );
        anchor.add_point(jitter)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True once the simulation came to rest on its own; cleared by [`start`](Self::start)
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn has_pending_render(&self) -> bool {
        self.render.is_armed()
    }

    /// The earliest instant at which [`advance`](Self::advance) has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        let tick = if self.running { self.next_tick } else { None };
        match (tick, self.render.deadline()) {
            (Some(tick), Some(render)) => Some(tick.min(render)),
            (tick, render) => tick.or(render),
        }
    }

    /// Total ticks run since the adapter was created
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use fleetmap_core::model::{GatewayConfig, Node};

    use super::*;
    use crate::{layout::CircularLayout, topology};

    const MS: Duration = Duration::from_millis(1);

    fn fixture() -> (RootContext, LayoutState, LayoutConfig, SimulationConfig) {
        let nodes = [
            Node::new("root", "Local RackHD"),
            Node::new("a", "container").with_tags(["dockerHost:root"]),
            Node::new("b", "compute-01"),
            Node::new("c", "compute-02").with_relation("containedBy", ["b"]),
        ];
        let context = topology::build(&nodes, &[], &GatewayConfig::default()).unwrap();
        let layout = LayoutConfig::default();
        let mut state = LayoutState::new();
        CircularLayout::new(&layout).place(&context, &mut state, false);
        (context, state, layout, SimulationConfig::default().with_seed(7))
    }

    #[test]
    fn test_update_without_autostart_requests_static_render() {
        let (context, state, layout, config) = fixture();
        let mut adapter = ForceDirectedAdapter::new(&layout, &config);

        assert!(adapter.update(&context, &state, false));
        assert!(!adapter.is_running());
        assert_eq!(adapter.simulation().len(), 4);
        assert_eq!(adapter.simulation().springs_count(), 3);
    }

    #[test]
    fn test_seeded_from_current_bounds() {
        let (context, state, layout, config) = fixture();
        let mut adapter = ForceDirectedAdapter::new(&layout, &config);
        adapter.update(&context, &state, false);

        let b = Id::new("b");
        let expected = state
            .get(b)
            .unwrap()
            .center()
            .sub_point(layout.world_origin())
            .scale(1.0 / config.zoom());
        let seeded = adapter.simulation().position(b).unwrap();
        assert!(approx_eq!(f32, seeded.x(), expected.x(), epsilon = SEED_JITTER));
        assert!(approx_eq!(f32, seeded.y(), expected.y(), epsilon = SEED_JITTER));
    }

    #[test]
    fn test_ticks_coalesce_into_one_render() {
        let (context, mut state, layout, config) = fixture();
        let mut adapter = ForceDirectedAdapter::new(&layout, &config);
        adapter.update(&context, &state, true);

        let start = Instant::now();
        let mut renders = 0;
        for ms in 0..32 {
            if adapter.advance(start + MS * ms, &mut state) {
                renders += 1;
            }
        }
        assert_eq!(renders, 0);
        assert!(adapter.ticks() > 1);
        assert!(adapter.has_pending_render());

        assert!(adapter.advance(start + MS * 32, &mut state));
        assert!(!adapter.has_pending_render());
    }

    #[test]
    fn test_stop_with_clear_cancels_render() {
        let (context, mut state, layout, config) = fixture();
        let mut adapter = ForceDirectedAdapter::new(&layout, &config);
        adapter.update(&context, &state, true);

        let start = Instant::now();
        adapter.advance(start, &mut state);
        assert!(adapter.has_pending_render());

        adapter.stop(true);
        assert!(!adapter.has_pending_render());

        let snapshot = state.clone();
        assert!(!adapter.advance(start + MS * 1000, &mut state));
        assert_eq!(state, snapshot);
    }

    #[test]
    fn test_stop_without_clear_keeps_render() {
        let (context, mut state, layout, config) = fixture();
        let mut adapter = ForceDirectedAdapter::new(&layout, &config);
        adapter.update(&context, &state, true);

        let start = Instant::now();
        adapter.advance(start, &mut state);
        adapter.stop(false);

        let ticks = adapter.ticks();
        assert!(adapter.advance(start + MS * 32, &mut state));
        assert_eq!(adapter.ticks(), ticks);
    }

    #[test]
    fn test_positions_written_as_world_bounds() {
        let (context, mut state, layout, config) = fixture();
        let mut adapter = ForceDirectedAdapter::new(&layout, &config);
        adapter.update(&context, &state, true);
        adapter.advance(Instant::now(), &mut state);

        let root = state.get(context.root_id()).unwrap();
        assert!(approx_eq!(f32, root.width(), 300.0, epsilon = 0.01));
        let b = state.get(Id::new("b")).unwrap();
        assert!(approx_eq!(f32, b.width(), 240.0, epsilon = 0.01));
        assert!(approx_eq!(f32, b.height(), 80.0, epsilon = 0.01));

        let simulated = adapter.simulation().position(Id::new("b")).unwrap();
        let expected = layout.world_origin().add_point(simulated.scale(config.zoom()));
        assert!(approx_eq!(f32, b.center().x(), expected.x(), epsilon = 0.01));
        assert!(approx_eq!(f32, b.center().y(), expected.y(), epsilon = 0.01));
    }

    #[test]
    fn test_backlog_is_capped() {
        let (context, mut state, layout, config) = fixture();
        let mut adapter = ForceDirectedAdapter::new(&layout, &config.with_min_energy(0.0));
        adapter.update(&context, &state, true);

        let start = Instant::now();
        adapter.advance(start, &mut state);
        assert_eq!(adapter.ticks(), 1);

        adapter.advance(start + Duration::from_secs(10), &mut state);
        let cap = u64::from(SimulationConfig::default().max_ticks_per_advance());
        assert_eq!(adapter.ticks(), 1 + cap);
        assert_eq!(
            adapter.next_deadline(),
            Some(start + Duration::from_secs(10) + MS * 16)
        );
    }

    #[test]
    fn test_settles_and_stops_ticking() {
        let (context, mut state, layout, config) = fixture();
        let mut adapter = ForceDirectedAdapter::new(&layout, &config);
        adapter.update(&context, &state, true);

        let start = Instant::now();
        let mut now = start;
        while adapter.is_running() && now < start + Duration::from_secs(120) {
            now += MS * 16;
            adapter.advance(now, &mut state);
        }

        assert!(adapter.is_settled());
        let ticks = adapter.ticks();
        adapter.advance(now + Duration::from_secs(1), &mut state);
        assert_eq!(adapter.ticks(), ticks);

        adapter.start();
        assert!(!adapter.is_settled());
        assert!(adapter.is_running());
    }
}
