//! Orchestration of builds, placement and simulation.
//!
//! [`LayoutScheduler`] owns the current [`RootContext`], the [`LayoutState`]
//! and the force adapter, and is the only place that mutates them. Hosts
//! call its transitions from one logical thread and pump time through
//! [`LayoutScheduler::advance`].
//!
//! ```text
//!            update (no root)
//!   IDLE <------------------------+
//!    |                            |
//!    | update                     |
//!    v          start             |
//!  BUILT -----------------> SIMULATING
//!    ^  \                     |   ^
//!    |   \ update             |   | start
//!    |    +-------------------+   |
//!    |       (stop + rebuild) v   |
//!    +------- update ------- STOPPED
//! ```
//!
//! Every update lands in `BUILT`, whatever the previous state.

use std::{fmt, time::Instant};

use log::{debug, trace};

use fleetmap_core::model::{GatewayConfig, Lookup, Node};

use crate::{
    config::AppConfig,
    error::FleetmapError,
    layout::{CircularLayout, ForceDirectedAdapter, LayoutState, Simulation, SpringSimulation},
    topology::{RootContext, TopologyBuilder},
    view::{Snapshot, ViewBuilder},
};

/// Lifecycle state of a [`LayoutScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No topology has been built.
    Idle,
    /// Topology built and statically placed.
    Built,
    /// The force simulation is driving positions.
    Simulating,
    /// The simulation was halted; positions are frozen.
    Stopped,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Built => "built",
            Self::Simulating => "simulating",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

type SnapshotCallback = Box<dyn FnMut(&Snapshot)>;

/// Keeps a topology laid out as discovery data changes.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use fleetmap::{config::AppConfig, scheduler::{LayoutScheduler, SchedulerState}};
/// use fleetmap_core::model::{GatewayConfig, Node};
///
/// let mut scheduler = LayoutScheduler::new(&AppConfig::default()).unwrap();
/// let nodes = [Node::new("root", "Local RackHD"), Node::new("b", "compute-01")];
///
/// assert!(scheduler.update(&nodes, &[], &GatewayConfig::default()));
/// assert_eq!(scheduler.state(), SchedulerState::Built);
///
/// let now = Instant::now();
/// scheduler.start();
/// scheduler.advance(now);
/// scheduler.advance(now + Duration::from_millis(40));
/// assert_eq!(scheduler.snapshot().unwrap().nodes().len(), 2);
/// ```
pub struct LayoutScheduler<S = SpringSimulation> {
    builder: TopologyBuilder,
    circular: CircularLayout,
    adapter: ForceDirectedAdapter<S>,
    views: ViewBuilder,

    state: SchedulerState,
    context: Option<RootContext>,
    layout: LayoutState,
    version: u64,
    snapshot: Option<Snapshot>,
    on_snapshot: Option<SnapshotCallback>,
}

impl<S> fmt::Debug for LayoutScheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutScheduler")
            .field("state", &self.state)
            .field("version", &self.version)
            .field("nodes_count", &self.layout.len())
            .finish_non_exhaustive()
    }
}

impl LayoutScheduler<SpringSimulation> {
    /// Creates a scheduler using the bundled spring simulation.
    ///
    /// # Errors
    ///
    /// Returns [`FleetmapError::Config`] when a style color cannot be parsed.
    pub fn new(config: &AppConfig) -> Result<Self, FleetmapError> {
        let simulation = SpringSimulation::new(config.simulation());
        Self::with_simulation(config, simulation)
    }
}

impl<S: Simulation> LayoutScheduler<S> {
    /// Creates a scheduler driving a custom [`Simulation`]
    pub fn with_simulation(config: &AppConfig, simulation: S) -> Result<Self, FleetmapError> {
        config.validate().map_err(FleetmapError::Config)?;
        let palette = config.style().palette().map_err(FleetmapError::Config)?;
        let layout = config.layout();

        Ok(Self {
            builder: TopologyBuilder::new()
                .with_root_name(layout.root_name())
                .with_node_mass(config.simulation().node_mass()),
            circular: CircularLayout::new(layout),
            adapter: ForceDirectedAdapter::with_simulation(simulation, layout, config.simulation()),
            views: ViewBuilder::new(palette, layout.world_origin()),
            state: SchedulerState::Idle,
            context: None,
            layout: LayoutState::new(),
            version: 0,
            snapshot: None,
            on_snapshot: None,
        })
    }

    /// Registers the callback receiving every emitted snapshot, replacing any previous one
    pub fn on_snapshot(&mut self, callback: impl FnMut(&Snapshot) + 'static) {
        self.on_snapshot = Some(Box::new(callback));
    }

    /// Rebuilds the topology from fresh discovery records.
    ///
    /// A running simulation is stopped, with its pending redraw cancelled,
    /// before anything is replaced. Nodes that survive the rebuild keep their
    /// bounds; new nodes are placed on the ring. Returns `false` when the
    /// records hold no usable root, leaving the scheduler `IDLE`.
    pub fn update(&mut self, nodes: &[Node], lookups: &[Lookup], config: &GatewayConfig) -> bool {
        self.adapter.stop(true);

        let Some(context) = self.builder.build(nodes, lookups, config) else {
            let had_topology = self.context.take().is_some();
            self.layout.clear();
            self.transition(SchedulerState::Idle);
            if had_topology {
                self.version += 1;
                self.publish(Snapshot::empty(self.version));
            }
            return false;
        };

        self.layout.retain(|id| context.contains(id));
        self.circular.place(&context, &mut self.layout, false);
        self.adapter.update(&context, &self.layout, false);
        self.context = Some(context);
        self.version += 1;
        self.transition(SchedulerState::Built);
        self.emit();
        true
    }

    /// Starts the force simulation. Valid from `BUILT` and `STOPPED`.
    pub fn start(&mut self) -> bool {
        if !matches!(self.state, SchedulerState::Built | SchedulerState::Stopped) {
            debug!(state:% = self.state; "Ignoring start");
            return false;
        }
        self.adapter.start();
        self.transition(SchedulerState::Simulating);
        self.emit();
        true
    }

    /// Freezes positions. Valid from `SIMULATING`.
    pub fn stop(&mut self) -> bool {
        if self.state != SchedulerState::Simulating {
            debug!(state:% = self.state; "Ignoring stop");
            return false;
        }
        self.adapter.stop(true);
        self.transition(SchedulerState::Stopped);
        self.emit();
        true
    }

    /// Re-applies the circular placement.
    ///
    /// Without `force` only nodes lacking bounds are placed. With `force`
    /// every node returns to its ring position, a running simulation is
    /// stopped (landing in `BUILT`) and the simulation is reseeded from the
    /// fresh placement.
    pub fn reset(&mut self, force: bool) -> bool {
        if self.context.is_none() {
            debug!(state:% = self.state; "Ignoring reset");
            return false;
        }

        if force {
            self.adapter.stop(true);
            if self.state == SchedulerState::Simulating {
                self.transition(SchedulerState::Built);
            }
        }
        if let Some(context) = self.context.as_ref() {
            self.circular.place(context, &mut self.layout, force);
            if force {
                self.adapter.update(context, &self.layout, false);
            }
        }
        self.emit();
        true
    }

    /// Pumps simulation ticks and coalesced redraws due at `now`.
    ///
    /// Returns `true` when a snapshot was emitted.
    pub fn advance(&mut self, now: Instant) -> bool {
        if self.context.is_none() {
            return false;
        }
        if self.adapter.advance(now, &mut self.layout) {
            self.emit();
            return true;
        }
        false
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of full rebuilds so far
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The most recently emitted snapshot
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn root_context(&self) -> Option<&RootContext> {
        self.context.as_ref()
    }

    pub fn layout_state(&self) -> &LayoutState {
        &self.layout
    }

    /// True when the simulation came to rest on its own while `SIMULATING`
    pub fn is_settled(&self) -> bool {
        self.state == SchedulerState::Simulating && self.adapter.is_settled()
    }

    /// The earliest instant at which [`advance`](Self::advance) has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.adapter.next_deadline()
    }

    pub fn adapter(&self) -> &ForceDirectedAdapter<S> {
        &self.adapter
    }

    fn transition(&mut self, next: SchedulerState) {
        if self.state != next {
            debug!(from:% = self.state, to:% = next; "Scheduler transition");
            self.state = next;
        }
    }

    fn emit(&mut self) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        let simulating = self.state == SchedulerState::Simulating;
        let snapshot = self.views.build(context, &self.layout, simulating, self.version);
        self.publish(snapshot);
    }

    fn publish(&mut self, snapshot: Snapshot) {
        trace!(
            version = snapshot.version(),
            nodes_count = snapshot.nodes().len(),
            edges_count = snapshot.edges().len();
            "Emitting snapshot"
        );
        if let Some(callback) = self.on_snapshot.as_mut() {
            callback(&snapshot);
        }
        self.snapshot = Some(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use fleetmap_core::identifier::Id;

    use super::*;
    use crate::config::{LayoutConfig, SimulationConfig, StyleConfig};

    const MS: Duration = Duration::from_millis(1);

    fn config() -> AppConfig {
        AppConfig::new(
            LayoutConfig::default(),
            SimulationConfig::default().with_seed(11).with_min_energy(0.0),
            StyleConfig::default(),
        )
    }

    fn nodes() -> Vec<Node> {
        vec![
            Node::new("root", "Local RackHD"),
            Node::new("a", "container").with_tags(["dockerHost:root"]),
            Node::new("b", "compute-01"),
        ]
    }

    fn recorder(scheduler: &mut LayoutScheduler) -> Rc<RefCell<Vec<Snapshot>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        scheduler.on_snapshot(move |snapshot| sink.borrow_mut().push(snapshot.clone()));
        seen
    }

    #[test]
    fn test_update_lands_in_built() {
        let mut scheduler = LayoutScheduler::new(&config()).unwrap();
        let seen = recorder(&mut scheduler);

        assert!(scheduler.update(&nodes(), &[], &GatewayConfig::default()));
        assert_eq!(scheduler.state(), SchedulerState::Built);
        assert_eq!(scheduler.version(), 1);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].nodes().len(), 3);
        assert_eq!(scheduler.layout_state().len(), 3);
    }

    #[test]
    fn test_update_without_root_stays_idle() {
        let mut scheduler = LayoutScheduler::new(&config()).unwrap();
        let seen = recorder(&mut scheduler);

        assert!(!scheduler.update(&[Node::new("b", "compute")], &[], &GatewayConfig::default()));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(seen.borrow().is_empty());
        assert!(!scheduler.start());
        assert!(!scheduler.reset(false));
    }

    #[test]
    fn test_root_disappearing_emits_empty_snapshot() {
        let mut scheduler = LayoutScheduler::new(&config()).unwrap();
        scheduler.update(&nodes(), &[], &GatewayConfig::default());
        scheduler.start();

        assert!(!scheduler.update(&[], &[], &GatewayConfig::default()));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        let snapshot = scheduler.snapshot().unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.version(), 2);
        assert!(scheduler.layout_state().is_empty());
    }

    #[test]
    fn test_invalid_transitions_are_ignored() {
        let mut scheduler = LayoutScheduler::new(&config()).unwrap();
        assert!(!scheduler.stop());

        scheduler.update(&nodes(), &[], &GatewayConfig::default());
        assert!(!scheduler.stop());
        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.stop());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(scheduler.start());
        assert_eq!(scheduler.state(), SchedulerState::Simulating);
    }

    #[test]
    fn test_version_counts_rebuilds_only() {
        let mut scheduler = LayoutScheduler::new(&config()).unwrap();
        let seen = recorder(&mut scheduler);
        scheduler.update(&nodes(), &[], &GatewayConfig::default());
        scheduler.start();

        let start = Instant::now();
        for ms in (0..200).step_by(8) {
            scheduler.advance(start + MS * ms);
        }

        assert!(seen.borrow().len() > 2);
        assert!(seen.borrow().iter().all(|snapshot| snapshot.version() == 1));

        scheduler.update(&nodes(), &[], &GatewayConfig::default());
        assert_eq!(scheduler.snapshot().unwrap().version(), 2);
    }

    #[test]
    fn test_redraws_are_coalesced() {
        let mut scheduler = LayoutScheduler::new(&config()).unwrap();
        let seen = recorder(&mut scheduler);
        scheduler.update(&nodes(), &[], &GatewayConfig::default());
        scheduler.start();
        let emitted_before = seen.borrow().len();

        let start = Instant::now();
        for ms in 0..=96 {
            scheduler.advance(start + MS * ms);
        }

        // The first tick arms a window ending at 32 ms; the tick at 48 ms
        // arms the next one, ending at 80 ms.
        assert_eq!(seen.borrow().len() - emitted_before, 2);
    }

    #[test]
    fn test_survivors_keep_bounds_across_update() {
        let mut scheduler = LayoutScheduler::new(&config()).unwrap();
        scheduler.update(&nodes(), &[], &GatewayConfig::default());
        scheduler.start();
        let start = Instant::now();
        for ms in (0..100).step_by(16) {
            scheduler.advance(start + MS * ms);
        }
        let moved = scheduler.layout_state().get(Id::new("b")).unwrap();

        let mut next = nodes();
        next.retain(|node| node.id() != Id::new("a"));
        next.push(Node::new("c", "compute-02"));
        scheduler.update(&next, &[], &GatewayConfig::default());

        let layout = scheduler.layout_state();
        assert_eq!(layout.get(Id::new("b")), Some(moved));
        assert!(!layout.contains(Id::new("a")));
        assert!(layout.contains(Id::new("c")));
    }

    #[test]
    fn test_forced_reset_stops_and_restores_ring() {
        let mut scheduler = LayoutScheduler::new(&config()).unwrap();
        scheduler.update(&nodes(), &[], &GatewayConfig::default());
        let ring = scheduler.layout_state().clone();

        scheduler.start();
        let start = Instant::now();
        for ms in (0..100).step_by(16) {
            scheduler.advance(start + MS * ms);
        }
        assert_ne!(scheduler.layout_state(), &ring);

        assert!(scheduler.reset(false));
        assert_eq!(scheduler.state(), SchedulerState::Simulating);
        assert_ne!(scheduler.layout_state(), &ring);

        assert!(scheduler.reset(true));
        assert_eq!(scheduler.state(), SchedulerState::Built);
        assert_eq!(scheduler.layout_state(), &ring);
        assert!(!scheduler.adapter().has_pending_render());
    }

    #[test]
    fn test_start_and_stop_switch_edge_offsets() {
        let mut scheduler = LayoutScheduler::new(&config()).unwrap();
        scheduler.update(&nodes(), &[], &GatewayConfig::default());

        scheduler.start();
        let snapshot = scheduler.snapshot().unwrap();
        assert!(snapshot.simulating());
        assert!(snapshot.edges().iter().all(|edge| edge.offset_from_y() == -300.0));

        scheduler.stop();
        let snapshot = scheduler.snapshot().unwrap();
        assert!(!snapshot.simulating());
        assert!(snapshot.edges().iter().all(|edge| edge.offset_from_y() == 0.0));
    }

    #[test]
    fn test_invalid_style_is_config_error() {
        let style: StyleConfig = toml::from_str("root = \"nope\"").unwrap();
        let config = AppConfig::new(LayoutConfig::default(), SimulationConfig::default(), style);
        let err = LayoutScheduler::new(&config).unwrap_err();
        assert!(matches!(err, FleetmapError::Config(_)));
    }

    #[test]
    fn test_zero_zoom_is_config_error() {
        let simulation = SimulationConfig::default().with_zoom(0.0);
        let config = AppConfig::new(LayoutConfig::default(), simulation, StyleConfig::default());
        let err = LayoutScheduler::new(&config).unwrap_err();
        assert!(matches!(err, FleetmapError::Config(ref msg) if msg.contains("zoom")));
    }
}
