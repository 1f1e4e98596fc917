//! Fleetmap - topology layout for discovered infrastructure fleets.
//!
//! Discovery records (nodes, network lookups and the gateway configuration)
//! are turned into one rooted graph, placed on a ring around the root and
//! optionally relaxed by a spring simulation. Every change is published as a
//! versioned [`view::Snapshot`] a renderer can draw directly.
//!
//! The pieces, leaves first:
//!
//! - [`topology`]: records to [`topology::RootContext`]
//! - [`layout`]: ring placement and the force-directed adapter
//! - [`scheduler`]: the state machine tying builds, placement and simulation together
//! - [`view`]: render-ready node and edge views
//! - [`export`]: SVG and JSON output for hosts without a live renderer

pub mod config;
pub mod export;
pub mod inventory;
pub mod layout;
pub mod schedule;
pub mod scheduler;
pub mod topology;
pub mod view;

mod error;

pub use fleetmap_core::{color, geometry, identifier, model};

pub use error::FleetmapError;

use std::time::{Duration, Instant};

use log::{info, warn};

use config::AppConfig;
use export::{json::Json, svg::Svg};
use inventory::Inventory;
use scheduler::LayoutScheduler;
use view::Snapshot;

/// One-shot layout of an inventory, for batch hosts such as the CLI.
///
/// Long-running hosts drive a [`LayoutScheduler`] themselves; this builder
/// runs one for a bounded amount of simulated time and returns the final
/// snapshot.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use fleetmap::{MapBuilder, config::AppConfig};
///
/// let source = r#"{
///     "nodes": [
///         {"id": "root", "name": "Local RackHD"},
///         {"id": "b", "name": "compute-01"}
///     ],
///     "config": {"gatewayaddr": "172.31.128.1"}
/// }"#;
///
/// let builder = MapBuilder::new(AppConfig::default());
/// let inventory = builder.parse(source).expect("valid inventory");
/// let snapshot = builder
///     .lay_out(&inventory, Duration::from_millis(200))
///     .expect("valid config");
///
/// assert_eq!(snapshot.nodes().len(), 2);
/// let svg = builder.render_svg(&snapshot);
/// assert!(svg.contains("compute-01"));
/// ```
#[derive(Debug, Default)]
pub struct MapBuilder {
    config: AppConfig,
}

impl MapBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Decodes an inventory document.
    ///
    /// # Errors
    ///
    /// Returns [`FleetmapError::Inventory`] for malformed JSON.
    pub fn parse(&self, source: &str) -> Result<Inventory, FleetmapError> {
        Inventory::from_json(source)
    }

    /// Builds, places and, for `simulate_for`, relaxes the topology.
    ///
    /// Simulated time runs on a virtual clock, so this returns as soon as the
    /// ticks are computed. Simulation ends early once the layout settles. An
    /// inventory without a root yields an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`FleetmapError::Config`] for an invalid style configuration.
    pub fn lay_out(
        &self,
        inventory: &Inventory,
        simulate_for: Duration,
    ) -> Result<Snapshot, FleetmapError> {
        let mut scheduler = LayoutScheduler::new(&self.config)?;

        if !scheduler.update(inventory.nodes(), inventory.lookups(), inventory.config()) {
            warn!(
                root_name = self.config.layout().root_name();
                "Inventory has no unique root node"
            );
            return Ok(Snapshot::empty(0));
        }

        if !simulate_for.is_zero() {
            let step = self.config.simulation().tick_interval();
            let start = Instant::now();
            let end = start + simulate_for;
            let mut now = start;

            scheduler.start();
            while now < end && !scheduler.is_settled() {
                scheduler.advance(now);
                now += step;
            }
            scheduler.stop();

            info!(
                simulated_secs = now.duration_since(start).as_secs_f32(),
                ticks = scheduler.adapter().ticks(),
                settled = scheduler.adapter().is_settled();
                "Simulation finished"
            );
        }

        Ok(scheduler.snapshot().cloned().unwrap_or_default())
    }

    /// Draws `snapshot` as an SVG document
    pub fn render_svg(&self, snapshot: &Snapshot) -> String {
        Svg::render(snapshot).to_string()
    }

    /// Encodes `snapshot` as pretty-printed JSON
    pub fn render_json(&self, snapshot: &Snapshot) -> Result<String, FleetmapError> {
        Json::render(snapshot)
    }
}
