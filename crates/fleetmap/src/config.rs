//! Configuration types for Fleetmap topology layout.
//!
//! This module provides configuration structures that control how the
//! topology is placed, simulated and colored. All types implement
//! [`serde::Deserialize`] with per-field defaults, so a configuration file
//! only needs to name the values it overrides.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the sections below.
//! - [`LayoutConfig`] - World origin, box sizes and ring spacing for static placement.
//! - [`SimulationConfig`] - Spring simulation constants and redraw throttling.
//! - [`StyleConfig`] - Color hints handed to the renderer.
//!
//! # Example
//!
//! ```
//! # use fleetmap::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().root_name(), "Local RackHD");
//! assert!(config.style().palette().is_ok());
//! ```

use std::time::Duration;

use serde::Deserialize;

use fleetmap_core::{
    color::Color,
    geometry::{Point, RING_GAP_SKIP, Size},
};

/// Top-level configuration combining layout, simulation and style settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Static placement section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Force simulation section.
    #[serde(default)]
    simulation: SimulationConfig,

    /// Style section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its three sections.
    pub fn new(layout: LayoutConfig, simulation: SimulationConfig, style: StyleConfig) -> Self {
        Self {
            layout,
            simulation,
            style,
        }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the simulation configuration.
    pub fn simulation(&self) -> &SimulationConfig {
        &self.simulation
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Checks the numeric layout and simulation settings.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first setting outside its valid range.
    pub fn validate(&self) -> Result<(), String> {
        self.layout.validate()?;
        self.simulation.validate()
    }
}

/// Static placement settings.
///
/// All coordinates are world units. The root box sits centered on the world
/// origin, every other node gets the same smaller box placed on a ring whose
/// radius grows by `ring_spacing` per placed node.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Name identifying the root node in the inventory.
    root_name: String,

    /// World point the whole topology is centered on, as `[x, y]`.
    world_origin: [f32; 2],

    /// Box size of the root node, as `[width, height]`.
    root_size: [f32; 2],

    /// Box size shared by every non-root node, as `[width, height]`.
    node_size: [f32; 2],

    /// Ring radius added per placed node.
    ring_spacing: f32,

    /// Raw ring steps kept free on either side of the top and bottom gaps.
    ring_gap_skip: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root_name: "Local RackHD".to_string(),
            world_origin: [1500.0, 1500.0],
            root_size: [300.0, 300.0],
            node_size: [240.0, 80.0],
            ring_spacing: 1.5 / 10.0 * 250.0,
            ring_gap_skip: RING_GAP_SKIP,
        }
    }
}

impl LayoutConfig {
    /// Returns a copy with a different root node name.
    pub fn with_root_name(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    /// Returns a copy with a different world origin.
    pub fn with_world_origin(mut self, origin: Point) -> Self {
        self.world_origin = [origin.x(), origin.y()];
        self
    }

    /// Returns a copy with a different ring spacing.
    pub fn with_ring_spacing(mut self, ring_spacing: f32) -> Self {
        self.ring_spacing = ring_spacing;
        self
    }

    /// Returns a copy with a different number of reserved gap steps.
    pub fn with_ring_gap_skip(mut self, ring_gap_skip: usize) -> Self {
        self.ring_gap_skip = ring_gap_skip;
        self
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn world_origin(&self) -> Point {
        Point::new(self.world_origin[0], self.world_origin[1])
    }

    pub fn root_size(&self) -> Size {
        Size::new(self.root_size[0], self.root_size[1])
    }

    pub fn node_size(&self) -> Size {
        Size::new(self.node_size[0], self.node_size[1])
    }

    pub fn ring_spacing(&self) -> f32 {
        self.ring_spacing
    }

    pub fn ring_gap_skip(&self) -> usize {
        self.ring_gap_skip
    }

    /// Rejects non-finite coordinates and negative sizes or spacing.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        if !self.world_origin.iter().all(|value| value.is_finite()) {
            return Err("layout.world_origin must be finite".to_string());
        }
        for (name, size) in [("root_size", self.root_size), ("node_size", self.node_size)] {
            if !size.iter().all(|value| value.is_finite() && *value >= 0.0) {
                return Err(format!("layout.{name} must be finite and non-negative"));
            }
        }
        if !(self.ring_spacing.is_finite() && self.ring_spacing >= 0.0) {
            return Err("layout.ring_spacing must be finite and non-negative".to_string());
        }
        Ok(())
    }
}

/// Spring simulation constants and redraw throttling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Spring stiffness applied along every edge.
    stiffness: f32,

    /// Repulsion between every pair of nodes.
    repulsion: f32,

    /// Velocity damping factor applied each tick, in `(0, 1]`.
    damping: f32,

    /// Total kinetic energy below which the simulation is considered settled.
    min_energy: f32,

    /// Integration timestep per tick.
    timestep: f32,

    /// Optional velocity cap per node.
    max_speed: Option<f32>,

    /// Simulation weight given to every node.
    node_mass: f32,

    /// Factor mapping simulation space to world space.
    zoom: f32,

    /// Wall-clock interval between ticks, in milliseconds.
    tick_interval_ms: u64,

    /// Upper bound on ticks run by a single `advance` call.
    max_ticks_per_advance: u32,

    /// Window in which redraw requests are coalesced, in milliseconds.
    render_interval_ms: u64,

    /// Seed for initial jitter; random when absent.
    seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stiffness: 100.0,
            repulsion: 100.0,
            damping: 0.5,
            min_energy: 0.1,
            timestep: 0.03,
            max_speed: None,
            node_mass: 1.0,
            zoom: 150.0,
            tick_interval_ms: 16,
            max_ticks_per_advance: 8,
            render_interval_ms: 32,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Returns a copy using a fixed jitter seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns a copy with a different settling threshold.
    pub fn with_min_energy(mut self, min_energy: f32) -> Self {
        self.min_energy = min_energy;
        self
    }

    /// Returns a copy with a different velocity damping factor.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// Returns a copy with a different simulation to world scale.
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Rejects constants that would make the integration produce NaN or diverge.
    ///
    /// `zoom`, `timestep` and `node_mass` must be positive, `damping` must lie
    /// in `(0, 1]`, and the force constants must be finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("zoom", self.zoom),
            ("timestep", self.timestep),
            ("node_mass", self.node_mass),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("simulation.{name} must be positive, got {value}"));
            }
        }

        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(format!(
                "simulation.damping must be in (0, 1], got {}",
                self.damping
            ));
        }

        let non_negative = [
            ("stiffness", self.stiffness),
            ("repulsion", self.repulsion),
            ("min_energy", self.min_energy),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("simulation.{name} must be non-negative, got {value}"));
            }
        }

        let invalid_speed = self
            .max_speed
            .filter(|speed| !(speed.is_finite() && *speed > 0.0));
        if let Some(max_speed) = invalid_speed {
            return Err(format!("simulation.max_speed must be positive, got {max_speed}"));
        }
        Ok(())
    }

    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    pub fn repulsion(&self) -> f32 {
        self.repulsion
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn min_energy(&self) -> f32 {
        self.min_energy
    }

    pub fn timestep(&self) -> f32 {
        self.timestep
    }

    pub fn max_speed(&self) -> Option<f32> {
        self.max_speed
    }

    pub fn node_mass(&self) -> f32 {
        self.node_mass
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn max_ticks_per_advance(&self) -> u32 {
        self.max_ticks_per_advance.max(1)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Color hints handed to the renderer, as CSS color strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    root: String,
    docker_container: String,
    docker_edge: String,
    host: String,
    host_edge: String,
    enclosure: String,
    enclosure_edge: String,
    stopped_container: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            root: "#ff0".to_string(),
            docker_container: "#24f".to_string(),
            docker_edge: "#48c".to_string(),
            host: "#4f2".to_string(),
            host_edge: "#6c8".to_string(),
            enclosure: "#999".to_string(),
            enclosure_edge: "#6c8".to_string(),
            stopped_container: "red".to_string(),
        }
    }
}

impl StyleConfig {
    /// Parses every color string into a [`Palette`].
    ///
    /// # Errors
    ///
    /// Returns a message naming the first color string that cannot be parsed.
    pub fn palette(&self) -> Result<Palette, String> {
        let parse = |role: &str, value: &str| {
            Color::new(value).map_err(|err| format!("Invalid {role} color in config: {err}"))
        };

        Ok(Palette {
            root: parse("root", &self.root)?,
            docker_container: parse("docker_container", &self.docker_container)?,
            docker_edge: parse("docker_edge", &self.docker_edge)?,
            host: parse("host", &self.host)?,
            host_edge: parse("host_edge", &self.host_edge)?,
            enclosure: parse("enclosure", &self.enclosure)?,
            enclosure_edge: parse("enclosure_edge", &self.enclosure_edge)?,
            stopped_container: parse("stopped_container", &self.stopped_container)?,
        })
    }
}

/// Parsed color hints, see [`StyleConfig::palette`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub root: Color,
    pub docker_container: Color,
    pub docker_edge: Color,
    pub host: Color,
    pub host_edge: Color,
    pub enclosure: Color,
    pub enclosure_edge: Color,
    pub stopped_container: Color,
}

impl Default for Palette {
    fn default() -> Self {
        StyleConfig::default()
            .palette()
            .expect("default style colors are valid CSS colors")
    }
}
