//! Spring-embedder physics.
//!
//! Every node is a charged particle pushed away from every other node
//! (Coulomb's law), edges are springs with a fixed rest length (Hooke's law)
//! and a weak pull keeps the whole graph around the simulation origin. The
//! integrator is explicit Euler with velocity damping; the total kinetic
//! energy reported after each tick tells callers when the system has come to
//! rest.

use indexmap::IndexMap;

use fleetmap_core::{geometry::Point, identifier::Id};

use crate::config::SimulationConfig;

/// Rest length of every spring, in simulation units.
const SPRING_LENGTH: f32 = 1.0;

/// Added to every pair distance so coincident particles stay finite.
const MIN_DISTANCE: f32 = 0.1;

/// Divisor applied to the repulsion constant for the pull towards the origin.
const CENTER_ATTRACTION_DIVISOR: f32 = 50.0;

/// An iterative physics simulation the force-directed adapter can drive.
///
/// Implementations own particle positions in their own unit space; the
/// adapter maps them to world coordinates.
pub trait Simulation {
    /// Drops every node and edge.
    fn clear(&mut self);

    /// Adds a node at `position`. Adding a known id replaces its particle.
    fn add_node(&mut self, id: Id, mass: f32, position: Point);

    /// Connects two known nodes with a spring. Unknown ids are ignored.
    fn add_edge(&mut self, from: Id, to: Id);

    /// Advances the simulation by `timestep`, returning the total kinetic energy.
    fn tick(&mut self, timestep: f32) -> f32;

    /// Calls `visit` with the current position of every node.
    fn for_each_position(&self, visit: &mut dyn FnMut(Id, Point));

    /// Number of nodes in the simulation.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct Particle {
    position: Point,
    velocity: Point,
    acceleration: Point,
    mass: f32,
}

impl Particle {
    fn new(position: Point, mass: f32) -> Self {
        Self {
            position,
            velocity: Point::default(),
            acceleration: Point::default(),
            // A weightless particle would accelerate without bound.
            mass: if mass > 0.0 { mass } else { 1.0 },
        }
    }

    fn apply_force(&mut self, force: Point) {
        self.acceleration = self.acceleration.add_point(force.scale(1.0 / self.mass));
    }
}

/// The bundled [`Simulation`]: a damped spring embedder.
///
/// # Examples
///
/// ```
/// use fleetmap::config::SimulationConfig;
/// use fleetmap::layout::{Simulation, SpringSimulation};
/// use fleetmap_core::{geometry::Point, identifier::Id};
///
/// let mut simulation = SpringSimulation::new(&SimulationConfig::default());
/// simulation.add_node(Id::new("a"), 1.0, Point::new(-0.1, 0.0));
/// simulation.add_node(Id::new("b"), 1.0, Point::new(0.1, 0.0));
/// simulation.add_edge(Id::new("a"), Id::new("b"));
///
/// let energy = simulation.tick(0.03);
/// assert!(energy > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct SpringSimulation {
    stiffness: f32,
    repulsion: f32,
    damping: f32,
    max_speed: Option<f32>,
    particles: IndexMap<Id, Particle>,
    springs: Vec<(usize, usize)>,
}

impl SpringSimulation {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            stiffness: config.stiffness(),
            repulsion: config.repulsion(),
            damping: config.damping(),
            max_speed: config.max_speed(),
            particles: IndexMap::new(),
            springs: Vec::new(),
        }
    }

    /// Current position of `id`, if it is simulated
    pub fn position(&self, id: Id) -> Option<Point> {
        self.particles.get(&id).map(|particle| particle.position)
    }

    /// Total kinetic energy of the system
    pub fn energy(&self) -> f32 {
        self.particles
            .values()
            .map(|particle| {
                let speed = particle.velocity.hypot();
                0.5 * particle.mass * speed * speed
            })
            .sum()
    }

    pub fn springs_count(&self) -> usize {
        self.springs.len()
    }

    fn apply_coulombs_law(&mut self) {
        let count = self.particles.len();
        for i in 0..count {
            for j in 0..count {
                if i == j {
                    continue;
                }
                let delta = self.particles[i].position.sub_point(self.particles[j].position);
                let distance = delta.hypot() + MIN_DISTANCE;
                let direction = delta.normalize();
                let magnitude = self.repulsion / (distance * distance * 0.5);

                self.particles[i].apply_force(direction.scale(magnitude));
                self.particles[j].apply_force(direction.scale(-magnitude));
            }
        }
    }

    fn apply_hookes_law(&mut self) {
        for &(from, to) in &self.springs {
            let delta = self.particles[to].position.sub_point(self.particles[from].position);
            let displacement = SPRING_LENGTH - delta.hypot();
            let direction = delta.normalize();
            let magnitude = self.stiffness * displacement * 0.5;

            self.particles[from].apply_force(direction.scale(-magnitude));
            self.particles[to].apply_force(direction.scale(magnitude));
        }
    }

    fn attract_to_center(&mut self) {
        let strength = self.repulsion / CENTER_ATTRACTION_DIVISOR;
        for particle in self.particles.values_mut() {
            let toward_center = particle.position.scale(-1.0);
            particle.apply_force(toward_center.scale(strength));
        }
    }

    fn update_velocities(&mut self, timestep: f32) {
        for particle in self.particles.values_mut() {
            let mut velocity = particle
                .velocity
                .add_point(particle.acceleration.scale(timestep))
                .scale(self.damping);
            if let Some(max_speed) = self.max_speed {
                if velocity.hypot() > max_speed {
                    velocity = velocity.normalize().scale(max_speed);
                }
            }
            particle.velocity = velocity;
            particle.acceleration = Point::default();
        }
    }

    fn update_positions(&mut self, timestep: f32) {
        for particle in self.particles.values_mut() {
            particle.position = particle.position.add_point(particle.velocity.scale(timestep));
        }
    }
}

impl Simulation for SpringSimulation {
    fn clear(&mut self) {
        self.particles.clear();
        self.springs.clear();
    }

    fn add_node(&mut self, id: Id, mass: f32, position: Point) {
        self.particles.insert(id, Particle::new(position, mass));
    }

    fn add_edge(&mut self, from: Id, to: Id) {
        let (Some(from), Some(to)) = (
            self.particles.get_index_of(&from),
            self.particles.get_index_of(&to),
        ) else {
            return;
        };
        if from == to {
            return;
        }
        // Both directions of a pair share one spring.
        let exists = self
            .springs
            .iter()
            .any(|&(a, b)| (a == from && b == to) || (a == to && b == from));
        if !exists {
            self.springs.push((from, to));
        }
    }

    fn tick(&mut self, timestep: f32) -> f32 {
        self.apply_coulombs_law();
        self.apply_hookes_law();
        self.attract_to_center();
        self.update_velocities(timestep);
        self.update_positions(timestep);
        self.energy()
    }

    fn for_each_position(&self, visit: &mut dyn FnMut(Id, Point)) {
        for (&id, particle) in &self.particles {
            visit(id, particle.position);
        }
    }

    fn len(&self) -> usize {
        self.particles.len()
    }
}
