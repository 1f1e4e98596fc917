//! Positioning of topology nodes.
//!
//! Positions never live on the input records. The layout layer owns a
//! [`LayoutState`], a map from node id to [`Bounds`], that the placement
//! strategies write into:
//!
//! - [`CircularLayout`]: deterministic ring placement around the root
//! - [`ForceDirectedAdapter`]: continuous repositioning through a
//!   [`Simulation`]
//!
//! A node either has complete bounds in the state or no entry at all.

mod circular;
mod force;

pub use circular::CircularLayout;
pub use force::{ForceDirectedAdapter, Simulation, SpringSimulation};

use std::collections::HashMap;

use fleetmap_core::{geometry::Bounds, identifier::Id};

/// Bounds of every placed node, keyed by node id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutState {
    bounds: HashMap<Id, Bounds>,
}

impl LayoutState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Id) -> Option<Bounds> {
        self.bounds.get(&id).copied()
    }

    /// Stores `bounds` for `id`, returning the previous bounds if any
    pub fn set(&mut self, id: Id, bounds: Bounds) -> Option<Bounds> {
        self.bounds.insert(id, bounds)
    }

    pub fn remove(&mut self, id: Id) -> Option<Bounds> {
        self.bounds.remove(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.bounds.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.bounds.clear();
    }

    /// Keeps only the entries whose id satisfies `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(Id) -> bool) {
        self.bounds.retain(|&id, _| keep(id));
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, Bounds)> + '_ {
        self.bounds.iter().map(|(&id, &bounds)| (id, bounds))
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}
