//! Discovery inventory documents.
//!
//! The data-access layer hands the engine three collections per refresh.
//! [`Inventory`] bundles them in the JSON shape they are fetched in:
//!
//! ```json
//! {
//!   "nodes": [{ "id": "root", "name": "Local RackHD", "tags": [], "relations": [] }],
//!   "lookups": [{ "node": "b", "ipAddress": "10.0.0.5" }],
//!   "config": { "gatewayaddr": "172.31.128.1" }
//! }
//! ```

use std::{fs, path::Path};

use log::{debug, info};
use serde::Deserialize;

use fleetmap_core::model::{GatewayConfig, Lookup, Node};

use crate::error::FleetmapError;

/// One refresh worth of discovery records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    lookups: Vec<Lookup>,
    #[serde(default)]
    config: GatewayConfig,
}

impl Inventory {
    pub fn new(nodes: Vec<Node>, lookups: Vec<Lookup>, config: GatewayConfig) -> Self {
        Self {
            nodes,
            lookups,
            config,
        }
    }

    /// Decodes an inventory document.
    ///
    /// # Errors
    ///
    /// Returns [`FleetmapError::Inventory`] carrying the source text, so the
    /// caller can point at the offending line.
    pub fn from_json(source: &str) -> Result<Self, FleetmapError> {
        let inventory: Self = serde_json::from_str(source)
            .map_err(|err| FleetmapError::new_inventory_error(err, source))?;
        debug!(
            nodes_count = inventory.nodes.len(),
            lookups_count = inventory.lookups.len();
            "Inventory decoded"
        );
        Ok(inventory)
    }

    /// Reads and decodes an inventory file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FleetmapError> {
        let path = path.as_ref();
        info!(path:? = path; "Reading inventory");
        let source = fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn lookups(&self) -> &[Lookup] {
        &self.lookups
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
