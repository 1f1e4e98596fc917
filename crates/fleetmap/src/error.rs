//! Error types for Fleetmap operations.
//!
//! The layout core itself never fails: malformed discovery data degrades to
//! documented defaults. [`FleetmapError`] covers the surfaces around it,
//! decoding inventory files, validating configuration and exporting
//! snapshots.

use std::io;

use thiserror::Error;

/// The main error type for Fleetmap operations.
#[derive(Debug, Error)]
pub enum FleetmapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid inventory: {err}")]
    Inventory {
        #[source]
        err: serde_json::Error,
        src: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl FleetmapError {
    /// Create a new `Inventory` error with the associated source text.
    pub fn new_inventory_error(err: serde_json::Error, src: impl Into<String>) -> Self {
        Self::Inventory {
            err,
            src: src.into(),
        }
    }
}
