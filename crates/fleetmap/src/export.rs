//! Writing snapshots to files.
//!
//! Exporters are an outer surface for hosts without a live renderer: they
//! take one [`Snapshot`] and persist it, either as an SVG drawing or as the
//! JSON view model.

pub mod json;
pub mod svg;

use crate::{error::FleetmapError, view::Snapshot};

/// Persists a snapshot somewhere.
pub trait Exporter {
    /// Writes `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`FleetmapError::Io`] when the destination cannot be written
    /// and [`FleetmapError::Export`] when the snapshot cannot be encoded.
    fn export_snapshot(&self, snapshot: &Snapshot) -> Result<(), FleetmapError>;
}
