//! CLI logic for the Fleetmap layout tool.
//!
//! Reads an inventory file, lays it out for a bounded amount of simulated
//! time and writes the final snapshot as an SVG drawing or JSON view model.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{path::Path, time::Duration};

use log::info;

use fleetmap::{
    FleetmapError, MapBuilder,
    export::{Exporter, json::Json, svg::Svg},
    inventory::Inventory,
};

/// Run the Fleetmap CLI application
///
/// # Errors
///
/// Returns `FleetmapError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed inventory files
/// - Export errors
pub fn run(args: &Args) -> Result<(), FleetmapError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing inventory"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let inventory = Inventory::from_path(&args.input)?;

    let builder = MapBuilder::new(app_config);
    let snapshot = builder.lay_out(&inventory, Duration::from_millis(args.simulate_ms))?;

    let exporter = exporter_for(&args.output);
    exporter.export_snapshot(&snapshot)?;

    info!(
        output_file = args.output,
        nodes_count = snapshot.nodes().len(),
        edges_count = snapshot.edges().len();
        "Snapshot exported successfully"
    );

    Ok(())
}

/// Picks the exporter from the output file extension
fn exporter_for(output: &str) -> Box<dyn Exporter> {
    let path = Path::new(output);
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        Box::new(Json::new(path))
    } else {
        Box::new(Svg::new(path))
    }
}
