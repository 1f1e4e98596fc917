//! Command-line argument definitions for the Fleetmap CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, how long the spring
//! simulation runs, configuration file selection, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Fleetmap layout tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input inventory JSON file
    #[arg(help = "Path to the inventory file")]
    pub input: String,

    /// Path to the output file; a `.json` extension writes the view model,
    /// anything else an SVG drawing
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Simulated milliseconds of spring relaxation (0 keeps the ring layout)
    #[arg(long, default_value_t = 2000)]
    pub simulate_ms: u64,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
