//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use fleetmap::{FleetmapError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for FleetmapError {
    fn from(err: ConfigError) -> Self {
        FleetmapError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (fleetmap/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or carries invalid colors
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, FleetmapError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("fleetmap/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "fleetmap", "fleetmap") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load and validate configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, FleetmapError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

fn parse_config(content: &str) -> Result<AppConfig, FleetmapError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    // Reject bad colors and degenerate numeric settings before any layout runs.
    config.style().palette().map_err(ConfigError::Validation)?;
    config.validate().map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(
            r#"
            [layout]
            root_name = "Edge Gateway"

            [simulation]
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.layout().root_name(), "Edge Gateway");
        assert_eq!(config.simulation().seed(), Some(7));
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = parse_config("[layout\nroot_name = 1").unwrap_err();
        assert!(matches!(err, FleetmapError::Config(msg) if msg.contains("TOML")));
    }

    #[test]
    fn test_invalid_color_rejected() {
        let err = parse_config("[style]\nroot = \"not-a-color\"").unwrap_err();
        assert!(matches!(err, FleetmapError::Config(msg) if msg.contains("Validation")));
    }

    #[test]
    fn test_zero_zoom_rejected() {
        let err = parse_config("[simulation]\nzoom = 0.0").unwrap_err();
        assert!(
            matches!(err, FleetmapError::Config(ref msg) if msg.contains("Validation") && msg.contains("zoom"))
        );
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = load_config(Some("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, FleetmapError::Config(msg) if msg.contains("Missing")));
    }
}
