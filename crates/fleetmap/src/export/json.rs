//! JSON export of the view model.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use log::{error, info};

use crate::{error::FleetmapError, export::Exporter, view::Snapshot};

/// Writes snapshots as pretty-printed JSON.
#[derive(Debug, Clone)]
pub struct Json {
    path: PathBuf,
}

impl Json {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Encodes `snapshot` without writing it anywhere
    pub fn render(snapshot: &Snapshot) -> Result<String, FleetmapError> {
        serde_json::to_string_pretty(snapshot)
            .map_err(|err| FleetmapError::Export(format!("Failed to encode snapshot: {err}")))
    }
}

impl Exporter for Json {
    fn export_snapshot(&self, snapshot: &Snapshot) -> Result<(), FleetmapError> {
        let encoded = Self::render(snapshot)?;
        info!(path:? = self.path; "Creating JSON file");

        let file = File::create(&self.path).inspect_err(|err| {
            error!(path:? = self.path, err:% = err; "Failed to create JSON file");
        })?;
        let mut writer = BufWriter::new(file);
        writer.write_all(encoded.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_encoding() {
        let encoded = Json::render(&Snapshot::empty(4)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

        assert_eq!(value["version"], 4);
        assert_eq!(value["simulating"], false);
        assert!(value["nodes"].as_array().unwrap().is_empty());
        assert!(value["edges"].as_array().unwrap().is_empty());
    }
}
