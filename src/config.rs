use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::TransferResult;
use crate::formats::TransferFormat;

/// Settings for the command line tool, read from a YAML file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TransferConfig {
    /// JSON file holding the term store
    pub store_path: PathBuf,
    /// Directory exports are written into
    pub output_dir: PathBuf,
    pub default_format: TransferFormat,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("taxonomy-store.json"),
            output_dir: PathBuf::from("."),
            default_format: TransferFormat::Csv,
        }
    }
}

impl TransferConfig {
    /// Load the config at `path`; a missing file yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> TransferResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> TransferResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> TransferResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }
}
