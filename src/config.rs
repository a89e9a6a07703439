use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{DashboardError, DashboardResult};

/// Runtime settings. Every field has a default so a partial (or absent)
/// config file is fine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the persisted snapshot.
    pub data_dir: PathBuf,
    /// Rows per table page.
    pub page_size: usize,
    /// Largest accepted import upload, in bytes.
    pub max_import_bytes: usize,
    /// Start from the seed accounts when no snapshot exists yet.
    pub seed_when_empty: bool,
    /// Address the web host listens on.
    pub bind_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_dir: PathBuf::from("data"),
            page_size: 10,
            max_import_bytes: 10 * 1024 * 1024,
            seed_when_empty: true,
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> DashboardResult<Self> {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| DashboardError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> DashboardResult<()> {
        if self.page_size == 0 {
            return Err(DashboardError::Config("page_size must be at least 1".into()));
        }
        if self.max_import_bytes == 0 {
            return Err(DashboardError::Config(
                "max_import_bytes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
