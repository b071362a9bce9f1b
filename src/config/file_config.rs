use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub cors_allow_all: Option<bool>,

    // Enrichment
    pub metadata: Option<MetadataConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct MetadataConfig {
    /// Base URL of the external metadata service.
    pub url: Option<String>,
    pub timeout_sec: Option<u64>,
    /// JSON file consulted after get-or-create lookups.
    pub enrichment_file: Option<String>,
    pub disable_enrichment_file: Option<bool>,
    /// Serve the built-in mock metadata service on this port.
    pub mock_port: Option<u16>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
