use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Storage backends supported by the node.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory store, volatile.
    Memory,
    /// Sled-backed durable store.
    Sled,
}

/// Configuration values for running an engagement node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub storage_backend: StorageBackendType,
    pub storage_path: PathBuf,
    pub http_listen_addr: String,
    pub node_name: String,
    pub fanout_mailbox_capacity: usize,
    pub nexus_monthly_cadence_hours: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            storage_backend: StorageBackendType::Memory,
            storage_path: "./engagement_data/store.sled".into(),
            http_listen_addr: "127.0.0.1:7945".to_string(),
            node_name: "Engagement Node".to_string(),
            fanout_mailbox_capacity: engagement_fanout::DEFAULT_MAILBOX_CAPACITY,
            nexus_monthly_cadence_hours: 24,
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML or YAML file. The format is inferred from the file extension.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "toml" => toml::from_str(&data)?,
            "yaml" | "yml" => serde_yaml::from_str(&data)?,
            _ => return Err(format!("unsupported config extension: {ext}").into()),
        };
        Ok(config)
    }

    /// Apply CLI overrides onto this configuration.
    pub fn apply_cli_overrides(&mut self, cli: &crate::Cli) {
        if let Some(v) = cli.storage_backend {
            self.storage_backend = v;
        }
        if let Some(v) = &cli.storage_path {
            self.storage_path = v.clone();
        }
        if let Some(v) = &cli.http_listen_addr {
            self.http_listen_addr = v.clone();
        }
        if let Some(v) = &cli.node_name {
            self.node_name = v.clone();
        }
    }

    /// Ensure directories for all configured paths exist.
    pub fn prepare_paths(&self) -> std::io::Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
