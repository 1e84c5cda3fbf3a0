//! Composition root: wires the record store to every domain crate, builds
//! the background jobs, and serves the HTTP API.

pub mod config;
pub mod jobs;
pub mod nexus_job;
pub mod services;

pub use config::{NodeConfig, StorageBackendType};
pub use services::Services;

use clap::Parser;
use engagement_scheduler::JobScheduler;
use engagement_store::{MemoryStore, Store};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "engagement-node", about = "Engagement Coordination & Resonance Engine node")]
pub struct Cli {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub storage_backend: Option<StorageBackendType>,
    #[arg(long)]
    pub storage_path: Option<PathBuf>,
    #[arg(long)]
    pub http_listen_addr: Option<String>,
    #[arg(long)]
    pub node_name: Option<String>,
}

pub fn load_config(cli: &Cli) -> Result<NodeConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    config.apply_cli_overrides(cli);
    Ok(config)
}

pub fn open_store(config: &NodeConfig) -> Result<Store, Box<dyn std::error::Error>> {
    config.prepare_paths()?;
    match config.storage_backend {
        StorageBackendType::Memory => Ok(Store::Memory(MemoryStore::new())),
        #[cfg(feature = "persist-sled")]
        StorageBackendType::Sled => {
            Ok(Store::Sled(engagement_store::SledStore::open(&config.storage_path)?))
        }
        #[cfg(not(feature = "persist-sled"))]
        StorageBackendType::Sled => Err("sled backend not compiled in".into()),
    }
}

/// Builds services, starts the job scheduler, and serves `/v1` until the
/// process is killed.
pub async fn run_node(config: NodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&config)?;
    let services = Services::new(store, config.fanout_mailbox_capacity);

    let mut scheduler = JobScheduler::new();
    scheduler.start(jobs::build(&services, config.nexus_monthly_cadence_hours));
    info!("background jobs started");

    let state = services.app_state();
    let app = engagement_api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.http_listen_addr).await?;
    info!(addr = %config.http_listen_addr, "serving");
    axum::serve(listener, app).await?;

    scheduler.stop();
    Ok(())
}
