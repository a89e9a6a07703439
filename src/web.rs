#![cfg(not(tarpaulin_include))]

use std::sync::Arc;

use account_dashboard::app;
use account_dashboard::config::DashboardConfig;
use account_dashboard::saving::{FileSnapshotStore, open_store};

/// Main entry point for the dashboard web host
///
/// Reads the config file named by the first argument (default
/// `dashboard.json`), restores the persisted accounts and serves the API.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "dashboard.json".to_string());
    let config = DashboardConfig::load(&config_path)?;

    let backend = Arc::new(FileSnapshotStore::new(&config.data_dir));
    let store = open_store(backend, config.seed_when_empty)?;

    app::run(config, store).await
}
