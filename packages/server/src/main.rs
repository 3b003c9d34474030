#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the car park dashboard server.
//!
//! Reads the configuration (see `CARPARK_DASHBOARD_CONFIG`), loads every
//! input file, and serves the dashboard until interrupted.

use carpark_dashboard_dataset::Dataset;
use carpark_dashboard_dataset::config::DashboardConfig;
use carpark_dashboard_dataset::progress::NullProgress;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = DashboardConfig::load()?;

    log::info!("Loading dataset...");
    let dataset = Dataset::load(&config, &NullProgress).inspect_err(|e| {
        log::error!("Failed to load dataset: {e}");
    })?;

    carpark_dashboard_server::run_server(config, dataset).await?;
    Ok(())
}
