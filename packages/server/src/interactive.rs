//! Interactive mode for the server.
//!
//! Prompts for the bind address and port, defaulting to the configured
//! values, before starting the server.

use carpark_dashboard_dataset::Dataset;
use carpark_dashboard_dataset::config::DashboardConfig;
use dialoguer::{Confirm, Input};

/// Runs the server in interactive mode, prompting for the listener.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run(mut config: DashboardConfig, dataset: Dataset) -> std::io::Result<()> {
    println!("Car Park Dashboard Server");
    println!();

    let default_bind = config.server.bind_addr.clone();
    config.server.bind_addr = Input::new()
        .with_prompt("Bind address")
        .default(default_bind.clone())
        .interact_text()
        .unwrap_or(default_bind);

    let default_port = config.server.port;
    config.server.port = Input::new()
        .with_prompt("Port")
        .default(default_port)
        .interact_text()
        .unwrap_or(default_port);

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{}?",
            config.server.bind_addr, config.server.port
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config, dataset).await
}
