#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the car park dashboard.
//!
//! `carpark_dashboard serve` starts the web dashboard; `snapshot` and
//! `summary` print the same data to the terminal. Without a subcommand the
//! tool asks what to do.
//!
//! Uses `indicatif-log-bridge` (via [`carpark_dashboard_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod snapshot;

use carpark_dashboard_cli_utils::{IndicatifProgress, MultiProgress};
use carpark_dashboard_dataset::Dataset;
use carpark_dashboard_dataset::config::DashboardConfig;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dialoguer::{Input, MultiSelect, Select};

#[derive(Parser)]
#[command(name = "carpark_dashboard", about = "HDB car park availability dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server
    Serve {
        /// Address to bind (overrides `BIND_ADDR`)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the availability of every car park at one hour
    Snapshot {
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        /// Hour of day
        #[arg(long)]
        hour: u8,
        /// Planning area to include; repeat for more. Omit for the whole island.
        #[arg(long = "area")]
        areas: Vec<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the size of every loaded input
    Summary,
}

/// Top-level choices of interactive mode.
enum Tool {
    Server,
    Snapshot,
    Summary,
}

impl Tool {
    const ALL: &[Self] = &[Self::Server, Self::Snapshot, Self::Summary];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Server => "Start server",
            Self::Snapshot => "Show availability at one hour",
            Self::Summary => "Show dataset summary",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = carpark_dashboard_cli_utils::init_logger();
    let cli = Cli::parse();
    let mut config = DashboardConfig::load()?;

    match cli.command {
        Some(Commands::Serve { bind, port }) => {
            if let Some(bind) = bind {
                config.server.bind_addr = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let dataset = load_dataset(&config, &multi)?;
            serve(config, dataset, false).await?;
        }
        Some(Commands::Snapshot {
            date,
            hour,
            areas,
            json,
        }) => {
            let dataset = load_dataset(&config, &multi)?;
            print_snapshot(&config, &dataset, date, hour, &areas, json)?;
        }
        Some(Commands::Summary) => {
            let dataset = load_dataset(&config, &multi)?;
            print_summary(&dataset);
        }
        None => interactive(config, &multi).await?,
    }

    Ok(())
}

async fn interactive(
    config: DashboardConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("HDB Car Park Dashboard");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let dataset = load_dataset(&config, multi)?;

    match Tool::ALL[idx] {
        Tool::Server => serve(config, dataset, true).await?,
        Tool::Snapshot => {
            let first = config
                .calendar
                .first_date()
                .ok_or("Configured month has no dates")?;
            let date: NaiveDate = Input::new()
                .with_prompt("Date (YYYY-MM-DD)")
                .default(first)
                .interact_text()?;
            let hour: u8 = Input::new()
                .with_prompt("Hour")
                .default(config.calendar.first_hour)
                .interact_text()?;

            let areas = dataset.registry.planning_areas();
            let picked = MultiSelect::new()
                .with_prompt("Planning areas (none selected = islandwide)")
                .items(&areas)
                .interact()?;
            let areas: Vec<String> = picked.into_iter().map(|i| areas[i].clone()).collect();

            print_snapshot(&config, &dataset, date, hour, &areas, false)?;
        }
        Tool::Summary => print_summary(&dataset),
    }

    Ok(())
}

fn load_dataset(
    config: &DashboardConfig,
    multi: &MultiProgress,
) -> Result<Dataset, Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::steps_bar(multi, "Loading dataset");
    let dataset = Dataset::load(config, progress.as_ref()).inspect_err(|e| {
        log::error!("Failed to load dataset: {e}");
    })?;
    Ok(dataset)
}

async fn serve(
    config: DashboardConfig,
    dataset: Dataset,
    prompt: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so it runs on a blocking task
    // to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_rt::System::new().block_on(async move {
            if prompt {
                carpark_dashboard_server::interactive::run(config, dataset).await
            } else {
                carpark_dashboard_server::run_server(config, dataset).await
            }
        })
    })
    .await??;
    Ok(())
}

fn print_snapshot(
    config: &DashboardConfig,
    dataset: &Dataset,
    date: NaiveDate,
    hour: u8,
    areas: &[String],
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let key = snapshot::slot_key(&config.calendar, date, hour)?;
    let result = snapshot::snapshot(dataset, key, areas);

    if json {
        println!("{}", serde_json::to_string_pretty(&result.rows)?);
    } else {
        print!("{}", snapshot::render_table(key, &result));
    }
    Ok(())
}

fn print_summary(dataset: &Dataset) {
    let summary = dataset.summary();
    println!("Car parks:            {}", summary.carparks);
    println!("Planning areas:       {}", summary.planning_areas);
    println!("Occupancy slots:      {}", summary.occupancy_slots);
    println!("Occupancy samples:    {}", summary.occupancy_samples);
    println!("Dropped samples:      {}", summary.dropped_samples);
    println!("Day-of-week profiles: {}", summary.weekday_carparks);
    println!("Labelled car parks:   {}", summary.labelled_carparks);
    println!("Clusters:             {}", summary.clusters);
    println!("Towns with stats:     {}", summary.towns);
}
