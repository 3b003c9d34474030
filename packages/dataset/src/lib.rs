#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration and the in-memory dataset behind the dashboard.
//!
//! Every input file is read once by [`Dataset::load`] and then only read
//! from; the server shares a single instance across all workers.

pub mod config;
pub mod paths;
pub mod progress;

use std::path::PathBuf;

use carpark_dashboard_analysis::AnalysisError;
use carpark_dashboard_analysis::clusters::{ClusterLabels, ClusterSet};
use carpark_dashboard_analysis::npy::NpyArray;
use carpark_dashboard_analysis::towns::TownStatsTable;
use carpark_dashboard_analysis::weekday::WeekdayProfiles;
use carpark_dashboard_carpark::CarparkError;
use carpark_dashboard_carpark::registry::CarparkRegistry;
use carpark_dashboard_occupancy::OccupancyError;
use carpark_dashboard_occupancy::store::OccupancyStore;
use serde::Serialize;
use thiserror::Error;

use crate::config::DashboardConfig;
use crate::progress::ProgressCallback;

/// Errors that can occur while configuring or loading the dashboard.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration file is not valid TOML.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration values are inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// The car park registry failed to load.
    #[error(transparent)]
    Carpark(#[from] CarparkError),

    /// The occupancy file failed to load.
    #[error(transparent)]
    Occupancy(#[from] OccupancyError),

    /// An analysis input failed to load.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Number of files [`Dataset::load`] reads.
const LOAD_STEPS: u64 = 6;

/// Everything the dashboard renders from.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub registry: CarparkRegistry,
    pub occupancy: OccupancyStore,
    pub weekday: WeekdayProfiles,
    pub clusters: ClusterSet,
    pub towns: TownStatsTable,
}

/// Sizes of the loaded inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub carparks: usize,
    pub planning_areas: usize,
    pub occupancy_slots: usize,
    pub occupancy_samples: usize,
    pub dropped_samples: usize,
    pub weekday_carparks: usize,
    pub labelled_carparks: usize,
    pub clusters: usize,
    pub towns: usize,
}

impl Dataset {
    /// Reads every input file named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if any file is missing or malformed. There
    /// is no partial dataset.
    pub fn load(
        config: &DashboardConfig,
        progress: &dyn ProgressCallback,
    ) -> Result<Self, DatasetError> {
        let data = &config.data;
        progress.set_total(LOAD_STEPS);

        progress.set_message("Loading car park registry".to_string());
        let registry = CarparkRegistry::load(&data.path(&data.registry))?;
        progress.inc(1);

        progress.set_message("Loading occupancy slices".to_string());
        let occupancy = OccupancyStore::load(&data.path(&data.occupancy))?;
        let outside = occupancy
            .dates()
            .filter(|date| date.month() != config.calendar.month)
            .count();
        if outside > 0 {
            log::warn!(
                "{outside} occupancy dates fall outside month {} and cannot be selected",
                config.calendar.month
            );
        }
        progress.inc(1);

        progress.set_message("Loading day-of-week profiles".to_string());
        let weekday = WeekdayProfiles::load(&data.path(&data.weekday_profiles))?;
        progress.inc(1);

        progress.set_message("Loading town statistics".to_string());
        let towns = TownStatsTable::load(&data.path(&data.town_stats))?;
        progress.inc(1);

        progress.set_message("Loading cluster labels".to_string());
        let labels = ClusterLabels::load(&data.path(&data.cluster_labels))?;
        progress.inc(1);

        progress.set_message("Loading cluster centroids".to_string());
        let centroids = NpyArray::load(&data.path(&data.cluster_centroids))?;
        let clusters = ClusterSet::new(&registry, &labels, &centroids, config.clusters.count)?;
        progress.inc(1);

        let dataset = Self {
            registry,
            occupancy,
            weekday,
            clusters,
            towns,
        };
        progress.finish(format!("Loaded {} car parks", dataset.registry.len()));

        Ok(dataset)
    }

    /// Sizes of the loaded inputs.
    #[must_use]
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            carparks: self.registry.len(),
            planning_areas: self.registry.planning_areas().len(),
            occupancy_slots: self.occupancy.slot_count(),
            occupancy_samples: self.occupancy.sample_count(),
            dropped_samples: self.occupancy.dropped(),
            weekday_carparks: self.weekday.carpark_count(),
            labelled_carparks: self.clusters.carparks().len(),
            clusters: self.clusters.cluster_ids().len(),
            towns: self.towns.len(),
        }
    }
}
