#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis data for the dashboard's analysis pages.
//!
//! Every input here was computed offline and is only loaded and reshaped:
//! day-of-week profiles per car park ([`weekday`]), cluster labels and
//! centroids ([`clusters`], with centroids read from a `NumPy` file by
//! [`npy`]), and per planning area statistics ([`towns`]).

pub mod clusters;
pub mod npy;
pub mod towns;
pub mod weekday;

use carpark_dashboard_analysis_models::{ProfilePoint, profile_hour};
use thiserror::Error;

/// Errors that can occur while loading or querying analysis data.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Reading an input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON input is malformed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The cluster label CSV is malformed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The requested planning area has no statistics.
    #[error("Unknown planning area: {area}")]
    UnknownArea {
        /// The requested area name.
        area: String,
    },

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Rounds to two decimal places, as every chart displays values.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Turns an 18-value daily series into chart points, skipping gaps and
/// anything past 23:00.
#[must_use]
pub fn profile_points(values: &[Option<f64>]) -> Vec<ProfilePoint> {
    values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            let value = value.filter(|v| v.is_finite())?;
            Some(ProfilePoint {
                hour: profile_hour(idx)?,
                availability: round2(value),
            })
        })
        .collect()
}
