#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Occupancy snapshot store and availability join.
//!
//! [`store::OccupancyStore`] parses the compressed monthly snapshot file
//! (`"MM-DD" -> "HH" -> [{n, t, o}]`) into typed slots once at startup.
//! [`join`] backfills total lot counts from the day's baseline (06:00)
//! snapshot and inner-joins the result with the car park registry.

pub mod join;
pub mod store;

use thiserror::Error;

/// Errors that can occur while loading occupancy snapshots.
#[derive(Debug, Error)]
pub enum OccupancyError {
    /// Reading the snapshot file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot file is not valid JSON or has the wrong shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A date or hour key is malformed.
    #[error("Invalid snapshot key: {0}")]
    Key(#[from] carpark_dashboard_occupancy_models::InvalidKeyError),
}
