#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Car park registry loading and planning-area filtering.
//!
//! Reads the car park `GeoJSON` (one Point feature per car park, with
//! `car_park_no` and `planning_area` properties) into an in-memory
//! [`registry::CarparkRegistry`] that the occupancy join and the analysis
//! views look car parks up in.

pub mod registry;

use thiserror::Error;

/// Errors that can occur while loading the car park registry.
#[derive(Debug, Error)]
pub enum CarparkError {
    /// Reading the registry file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The registry file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// A feature is missing a required property or has the wrong geometry.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}
