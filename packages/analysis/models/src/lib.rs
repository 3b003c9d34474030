#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analysis view types.
//!
//! Covers the three analysis pages of the dashboard: per car park
//! day-of-week availability, the pre-computed time-series clusters, and
//! the town-level (planning area) comparison.

use carpark_dashboard_carpark_models::CarparkRecord;
use carpark_dashboard_occupancy_models::Hour;
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of hourly points in every daily profile (06:00 through 23:00).
pub const HOURS_PER_PROFILE: usize = 18;

/// First hour of every daily profile.
pub const FIRST_PROFILE_HOUR: u8 = 6;

/// Label given to car parks the clustering left unassigned.
pub const UNLABELLED_CLUSTER: ClusterId = 99;

/// Cluster label produced by the offline clustering.
pub type ClusterId = u8;

/// Day of the week, Monday first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Weekday {
    /// Monday
    Monday,
    /// Tuesday
    Tuesday,
    /// Wednesday
    Wednesday,
    /// Thursday
    Thursday,
    /// Friday
    Friday,
    /// Saturday
    Saturday,
    /// Sunday
    Sunday,
}

impl Weekday {
    /// Every day, Monday first.
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Zero-based index, Monday = 0.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Inverse of [`Self::index`].
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Returns `true` for Saturday and Sunday.
    #[must_use]
    pub const fn is_weekend(self) -> bool {
        matches!(self, Self::Saturday | Self::Sunday)
    }
}

/// Hour of the `index`-th point of a daily profile.
#[must_use]
pub fn profile_hour(index: usize) -> Option<Hour> {
    if index >= HOURS_PER_PROFILE {
        return None;
    }
    u8::try_from(index)
        .ok()
        .and_then(|i| Hour::new(FIRST_PROFILE_HOUR + i).ok())
}

/// One hourly value of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePoint {
    /// Hour of day.
    pub hour: Hour,
    /// Average availability, 0-100, rounded to 2 decimal places.
    pub availability: f64,
}

/// Average availability of one car park on one day of the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayTrend {
    /// Day of the week.
    pub weekday: Weekday,
    /// Hourly points; hours without data are absent.
    pub points: Vec<ProfilePoint>,
}

/// Centroid of one cluster, split into weekday and weekend halves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfile {
    /// Cluster label.
    pub cluster: ClusterId,
    /// Average weekday availability, 06:00-23:00.
    pub weekday: Vec<ProfilePoint>,
    /// Average weekend availability, 06:00-23:00.
    pub weekend: Vec<ProfilePoint>,
}

/// A registry car park with its cluster label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelledCarpark {
    /// The car park.
    pub carpark: CarparkRecord,
    /// Its cluster label, [`UNLABELLED_CLUSTER`] when none was assigned.
    pub cluster: ClusterId,
}

/// Number of car parks in one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterCount {
    /// Cluster label.
    pub cluster: ClusterId,
    /// Car parks carrying that label.
    pub carparks: usize,
}

/// Aggregate statistics of one planning area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TownStats {
    /// Number of car parks.
    #[serde(rename = "TOTAL_CP", deserialize_with = "whole_number")]
    pub total_carparks: u64,
    /// Lots across every car park type.
    #[serde(rename = "TOTAL_LOTS", deserialize_with = "whole_number")]
    pub total_lots: u64,
    /// Lots in multi-storey car parks.
    #[serde(rename = "MSCP_LOTS", deserialize_with = "whole_number")]
    pub multi_storey_lots: u64,
    /// Lots in surface car parks.
    #[serde(rename = "SURFACE_LOTS", deserialize_with = "whole_number")]
    pub surface_lots: u64,
    /// Average weekday availability, 06:00-23:00.
    #[serde(rename = "WD_TS")]
    pub weekday_series: Vec<Option<f64>>,
    /// Average weekend availability, 06:00-23:00.
    #[serde(rename = "WE_TS")]
    pub weekend_series: Vec<Option<f64>>,
}

impl TownStats {
    /// Lot count for the given car park type.
    #[must_use]
    pub const fn lots(&self, lot_type: LotType) -> u64 {
        match lot_type {
            LotType::AllLots => self.total_lots,
            LotType::MultiStorey => self.multi_storey_lots,
            LotType::Surface => self.surface_lots,
        }
    }
}

/// Lot counts may be exported as `900` or `900.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a non-negative whole number, got {value}"
        )))
    }
}

/// Car park type selector of the town comparison.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
pub enum LotType {
    /// Every lot.
    #[default]
    #[strum(serialize = "All Lots")]
    AllLots,
    /// Lots in multi-storey car parks.
    #[strum(serialize = "Multi-Storey Car Park")]
    MultiStorey,
    /// Lots in surface car parks.
    #[strum(serialize = "Surface Car Park")]
    Surface,
}

impl LotType {
    /// Every lot type, in selector order.
    pub const ALL: [Self; 3] = [Self::AllLots, Self::MultiStorey, Self::Surface];
}

/// One planning area's value in a town comparison bar chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownBar {
    /// Planning area name.
    pub area: String,
    /// Bar height.
    pub value: u64,
    /// Whether the area is one of the two being compared.
    pub highlighted: bool,
}

/// Weekday and weekend profiles of one planning area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownProfile {
    /// Planning area name.
    pub area: String,
    /// Average weekday availability.
    pub weekday: Vec<ProfilePoint>,
    /// Average weekend availability.
    pub weekend: Vec<ProfilePoint>,
}

/// Side-by-side comparison of two planning areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownComparison {
    /// Car park counts of every area, ascending.
    pub carpark_counts: Vec<TownBar>,
    /// Lot counts of the chosen type for every area, ascending.
    pub lot_counts: Vec<TownBar>,
    /// Lot type used for [`Self::lot_counts`].
    pub lot_type: LotType,
    /// Profiles of the two compared areas, in request order.
    pub profiles: Vec<TownProfile>,
}
