#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Occupancy snapshot types.
//!
//! Snapshots are addressed by a [`SlotKey`]: a calendar day within the
//! dataset month ([`MonthDay`], rendered `MM-DD`) and a clock [`Hour`]
//! (rendered as two digits). Each slot holds a list of
//! [`OccupancySample`]s; joining those with the car park registry produces
//! [`JoinedRow`]s, the flat table the availability map renders.

use std::fmt;
use std::str::FromStr;

use carpark_dashboard_carpark_models::CarparkRecord;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Hour whose snapshot carries each car park's total lot count.
pub const BASELINE_HOUR: Hour = Hour(6);

/// Error returned when a snapshot key cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidKeyError {
    /// The rejected key text.
    pub value: String,
    /// What the key was expected to look like.
    pub expected: &'static str,
}

impl fmt::Display for InvalidKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid key '{}': expected {}", self.value, self.expected)
    }
}

impl std::error::Error for InvalidKeyError {}

/// A calendar day without a year, as used by the snapshot file keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Creates a month/day pair.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKeyError`] if the month is not 1-12 or the day is
    /// not 1-31.
    pub fn new(month: u32, day: u32) -> Result<Self, InvalidKeyError> {
        if (1..=12).contains(&month) && (1..=31).contains(&day) {
            Ok(Self { month, day })
        } else {
            Err(InvalidKeyError {
                value: format!("{month:02}-{day:02}"),
                expected: "a month of 01-12 and a day of 01-31",
            })
        }
    }

    /// Strips the year from a calendar date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    /// Puts the year back, if the day exists in that year.
    #[must_use]
    pub fn with_year(self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }

    /// Month number (1-12).
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// Day of the month (1-31).
    #[must_use]
    pub const fn day(self) -> u32 {
        self.day
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl FromStr for MonthDay {
    type Err = InvalidKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidKeyError {
            value: s.to_string(),
            expected: "MM-DD",
        };
        let (month, day) = s.split_once('-').ok_or_else(err)?;
        if month.len() != 2 || day.len() != 2 {
            return Err(err());
        }
        let month = month.parse().map_err(|_| err())?;
        let day = day.parse().map_err(|_| err())?;
        Self::new(month, day).map_err(|_| err())
    }
}

/// A clock hour (0-23).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Hour(u8);

impl Hour {
    /// Creates an hour.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidKeyError`] if `value` is greater than 23.
    pub fn new(value: u8) -> Result<Self, InvalidKeyError> {
        if value <= 23 {
            Ok(Self(value))
        } else {
            Err(InvalidKeyError {
                value: value.to_string(),
                expected: "an hour of 00-23",
            })
        }
    }

    /// The hour as a number.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Chart axis label, e.g. `"06:00"`.
    #[must_use]
    pub fn label(self) -> String {
        format!("{:02}:00", self.0)
    }

    /// Returns `true` for the hour that carries total lot counts.
    #[must_use]
    pub fn is_baseline(self) -> bool {
        self == BASELINE_HOUR
    }
}

impl TryFrom<u8> for Hour {
    type Error = InvalidKeyError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Hour> for u8 {
    fn from(hour: Hour) -> Self {
        hour.0
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for Hour {
    type Err = InvalidKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || InvalidKeyError {
            value: s.to_string(),
            expected: "a two-digit hour of 00-23",
        };
        if s.len() != 2 {
            return Err(err());
        }
        let value: u8 = s.parse().map_err(|_| err())?;
        Self::new(value).map_err(|_| err())
    }
}

/// Address of one occupancy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    /// Day of the snapshot.
    pub date: MonthDay,
    /// Hour of the snapshot.
    pub hour: Hour,
}

impl SlotKey {
    /// The baseline slot of the same day.
    #[must_use]
    pub const fn baseline(self) -> Self {
        Self {
            date: self.date,
            hour: BASELINE_HOUR,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:00", self.date, self.hour)
    }
}

/// Occupancy of one car park in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancySample {
    /// Car park number.
    pub carpark_id: String,
    /// Share of lots available, 0-100.
    pub availability_percent: f64,
    /// Total lots, only recorded reliably in the baseline snapshot.
    pub total_lots: Option<u32>,
}

impl OccupancySample {
    /// Number of available lots, when the total is known.
    #[must_use]
    pub fn available_lots(&self) -> Option<u32> {
        self.total_lots
            .map(|total| available_lots(total, self.availability_percent))
    }
}

/// A car park joined with its occupancy at one slot and its baseline
/// total lot count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedRow {
    /// Car park number.
    pub carpark_id: String,
    /// WGS84 longitude.
    pub longitude: f64,
    /// WGS84 latitude.
    pub latitude: f64,
    /// Planning area.
    pub planning_area: String,
    /// Total lots, from the baseline snapshot of the same day.
    pub total_lots: u32,
    /// Share of lots available, 0-100.
    pub availability_percent: f64,
}

impl JoinedRow {
    /// Joins a registry record with a sample and its backfilled total.
    #[must_use]
    pub fn new(record: &CarparkRecord, sample: &OccupancySample, total_lots: u32) -> Self {
        Self {
            carpark_id: record.id.clone(),
            longitude: record.longitude,
            latitude: record.latitude,
            planning_area: record.planning_area.clone(),
            total_lots,
            availability_percent: sample.availability_percent,
        }
    }

    /// Number of available lots.
    #[must_use]
    pub fn available_lots(&self) -> u32 {
        available_lots(self.total_lots, self.availability_percent)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn available_lots(total: u32, percent: f64) -> u32 {
    (f64::from(total) * percent.clamp(0.0, 100.0) / 100.0).round() as u32
}
