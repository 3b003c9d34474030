//! Day-of-week availability profiles per car park.
//!
//! The source file is keyed planning area, then car park number, then day
//! index (`"0"` = Monday). Each day holds 18 hourly averages starting at
//! 06:00, either as a list or as an object keyed by hour offset.

use std::collections::BTreeMap;
use std::path::Path;

use carpark_dashboard_analysis_models::{HOURS_PER_PROFILE, Weekday, WeekdayTrend};
use carpark_dashboard_carpark_models::Selection;
use serde::Deserialize;

use crate::{AnalysisError, profile_points};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawProfile {
    List(Vec<Option<f64>>),
    Keyed(BTreeMap<String, Option<f64>>),
}

type RawFile = BTreeMap<String, BTreeMap<String, BTreeMap<String, RawProfile>>>;

type DayProfiles = BTreeMap<Weekday, Vec<Option<f64>>>;

/// Day-of-week profiles of every car park, grouped by planning area.
#[derive(Debug, Clone, Default)]
pub struct WeekdayProfiles {
    areas: BTreeMap<String, BTreeMap<String, DayProfiles>>,
}

impl WeekdayProfiles {
    /// Reads the profile file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let body = std::fs::read_to_string(path)?;
        let profiles = Self::from_json_str(&body)?;
        log::info!(
            "Loaded day-of-week profiles for {} car parks in {} planning areas from {}",
            profiles.carpark_count(),
            profiles.areas.len(),
            path.display()
        );
        Ok(profiles)
    }

    /// Parses profile JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the JSON has the wrong shape or a day
    /// or hour key is not a number in range.
    pub fn from_json_str(body: &str) -> Result<Self, AnalysisError> {
        let raw: RawFile = serde_json::from_str(body)?;

        let mut areas = BTreeMap::new();
        for (area, carparks) in raw {
            let mut parsed = BTreeMap::new();
            for (carpark, days) in carparks {
                let mut profiles = BTreeMap::new();
                for (day_key, profile) in days {
                    let weekday = parse_weekday(&day_key)?;
                    profiles.insert(weekday, flatten(profile)?);
                }
                parsed.insert(carpark, profiles);
            }
            areas.insert(area, parsed);
        }

        Ok(Self { areas })
    }

    /// Planning areas with profile data, sorted.
    pub fn areas(&self) -> impl Iterator<Item = &str> {
        self.areas.keys().map(String::as_str)
    }

    /// Car parks with profile data in `area`, sorted. Unknown areas have
    /// none.
    #[must_use]
    pub fn carparks(&self, area: &str) -> Vec<&str> {
        self.areas
            .get(area)
            .map(|carparks| carparks.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Total number of car parks with profile data.
    #[must_use]
    pub fn carpark_count(&self) -> usize {
        self.areas.values().map(BTreeMap::len).sum()
    }

    /// Hourly profiles of the selected days for one car park.
    ///
    /// Days without any data point are left out, so an unknown car park or
    /// an empty selection yields an empty list.
    #[must_use]
    pub fn trends(
        &self,
        area: &str,
        carpark: &str,
        days: &Selection<Weekday>,
    ) -> Vec<WeekdayTrend> {
        let Some(profiles) = self.areas.get(area).and_then(|c| c.get(carpark)) else {
            log::debug!("No day-of-week profile for {carpark} in {area}");
            return Vec::new();
        };

        profiles
            .iter()
            .filter(|(weekday, _)| days.contains(*weekday))
            .map(|(weekday, values)| WeekdayTrend {
                weekday: *weekday,
                points: profile_points(values),
            })
            .filter(|trend| !trend.points.is_empty())
            .collect()
    }
}

fn parse_weekday(key: &str) -> Result<Weekday, AnalysisError> {
    key.parse::<usize>()
        .ok()
        .and_then(Weekday::from_index)
        .ok_or_else(|| AnalysisError::Conversion {
            message: format!("Invalid day-of-week key '{key}': expected 0-6"),
        })
}

fn flatten(profile: RawProfile) -> Result<Vec<Option<f64>>, AnalysisError> {
    match profile {
        RawProfile::List(values) => Ok(values),
        RawProfile::Keyed(values) => {
            let mut list = Vec::new();
            for (key, value) in values {
                let idx = key
                    .parse::<usize>()
                    .ok()
                    .filter(|idx| *idx < HOURS_PER_PROFILE)
                    .ok_or_else(|| AnalysisError::Conversion {
                        message: format!(
                            "Invalid hour offset '{key}': expected 0-{}",
                            HOURS_PER_PROFILE - 1
                        ),
                    })?;
                if idx >= list.len() {
                    list.resize(idx + 1, None);
                }
                list[idx] = value;
            }
            Ok(list)
        }
    }
}
