//! Dashboard configuration.
//!
//! The defaults in `dashboard.toml` are baked into the binary via
//! [`include_str!`]. `CARPARK_DASHBOARD_CONFIG` replaces them with a file on
//! disk, and a handful of environment variables override single values on
//! top of whichever file was used.

use std::path::{Path, PathBuf};

use carpark_dashboard_occupancy_models::Hour;
use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::DatasetError;
use crate::paths::resolve_data_dir;

/// Embedded default configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../dashboard.toml");

/// Path of a TOML file replacing [`DEFAULT_CONFIG`].
pub const CONFIG_ENV: &str = "CARPARK_DASHBOARD_CONFIG";
/// Overrides [`DataConfig::dir`].
pub const DATA_DIR_ENV: &str = "CARPARK_DATA_DIR";
/// Overrides [`ServerConfig::bind_addr`].
pub const BIND_ADDR_ENV: &str = "BIND_ADDR";
/// Overrides [`ServerConfig::port`].
pub const PORT_ENV: &str = "PORT";
/// Sets [`MapConfig::access_token`].
pub const MAPBOX_TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";

/// Complete dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Input files.
    pub data: DataConfig,
    /// Dataset month and hour window.
    pub calendar: CalendarConfig,
    /// Cluster artifact settings.
    pub clusters: ClusterConfig,
    /// Map defaults handed to the page.
    pub map: MapConfig,
    /// HTTP listener.
    pub server: ServerConfig,
}

/// Location of every input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the files below. Relative paths hang off the
    /// workspace root.
    pub dir: PathBuf,
    /// Car park locations, `GeoJSON`.
    pub registry: String,
    /// Hourly occupancy snapshots, JSON.
    pub occupancy: String,
    /// Day-of-week profiles per car park, JSON.
    pub weekday_profiles: String,
    /// Planning area statistics, JSON.
    pub town_stats: String,
    /// Cluster label per car park, CSV.
    pub cluster_labels: String,
    /// Cluster centroids, `.npy`.
    pub cluster_centroids: String,
}

impl DataConfig {
    /// Full path of `file` inside the data directory.
    #[must_use]
    pub fn path(&self, file: &str) -> PathBuf {
        resolve_data_dir(&self.dir).join(file)
    }
}

/// The month the occupancy data covers and the hours shown for each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub year: i32,
    pub month: u32,
    pub first_hour: u8,
    pub last_hour: u8,
}

impl CalendarConfig {
    /// First day of the month.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Last day of the month.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
    }

    /// Returns `true` if `date` falls inside the configured month.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Returns `true` if `hour` falls inside the hour window.
    #[must_use]
    pub fn contains_hour(&self, hour: Hour) -> bool {
        (self.first_hour..=self.last_hour).contains(&hour.value())
    }

    /// Every hour of the window, ascending.
    #[must_use]
    pub fn hours(&self) -> Vec<Hour> {
        (self.first_hour..=self.last_hour)
            .filter_map(|h| Hour::new(h).ok())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Number of valid cluster labels, `0..count`.
    pub count: usize,
}

/// Initial map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub zoom: f64,
    /// Mapbox style name, used only when a token is available.
    pub style: String,
    /// Mapbox access token. Without one the page falls back to
    /// `OpenStreetMap` tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl DashboardConfig {
    /// Loads the configuration file named by `CARPARK_DASHBOARD_CONFIG`
    /// (or the embedded default) and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file cannot be read, is not valid
    /// TOML, or describes an impossible calendar.
    pub fn load() -> Result<Self, DatasetError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::embedded()?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parses the embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the embedded file is invalid.
    pub fn embedded() -> Result<Self, DatasetError> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file cannot be read or is invalid.
    pub fn from_file(path: &Path) -> Result<Self, DatasetError> {
        let body = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Using configuration from {}", path.display());
        Self::from_toml_str(&body)
    }

    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Toml`] on malformed TOML and
    /// [`DatasetError::Config`] if the values are inconsistent.
    pub fn from_toml_str(body: &str) -> Result<Self, DatasetError> {
        let config: Self = toml::de::from_str(body)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies single-value overrides. `lookup` maps a variable name to its
    /// value, normally [`std::env::var`].
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            self.data.dir = PathBuf::from(dir);
        }
        if let Some(bind_addr) = lookup(BIND_ADDR_ENV) {
            self.server.bind_addr = bind_addr;
        }
        if let Some(port) = lookup(PORT_ENV) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => log::warn!("Ignoring {PORT_ENV}={port}: {e}"),
            }
        }
        if let Some(token) = lookup(MAPBOX_TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.map.access_token = Some(token);
        }
    }

    fn validate(&self) -> Result<(), DatasetError> {
        if self.calendar.first_date().is_none() || self.calendar.last_date().is_none() {
            return Err(DatasetError::Config {
                message: format!(
                    "{}-{} is not a valid month",
                    self.calendar.year, self.calendar.month
                ),
            });
        }
        if self.calendar.first_hour > self.calendar.last_hour || self.calendar.last_hour > 23 {
            return Err(DatasetError::Config {
                message: format!(
                    "Invalid hour window {}..={}",
                    self.calendar.first_hour, self.calendar.last_hour
                ),
            });
        }
        if self.clusters.count == 0 {
            return Err(DatasetError::Config {
                message: "Cluster count must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn embedded_defaults() {
        let config = DashboardConfig::embedded().unwrap();
        assert_eq!(config.calendar.year, 2022);
        assert_eq!(config.calendar.month, 8);
        assert_eq!(config.clusters.count, 13);
        assert_eq!(config.server.port, 8080);
        assert!((config.map.center_latitude - 1.3521).abs() < 1e-9);
        assert!(config.map.access_token.is_none());
        assert!(
            config
                .data
                .path(&config.data.occupancy)
                .ends_with("data/aug_compressed.json")
        );
    }

    #[test]
    fn calendar_bounds() {
        let calendar = DashboardConfig::embedded().unwrap().calendar;
        assert_eq!(calendar.first_date(), NaiveDate::from_ymd_opt(2022, 8, 1));
        assert_eq!(calendar.last_date(), NaiveDate::from_ymd_opt(2022, 8, 31));
        assert!(calendar.contains_date(NaiveDate::from_ymd_opt(2022, 8, 15).unwrap()));
        assert!(!calendar.contains_date(NaiveDate::from_ymd_opt(2022, 9, 1).unwrap()));

        let hours = calendar.hours();
        assert_eq!(hours.len(), 18);
        assert_eq!(hours[0].value(), 6);
        assert!(!calendar.contains_hour(Hour::new(5).unwrap()));
        assert!(calendar.contains_hour(Hour::new(23).unwrap()));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let calendar = CalendarConfig {
            year: 2022,
            month: 12,
            first_hour: 6,
            last_hour: 23,
        };
        assert_eq!(calendar.last_date(), NaiveDate::from_ymd_opt(2022, 12, 31));
    }

    #[test]
    fn overrides_replace_single_values() {
        let vars: BTreeMap<&str, &str> = [
            (DATA_DIR_ENV, "/srv/carparks"),
            (PORT_ENV, "9000"),
            (MAPBOX_TOKEN_ENV, "pk.test"),
        ]
        .into_iter()
        .collect();

        let mut config = DashboardConfig::embedded().unwrap();
        config.apply_overrides(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.data.dir, PathBuf::from("/srv/carparks"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_addr, "127.0.0.1");
        assert_eq!(config.map.access_token.as_deref(), Some("pk.test"));
    }

    #[test]
    fn bad_port_override_is_ignored() {
        let mut config = DashboardConfig::embedded().unwrap();
        config.apply_overrides(|key| (key == PORT_ENV).then(|| "eighty".to_string()));
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn rejects_impossible_calendar() {
        let body = DEFAULT_CONFIG.replace("month = 8", "month = 13");
        assert!(matches!(
            DashboardConfig::from_toml_str(&body),
            Err(DatasetError::Config { .. })
        ));

        let body = DEFAULT_CONFIG.replace("first_hour = 6", "first_hour = 24");
        assert!(matches!(
            DashboardConfig::from_toml_str(&body),
            Err(DatasetError::Config { .. })
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            DashboardConfig::from_toml_str("[data\n"),
            Err(DatasetError::Toml(_))
        ));
    }
}
