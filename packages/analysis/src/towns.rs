//! Planning area statistics and the two-town comparison.

use std::collections::BTreeMap;
use std::path::Path;

use carpark_dashboard_analysis_models::{
    LotType, TownBar, TownComparison, TownProfile, TownStats,
};

use crate::{AnalysisError, profile_points};

/// Statistics of every planning area, keyed by area name.
#[derive(Debug, Clone, Default)]
pub struct TownStatsTable {
    towns: BTreeMap<String, TownStats>,
}

impl TownStatsTable {
    /// Reads the statistics file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let body = std::fs::read_to_string(path)?;
        let table = Self::from_json_str(&body)?;
        log::info!(
            "Loaded statistics for {} planning areas from {}",
            table.towns.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parses statistics JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Json`] if the JSON has the wrong shape.
    pub fn from_json_str(body: &str) -> Result<Self, AnalysisError> {
        Ok(Self {
            towns: serde_json::from_str(body)?,
        })
    }

    /// Areas with statistics, sorted.
    pub fn areas(&self) -> impl Iterator<Item = &str> {
        self.towns.keys().map(String::as_str)
    }

    /// Statistics of one planning area.
    #[must_use]
    pub fn get(&self, area: &str) -> Option<&TownStats> {
        self.towns.get(area)
    }

    /// Number of planning areas with statistics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.towns.len()
    }

    /// Returns `true` if no planning area has statistics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.towns.is_empty()
    }

    /// Compares `first` and `second` against every other area.
    ///
    /// Both bar charts cover all areas, sorted by value ascending (ties by
    /// name), with the two compared areas highlighted. Comparing an area
    /// with itself is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnknownArea`] if either area has no
    /// statistics.
    pub fn compare(
        &self,
        first: &str,
        second: &str,
        lot_type: LotType,
    ) -> Result<TownComparison, AnalysisError> {
        let profiles = [first, second]
            .into_iter()
            .map(|area| {
                let stats = self.towns.get(area).ok_or_else(|| AnalysisError::UnknownArea {
                    area: area.to_string(),
                })?;
                Ok(TownProfile {
                    area: area.to_string(),
                    weekday: profile_points(&stats.weekday_series),
                    weekend: profile_points(&stats.weekend_series),
                })
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        let highlighted = |area: &str| area == first || area == second;

        Ok(TownComparison {
            carpark_counts: self.bars(|stats| stats.total_carparks, highlighted),
            lot_counts: self.bars(|stats| stats.lots(lot_type), highlighted),
            lot_type,
            profiles,
        })
    }

    fn bars(
        &self,
        value: impl Fn(&TownStats) -> u64,
        highlighted: impl Fn(&str) -> bool,
    ) -> Vec<TownBar> {
        let mut bars: Vec<TownBar> = self
            .towns
            .iter()
            .map(|(area, stats)| TownBar {
                area: area.clone(),
                value: value(stats),
                highlighted: highlighted(area),
            })
            .collect();
        bars.sort_by_key(|bar| bar.value);
        bars
    }
}
