//! Typed, load-validated occupancy snapshots.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use carpark_dashboard_occupancy_models::{Hour, MonthDay, OccupancySample, SlotKey};
use serde::Deserialize;

use crate::OccupancyError;

/// One record as it appears in the snapshot file.
#[derive(Debug, Deserialize)]
struct RawSample {
    /// Car park number.
    n: String,
    /// Total lots. Usually only present in the baseline hour; may be
    /// written as a float when the source column had gaps.
    #[serde(default)]
    t: Option<f64>,
    /// Availability percentage.
    #[serde(default)]
    o: Option<f64>,
}

type RawFile = BTreeMap<String, BTreeMap<String, Vec<RawSample>>>;

/// Every snapshot of the dataset month, keyed by day then hour.
#[derive(Debug, Clone, Default)]
pub struct OccupancyStore {
    slots: BTreeMap<MonthDay, BTreeMap<Hour, Vec<OccupancySample>>>,
    dropped: usize,
}

impl OccupancyStore {
    /// Reads and validates the snapshot file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError`] if the file cannot be read, is not JSON of
    /// the expected shape, or contains a malformed date or hour key.
    pub fn load(path: &Path) -> Result<Self, OccupancyError> {
        let file = std::fs::File::open(path)?;
        let store = Self::from_reader(std::io::BufReader::new(file))?;
        log::info!(
            "Loaded {} occupancy samples in {} slots across {} days from {}",
            store.sample_count(),
            store.slot_count(),
            store.slots.len(),
            path.display()
        );
        if store.dropped > 0 {
            log::warn!(
                "Dropped {} samples with missing or out-of-range availability",
                store.dropped
            );
        }
        Ok(store)
    }

    /// Parses snapshot JSON from a reader.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn from_reader(reader: impl Read) -> Result<Self, OccupancyError> {
        let raw: RawFile = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    /// Parses snapshot JSON from a string.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn from_json_str(body: &str) -> Result<Self, OccupancyError> {
        let raw: RawFile = serde_json::from_str(body)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawFile) -> Result<Self, OccupancyError> {
        let mut slots = BTreeMap::new();
        let mut dropped = 0;

        for (date_key, hours) in raw {
            let date: MonthDay = date_key.parse()?;
            let day: &mut BTreeMap<Hour, Vec<OccupancySample>> = slots.entry(date).or_default();

            for (hour_key, records) in hours {
                let hour: Hour = hour_key.parse()?;
                let samples: Vec<OccupancySample> = records
                    .into_iter()
                    .filter_map(|record| {
                        let sample = to_sample(record);
                        if sample.is_none() {
                            dropped += 1;
                        }
                        sample
                    })
                    .collect();
                day.insert(hour, samples);
            }
        }

        Ok(Self { slots, dropped })
    }

    /// Samples of one slot. An absent slot yields an empty slice.
    #[must_use]
    pub fn lookup(&self, key: SlotKey) -> &[OccupancySample] {
        self.slots
            .get(&key.date)
            .and_then(|hours| hours.get(&key.hour))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns `true` if the slot exists in the file.
    #[must_use]
    pub fn contains(&self, key: SlotKey) -> bool {
        self.slots
            .get(&key.date)
            .is_some_and(|hours| hours.contains_key(&key.hour))
    }

    /// Days with at least one snapshot, in calendar order.
    pub fn dates(&self) -> impl Iterator<Item = MonthDay> + '_ {
        self.slots.keys().copied()
    }

    /// Every slot key, in chronological order.
    pub fn slots(&self) -> impl Iterator<Item = SlotKey> + '_ {
        self.slots.iter().flat_map(|(date, hours)| {
            hours.keys().map(move |hour| SlotKey {
                date: *date,
                hour: *hour,
            })
        })
    }

    /// Number of `(day, hour)` slots.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.values().map(BTreeMap::len).sum()
    }

    /// Number of samples across all slots.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.slots
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Number of records rejected during load.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_sample(record: RawSample) -> Option<OccupancySample> {
    let availability = record.o.filter(|o| o.is_finite() && (0.0..=100.0).contains(o));
    let Some(availability_percent) = availability else {
        log::debug!("Dropping {}: availability {:?} out of range", record.n, record.o);
        return None;
    };

    let total_lots = record
        .t
        .filter(|t| t.is_finite() && *t >= 0.0 && *t <= f64::from(u32::MAX))
        .map(|t| t.round() as u32);

    Some(OccupancySample {
        carpark_id: record.n,
        availability_percent,
        total_lots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOTS: &str = r#"{
        "08-01": {
            "06": [
                {"n": "ACB", "t": 200, "o": 80.5},
                {"n": "BJ55", "t": 120.0, "o": 45.0}
            ],
            "07": [
                {"n": "ACB", "o": 70.0},
                {"n": "BJ55", "o": 140.0}
            ]
        },
        "08-02": {
            "06": []
        }
    }"#;

    fn key(date: &str, hour: &str) -> SlotKey {
        SlotKey {
            date: date.parse().unwrap(),
            hour: hour.parse().unwrap(),
        }
    }

    #[test]
    fn present_slot_is_non_empty() {
        let store = OccupancyStore::from_json_str(SNAPSHOTS).unwrap();
        let samples = store.lookup(key("08-01", "06"));
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].carpark_id, "ACB");
        assert_eq!(samples[0].total_lots, Some(200));
        assert_eq!(samples[1].total_lots, Some(120));
    }

    #[test]
    fn absent_slot_is_empty() {
        let store = OccupancyStore::from_json_str(SNAPSHOTS).unwrap();
        assert!(store.lookup(key("08-03", "06")).is_empty());
        assert!(store.lookup(key("08-01", "23")).is_empty());
        assert!(!store.contains(key("08-01", "23")));
    }

    #[test]
    fn out_of_range_availability_is_dropped() {
        let store = OccupancyStore::from_json_str(SNAPSHOTS).unwrap();
        let samples = store.lookup(key("08-01", "07"));
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].carpark_id, "ACB");
        assert_eq!(samples[0].total_lots, None);
        assert_eq!(store.dropped(), 1);
    }

    #[test]
    fn every_kept_sample_is_within_percent_bounds() {
        let store = OccupancyStore::from_json_str(SNAPSHOTS).unwrap();
        for slot in store.slots() {
            for sample in store.lookup(slot) {
                assert!((0.0..=100.0).contains(&sample.availability_percent));
            }
        }
    }

    #[test]
    fn counts_slots_and_samples() {
        let store = OccupancyStore::from_json_str(SNAPSHOTS).unwrap();
        assert_eq!(store.slot_count(), 3);
        assert_eq!(store.sample_count(), 3);
        assert_eq!(store.dates().count(), 2);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(matches!(
            OccupancyStore::from_json_str(r#"{"2022-08-01": {"06": []}}"#),
            Err(OccupancyError::Key(_))
        ));
        assert!(matches!(
            OccupancyStore::from_json_str(r#"{"08-01": {"6": []}}"#),
            Err(OccupancyError::Key(_))
        ));
    }

    #[test]
    fn rejects_wrong_shape() {
        assert!(matches!(
            OccupancyStore::from_json_str(r#"{"08-01": [1, 2, 3]}"#),
            Err(OccupancyError::Json(_))
        ));
    }
}
