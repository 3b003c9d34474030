//! Baseline backfill and registry join.
//!
//! Only the 06:00 snapshot of a day records total lot counts reliably, so
//! every other hour takes its totals from that snapshot. Car parks without
//! a baseline total are left out of the joined table.

use std::collections::BTreeMap;

use carpark_dashboard_carpark::registry::CarparkRegistry;
use carpark_dashboard_carpark_models::Selection;
use carpark_dashboard_occupancy_models::{JoinedRow, OccupancySample, SlotKey};

use crate::store::OccupancyStore;

/// Samples of one slot with their totals filled in from the baseline.
#[derive(Debug, Clone, Default)]
pub struct BackfilledSlot {
    /// Samples whose `total_lots` is always `Some`.
    pub samples: Vec<OccupancySample>,
    /// Samples left out because the baseline had no total for them.
    pub missing_baseline: usize,
}

/// Joined availability table for one slot.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// One row per car park, ordered by car park number.
    pub rows: Vec<JoinedRow>,
    /// Samples left out because the baseline had no total for them.
    pub missing_baseline: usize,
}

impl Snapshot {
    /// Returns `true` if nothing is left to render.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Looks up a slot and replaces every sample's total with the baseline
/// total of the same car park and day.
#[must_use]
pub fn lookup_backfilled(store: &OccupancyStore, key: SlotKey) -> BackfilledSlot {
    let samples = store.lookup(key);
    if samples.is_empty() {
        return BackfilledSlot::default();
    }

    let baseline_samples = if key.hour.is_baseline() {
        samples
    } else {
        store.lookup(key.baseline())
    };

    // First listing of a car park wins.
    let mut totals: BTreeMap<&str, u32> = BTreeMap::new();
    for sample in baseline_samples {
        if let Some(total) = sample.total_lots {
            totals.entry(sample.carpark_id.as_str()).or_insert(total);
        }
    }

    let mut missing_baseline = 0;
    let backfilled = samples
        .iter()
        .filter_map(|sample| {
            let Some(total) = totals.get(sample.carpark_id.as_str()) else {
                missing_baseline += 1;
                return None;
            };
            Some(OccupancySample {
                total_lots: Some(*total),
                ..sample.clone()
            })
        })
        .collect();

    if missing_baseline > 0 {
        log::debug!("{missing_baseline} car parks at {key} have no baseline total");
    }

    BackfilledSlot {
        samples: backfilled,
        missing_baseline,
    }
}

/// Inner-joins the selected planning areas of the registry with the
/// backfilled samples of `key`. Rows follow the registry's car park order.
///
/// Car parks missing on either side are dropped without error. A car park
/// listed more than once in the slot keeps its first sample.
#[must_use]
pub fn join(
    registry: &CarparkRegistry,
    store: &OccupancyStore,
    key: SlotKey,
    areas: &Selection<String>,
) -> Snapshot {
    if areas.is_empty() {
        return Snapshot::default();
    }

    let slot = lookup_backfilled(store, key);

    let mut by_id: BTreeMap<&str, &OccupancySample> = BTreeMap::new();
    for sample in &slot.samples {
        by_id.entry(sample.carpark_id.as_str()).or_insert(sample);
    }

    let rows: Vec<JoinedRow> = registry
        .filter(areas)
        .filter_map(|record| {
            let sample = by_id.get(record.id.as_str())?;
            let total = sample.total_lots?;
            Some(JoinedRow::new(record, sample, total))
        })
        .collect();

    log::debug!(
        "Joined {} of {} samples at {key} with the registry",
        rows.len(),
        slot.samples.len()
    );

    Snapshot {
        rows,
        missing_baseline: slot.missing_baseline,
    }
}
