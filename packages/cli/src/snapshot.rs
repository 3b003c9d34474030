//! Availability table of one time slot, printed to the terminal.

use std::fmt::Write as _;

use carpark_dashboard_carpark_models::Selection;
use carpark_dashboard_dataset::Dataset;
use carpark_dashboard_dataset::config::CalendarConfig;
use carpark_dashboard_occupancy::join::{Snapshot, join};
use carpark_dashboard_occupancy_models::{Hour, MonthDay, SlotKey};
use chrono::NaiveDate;

/// Checks `date` and `hour` against the configured calendar.
pub fn slot_key(calendar: &CalendarConfig, date: NaiveDate, hour: u8) -> Result<SlotKey, String> {
    if !calendar.contains_date(date) {
        return Err(format!(
            "Date {date} is outside {:04}-{:02}",
            calendar.year, calendar.month
        ));
    }
    let hour = Hour::new(hour)
        .ok()
        .filter(|h| calendar.contains_hour(*h))
        .ok_or_else(|| {
            format!(
                "Hour {hour} is outside {}-{}",
                calendar.first_hour, calendar.last_hour
            )
        })?;

    Ok(SlotKey {
        date: MonthDay::from_date(date),
        hour,
    })
}

/// Joins the slot with the given planning areas; no areas means the whole
/// island.
#[must_use]
pub fn snapshot(dataset: &Dataset, key: SlotKey, areas: &[String]) -> Snapshot {
    let areas = if areas.is_empty() {
        Selection::All
    } else {
        Selection::only(areas.iter().cloned())
    };
    join(&dataset.registry, &dataset.occupancy, key, &areas)
}

/// Renders a snapshot as a fixed-width table.
#[must_use]
pub fn render_table(key: SlotKey, snapshot: &Snapshot) -> String {
    let mut out = String::new();

    if snapshot.is_empty() {
        let _ = writeln!(out, "No data available for the selected car parks at {key}");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<8} {:<24} {:>10} {:>10} {:>9}",
        "Car park", "Planning area", "Total", "Available", "Avail %"
    );
    for row in &snapshot.rows {
        let _ = writeln!(
            out,
            "{:<8} {:<24} {:>10} {:>10} {:>8.1}%",
            row.carpark_id,
            row.planning_area,
            row.total_lots,
            row.available_lots(),
            row.availability_percent
        );
    }
    let _ = writeln!(out, "{} car parks at {key}", snapshot.rows.len());
    if snapshot.missing_baseline > 0 {
        let _ = writeln!(
            out,
            "{} car parks skipped: no total lot count at 06:00",
            snapshot.missing_baseline
        );
    }

    out
}
