#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the car park dashboard server.
//!
//! Every view is ready to plot: markers carry their color and tooltip,
//! series carry their color and `HH:00` labels. Views that can come up
//! empty share the same `empty`/`message` pair so the page renders "no
//! data" one way everywhere.

use carpark_dashboard_analysis_models::{
    ClusterCount, ClusterId, LotType, ProfilePoint, TownBar, Weekday,
};
use carpark_dashboard_carpark_models::CarparkRecord;
use carpark_dashboard_occupancy_models::JoinedRow;
use chrono::NaiveDate;
use colorous::{Color, Gradient};
use serde::{Deserialize, Serialize};

/// Message shown by every empty view.
pub const NO_DATA_MESSAGE: &str = "No data available for the selected car parks";

/// Zoom level of the single car park map on the day-of-week page.
pub const LOCATION_ZOOM: f64 = 16.0;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Everything the page needs to build its controls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMeta {
    /// First selectable date.
    pub first_date: NaiveDate,
    /// Last selectable date.
    pub last_date: NaiveDate,
    /// Selectable hours, ascending.
    pub hours: Vec<u8>,
    /// Planning areas of the registry.
    pub planning_areas: Vec<String>,
    /// Every car park of the registry, for the day-of-week map.
    pub carparks: Vec<ApiCarparkPoint>,
    /// Planning areas with day-of-week data.
    pub weekday_areas: Vec<String>,
    /// Days of the week, Monday first.
    pub weekdays: Vec<Weekday>,
    /// Valid cluster labels.
    pub clusters: Vec<ClusterId>,
    /// Planning areas with town statistics.
    pub town_areas: Vec<String>,
    /// Lot types the town comparison can chart.
    pub lot_types: Vec<ApiLotType>,
    /// Initial map view.
    pub map: ApiMapDefaults,
}

/// A registry car park without occupancy data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCarparkPoint {
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl From<&CarparkRecord> for ApiCarparkPoint {
    fn from(record: &CarparkRecord) -> Self {
        Self {
            id: record.id.clone(),
            longitude: record.longitude,
            latitude: record.latitude,
        }
    }
}

/// A lot type with its display label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLotType {
    pub value: LotType,
    pub label: String,
}

impl From<LotType> for ApiLotType {
    fn from(value: LotType) -> Self {
        Self {
            value,
            label: value.to_string(),
        }
    }
}

/// Initial map view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMapDefaults {
    /// Latitude of the map center.
    pub center_latitude: f64,
    /// Longitude of the map center.
    pub center_longitude: f64,
    /// Mapbox zoom level.
    pub zoom: f64,
    /// Mapbox style name.
    pub style: String,
    /// Mapbox token, absent when the page should use `OpenStreetMap`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Query parameters for the availability endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQueryParams {
    /// Date as `YYYY-MM-DD`.
    pub date: String,
    /// Hour of day, `6` through `23`.
    pub hour: String,
    /// Comma-separated planning areas.
    pub areas: Option<String>,
    /// Every planning area; overrides `areas`.
    pub islandwide: Option<bool>,
}

/// One car park on the availability map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAvailabilityMarker {
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub planning_area: String,
    pub total_lots: u32,
    pub available_lots: u32,
    /// Share of lots available, 0-100.
    pub availability_percent: f64,
    /// Marker fill, `#rrggbb`, on the same reversed scale the page uses.
    pub color: String,
    pub tooltip: String,
}

impl From<&JoinedRow> for ApiAvailabilityMarker {
    fn from(row: &JoinedRow) -> Self {
        Self {
            id: row.carpark_id.clone(),
            longitude: row.longitude,
            latitude: row.latitude,
            planning_area: row.planning_area.clone(),
            total_lots: row.total_lots,
            available_lots: row.available_lots(),
            availability_percent: row.availability_percent,
            color: availability_color(row.availability_percent),
            tooltip: availability_tooltip(
                &row.carpark_id,
                row.total_lots,
                row.availability_percent,
            ),
        }
    }
}

/// Availability map of one time slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAvailabilityView {
    pub date: NaiveDate,
    /// Hour as `HH:00`.
    pub hour: String,
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Car parks left out because the day's baseline had no total for them.
    pub missing_baseline: usize,
    pub markers: Vec<ApiAvailabilityMarker>,
}

/// Query parameters for the day-of-week car park list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayCarparksQueryParams {
    pub area: String,
}

/// Car parks of one planning area that have day-of-week data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWeekdayCarparks {
    pub area: String,
    pub carparks: Vec<String>,
}

/// Query parameters for the day-of-week trends endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayTrendQueryParams {
    pub area: String,
    pub carpark: String,
    /// Comma-separated day names. Defaults to Monday.
    pub days: Option<String>,
    /// Every day of the week; overrides `days`.
    pub all_days: Option<bool>,
}

/// One point of a line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPoint {
    /// Hour as `HH:00`.
    pub hour: String,
    pub availability: f64,
}

impl From<&ProfilePoint> for ApiPoint {
    fn from(point: &ProfilePoint) -> Self {
        Self {
            hour: point.hour.label(),
            availability: point.availability,
        }
    }
}

/// One line of a line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSeries {
    pub name: String,
    /// Line color, `#rrggbb`.
    pub color: String,
    pub points: Vec<ApiPoint>,
}

impl ApiSeries {
    #[must_use]
    pub fn new(name: impl Into<String>, color: String, points: &[ProfilePoint]) -> Self {
        Self {
            name: name.into(),
            color,
            points: points.iter().map(ApiPoint::from).collect(),
        }
    }
}

/// Where a single car park sits, for a zoomed-in map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLocation {
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
}

/// Day-of-week trends of one car park.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWeekdayView {
    pub area: String,
    pub carpark: String,
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// One series per selected day, Monday first.
    pub series: Vec<ApiSeries>,
    /// Absent when the car park is not in the registry.
    pub location: Option<ApiLocation>,
}

/// Query parameters for both cluster endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterQueryParams {
    /// Comma-separated cluster labels. Defaults to `0`.
    pub clusters: Option<String>,
    /// Every cluster; overrides `clusters`.
    pub all: Option<bool>,
}

/// Centroid lines of the selected clusters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClusterTrendsView {
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub weekday: Vec<ApiSeries>,
    pub weekend: Vec<ApiSeries>,
}

/// A car park on the cluster map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClusterMarker {
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
    pub tooltip: String,
}

/// Markers of one cluster, drawn in the cluster's color.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClusterLayer {
    pub cluster: ClusterId,
    pub name: String,
    pub color: String,
    pub markers: Vec<ApiClusterMarker>,
}

/// Cluster map and member counts of the selected clusters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClusterMapView {
    pub empty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub layers: Vec<ApiClusterLayer>,
    pub counts: Vec<ClusterCount>,
}

/// Query parameters for the town comparison endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TownCompareQueryParams {
    pub first: String,
    pub second: String,
    /// Defaults to every lot.
    pub lot_type: Option<LotType>,
}

/// Two planning areas side by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTownComparison {
    pub first: String,
    pub second: String,
    pub lot_type: ApiLotType,
    /// Car parks per area, ascending.
    pub carpark_counts: Vec<TownBar>,
    /// Lots of the chosen type per area, ascending.
    pub lot_counts: Vec<TownBar>,
    pub weekday: Vec<ApiSeries>,
    pub weekend: Vec<ApiSeries>,
}

/// Marker color for an availability percentage: pale yellow when mostly
/// free, dark red when full. Values outside 0-100 are clamped.
#[must_use]
pub fn availability_color(percent: f64) -> String {
    let t = (percent / 100.0).clamp(0.0, 1.0);
    hex(colorous::YELLOW_ORANGE_RED.eval_continuous(1.0 - t))
}

/// Tooltip of an availability marker. The percentage always shows a
/// decimal point (`50.0`, `25.55`).
#[must_use]
pub fn availability_tooltip(id: &str, total_lots: u32, percent: f64) -> String {
    format!("{id}<br>Total Lots: {total_lots}<br>Availability: {percent:?}%")
}

/// Tooltip of a cluster marker.
#[must_use]
pub fn cluster_tooltip(id: &str, cluster: ClusterId) -> String {
    format!("{id}<br>Cluster {cluster}")
}

/// Color of the `index`-th of `count` series, sampled from viridis at
/// `index / count`.
#[must_use]
pub fn palette_color(index: usize, count: usize) -> String {
    palette_color_from(colorous::VIRIDIS, index, count)
}

#[allow(clippy::cast_precision_loss)]
fn palette_color_from(gradient: Gradient, index: usize, count: usize) -> String {
    let t = if count == 0 {
        0.0
    } else {
        index as f64 / count as f64
    };
    hex(gradient.eval_continuous(t.clamp(0.0, 1.0)))
}

fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpark_dashboard_occupancy_models::{Hour, OccupancySample};

    #[test]
    fn availability_color_is_reversed_yellow_orange_red() {
        assert_eq!(
            availability_color(100.0),
            hex(colorous::YELLOW_ORANGE_RED.eval_continuous(0.0))
        );
        assert_eq!(
            availability_color(0.0),
            hex(colorous::YELLOW_ORANGE_RED.eval_continuous(1.0))
        );
        assert_eq!(availability_color(150.0), availability_color(100.0));
        assert_eq!(availability_color(30.0).len(), 7);
    }

    #[test]
    fn palette_starts_at_viridis_origin() {
        assert_eq!(
            palette_color(0, 13),
            hex(colorous::VIRIDIS.eval_continuous(0.0))
        );
        assert_ne!(palette_color(0, 13), palette_color(12, 13));
        assert_eq!(palette_color(3, 0), palette_color(0, 13));
    }

    #[test]
    fn marker_from_joined_row() {
        let record = CarparkRecord {
            id: "B10".to_string(),
            longitude: 103.93,
            latitude: 1.32,
            planning_area: "BEDOK".to_string(),
        };
        let sample = OccupancySample {
            carpark_id: "B10".to_string(),
            availability_percent: 25.5,
            total_lots: None,
        };
        let marker = ApiAvailabilityMarker::from(&JoinedRow::new(&record, &sample, 200));

        assert_eq!(marker.tooltip, "B10<br>Total Lots: 200<br>Availability: 25.5%");
        assert_eq!(marker.available_lots, 51);
        assert_eq!(marker.color, availability_color(25.5));
    }

    #[test]
    fn tooltip_percent_keeps_decimal_point() {
        assert_eq!(
            availability_tooltip("ACB", 120, 50.0),
            "ACB<br>Total Lots: 120<br>Availability: 50.0%"
        );
        assert_eq!(
            availability_tooltip("ACB", 120, 33.33),
            "ACB<br>Total Lots: 120<br>Availability: 33.33%"
        );
    }

    #[test]
    fn series_points_use_hour_labels() {
        let points = [ProfilePoint {
            hour: Hour::new(7).unwrap(),
            availability: 42.0,
        }];
        let series = ApiSeries::new("Monday", palette_color(0, 7), &points);
        assert_eq!(series.points[0].hour, "07:00");

        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["points"][0]["availability"], 42.0);
    }

    #[test]
    fn lot_type_query_values_are_camel_case() {
        let params: TownCompareQueryParams = serde_json::from_str(
            r#"{"first": "BEDOK", "second": "BISHAN", "lotType": "multiStorey"}"#,
        )
        .unwrap();
        assert_eq!(params.lot_type, Some(LotType::MultiStorey));
        assert_eq!(ApiLotType::from(LotType::Surface).label, "Surface Car Park");
    }
}
