//! HTTP handler functions for the dashboard API.

use actix_web::{HttpResponse, web};
use carpark_dashboard_analysis::AnalysisError;
use carpark_dashboard_analysis_models::{ClusterId, LotType, Weekday};
use carpark_dashboard_carpark_models::Selection;
use carpark_dashboard_occupancy::join::join;
use carpark_dashboard_occupancy_models::{Hour, MonthDay, SlotKey};
use carpark_dashboard_server_models::{
    ApiAvailabilityMarker, ApiAvailabilityView, ApiCarparkPoint, ApiClusterLayer,
    ApiClusterMapView, ApiClusterMarker, ApiClusterTrendsView, ApiHealth, ApiLocation, ApiLotType,
    ApiMapDefaults, ApiMeta, ApiSeries, ApiTownComparison, ApiWeekdayCarparks, ApiWeekdayView,
    AvailabilityQueryParams, ClusterQueryParams, LOCATION_ZOOM, NO_DATA_MESSAGE,
    TownCompareQueryParams, WeekdayCarparksQueryParams, WeekdayTrendQueryParams,
    cluster_tooltip, palette_color,
};
use chrono::NaiveDate;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/meta`
///
/// Returns the option lists and bounds of every control on the page.
pub async fn meta(state: web::Data<AppState>) -> HttpResponse {
    let config = &state.config;
    let dataset = &state.dataset;

    let (Some(first_date), Some(last_date)) =
        (config.calendar.first_date(), config.calendar.last_date())
    else {
        log::error!(
            "Configured month {}-{} has no valid dates",
            config.calendar.year,
            config.calendar.month
        );
        return internal_error("Invalid calendar configuration");
    };

    HttpResponse::Ok().json(ApiMeta {
        first_date,
        last_date,
        hours: config.calendar.hours().into_iter().map(Hour::value).collect(),
        planning_areas: dataset.registry.planning_areas(),
        carparks: dataset.registry.iter().map(ApiCarparkPoint::from).collect(),
        weekday_areas: dataset.weekday.areas().map(str::to_string).collect(),
        weekdays: Weekday::ALL.to_vec(),
        clusters: dataset.clusters.cluster_ids(),
        town_areas: dataset.towns.areas().map(str::to_string).collect(),
        lot_types: LotType::ALL.into_iter().map(ApiLotType::from).collect(),
        map: ApiMapDefaults {
            center_latitude: config.map.center_latitude,
            center_longitude: config.map.center_longitude,
            zoom: config.map.zoom,
            style: config.map.style.clone(),
            access_token: config.map.access_token.clone(),
        },
    })
}

/// `GET /api/availability`
///
/// Joins the selected planning areas with one time slot.
pub async fn availability(
    state: web::Data<AppState>,
    params: web::Query<AvailabilityQueryParams>,
) -> HttpResponse {
    let calendar = &state.config.calendar;

    let Ok(date) = NaiveDate::parse_from_str(params.date.trim(), "%Y-%m-%d") else {
        return bad_request(&format!(
            "Invalid date '{}': expected YYYY-MM-DD",
            params.date
        ));
    };
    if !calendar.contains_date(date) {
        return bad_request(&format!(
            "Date {date} is outside {:04}-{:02}",
            calendar.year, calendar.month
        ));
    }

    let Some(hour) = params
        .hour
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(|h| Hour::new(h).ok())
        .filter(|h| calendar.contains_hour(*h))
    else {
        return bad_request(&format!(
            "Invalid hour '{}': expected {}-{}",
            params.hour, calendar.first_hour, calendar.last_hour
        ));
    };

    let areas = if params.islandwide.unwrap_or(false) {
        Selection::All
    } else {
        Selection::only(split_list(params.areas.as_deref()).map(str::to_string))
    };

    let key = SlotKey {
        date: MonthDay::from_date(date),
        hour,
    };
    let snapshot = join(
        &state.dataset.registry,
        &state.dataset.occupancy,
        key,
        &areas,
    );
    let empty = snapshot.is_empty();
    HttpResponse::Ok().json(ApiAvailabilityView {
        date,
        hour: hour.label(),
        empty,
        message: no_data(empty),
        missing_baseline: snapshot.missing_baseline,
        markers: snapshot
            .rows
            .iter()
            .map(ApiAvailabilityMarker::from)
            .collect(),
    })
}

/// `GET /api/weekday/carparks`
pub async fn weekday_carparks(
    state: web::Data<AppState>,
    params: web::Query<WeekdayCarparksQueryParams>,
) -> HttpResponse {
    let carparks = state
        .dataset
        .weekday
        .carparks(&params.area)
        .into_iter()
        .map(str::to_string)
        .collect();

    HttpResponse::Ok().json(ApiWeekdayCarparks {
        area: params.area.clone(),
        carparks,
    })
}

/// `GET /api/weekday/trends`
///
/// Hourly profiles of one car park for the selected days of the week.
pub async fn weekday_trends(
    state: web::Data<AppState>,
    params: web::Query<WeekdayTrendQueryParams>,
) -> HttpResponse {
    let days = if params.all_days.unwrap_or(false) {
        Selection::All
    } else {
        match params.days.as_deref() {
            None => Selection::only([Weekday::Monday]),
            Some(days) => match split_list(Some(days))
                .map(str::parse::<Weekday>)
                .collect::<Result<Selection<_>, _>>()
            {
                Ok(days) => days,
                Err(_) => return bad_request(&format!("Invalid days '{days}'")),
            },
        }
    };

    let series: Vec<ApiSeries> = state
        .dataset
        .weekday
        .trends(&params.area, &params.carpark, &days)
        .iter()
        .map(|trend| {
            ApiSeries::new(
                trend.weekday.to_string(),
                palette_color(trend.weekday.index(), Weekday::ALL.len()),
                &trend.points,
            )
        })
        .collect();

    let location = state
        .dataset
        .registry
        .get(&params.carpark)
        .map(|record| ApiLocation {
            id: record.id.clone(),
            longitude: record.longitude,
            latitude: record.latitude,
            zoom: LOCATION_ZOOM,
        });

    let empty = series.is_empty();
    HttpResponse::Ok().json(ApiWeekdayView {
        area: params.area.clone(),
        carpark: params.carpark.clone(),
        empty,
        message: no_data(empty),
        series,
        location,
    })
}

/// `GET /api/clusters/trends`
///
/// Weekday and weekend centroid lines of the selected clusters.
pub async fn cluster_trends(
    state: web::Data<AppState>,
    params: web::Query<ClusterQueryParams>,
) -> HttpResponse {
    let clusters = match cluster_selection(&params) {
        Ok(clusters) => clusters,
        Err(response) => return response,
    };
    let count = state.config.clusters.count;

    let mut weekday = Vec::new();
    let mut weekend = Vec::new();
    for profile in state.dataset.clusters.profiles(&clusters) {
        let name = format!("cluster {}", profile.cluster);
        let color = palette_color(usize::from(profile.cluster), count);
        weekday.push(ApiSeries::new(name.clone(), color.clone(), &profile.weekday));
        weekend.push(ApiSeries::new(name, color, &profile.weekend));
    }

    let empty = weekday.is_empty();
    HttpResponse::Ok().json(ApiClusterTrendsView {
        empty,
        message: no_data(empty),
        weekday,
        weekend,
    })
}

/// `GET /api/clusters/map`
///
/// One marker layer per selected cluster plus member counts.
pub async fn cluster_map(
    state: web::Data<AppState>,
    params: web::Query<ClusterQueryParams>,
) -> HttpResponse {
    let clusters = match cluster_selection(&params) {
        Ok(clusters) => clusters,
        Err(response) => return response,
    };
    let set = &state.dataset.clusters;
    let count = state.config.clusters.count;

    let counts = set.counts(&clusters);
    let layers: Vec<ApiClusterLayer> = counts
        .iter()
        .map(|c| ApiClusterLayer {
            cluster: c.cluster,
            name: format!("cluster {}", c.cluster),
            color: palette_color(usize::from(c.cluster), count),
            markers: set
                .members(c.cluster)
                .map(|member| ApiClusterMarker {
                    id: member.carpark.id.clone(),
                    longitude: member.carpark.longitude,
                    latitude: member.carpark.latitude,
                    tooltip: cluster_tooltip(&member.carpark.id, member.cluster),
                })
                .collect(),
        })
        .collect();

    let empty = layers.iter().all(|layer| layer.markers.is_empty());
    HttpResponse::Ok().json(ApiClusterMapView {
        empty,
        message: no_data(empty),
        layers,
        counts,
    })
}

/// `GET /api/towns/compare`
///
/// Bar charts of every planning area with two of them highlighted, plus
/// their weekday and weekend profiles.
pub async fn town_compare(
    state: web::Data<AppState>,
    params: web::Query<TownCompareQueryParams>,
) -> HttpResponse {
    let lot_type = params.lot_type.unwrap_or_default();

    match state
        .dataset
        .towns
        .compare(&params.first, &params.second, lot_type)
    {
        Ok(comparison) => {
            let profiles = &comparison.profiles;
            let weekday = profiles
                .iter()
                .enumerate()
                .map(|(i, p)| ApiSeries::new(&p.area, palette_color(i, profiles.len()), &p.weekday))
                .collect();
            let weekend = profiles
                .iter()
                .enumerate()
                .map(|(i, p)| ApiSeries::new(&p.area, palette_color(i, profiles.len()), &p.weekend))
                .collect();

            HttpResponse::Ok().json(ApiTownComparison {
                first: params.first.clone(),
                second: params.second.clone(),
                lot_type: ApiLotType::from(comparison.lot_type),
                carpark_counts: comparison.carpark_counts,
                lot_counts: comparison.lot_counts,
                weekday,
                weekend,
            })
        }
        Err(AnalysisError::UnknownArea { area }) => {
            log::warn!("Town comparison requested for unknown area {area}");
            HttpResponse::NotFound().json(serde_json::json!({
                "error": format!("Unknown planning area: {area}")
            }))
        }
        Err(e) => {
            log::error!("Failed to compare towns: {e}");
            internal_error("Failed to compare towns")
        }
    }
}

/// Parses the cluster selection. No parameters means cluster 0.
fn cluster_selection(params: &ClusterQueryParams) -> Result<Selection<ClusterId>, HttpResponse> {
    if params.all.unwrap_or(false) {
        return Ok(Selection::All);
    }
    let Some(clusters) = params.clusters.as_deref() else {
        return Ok(Selection::only([0]));
    };
    split_list(Some(clusters))
        .map(str::parse::<ClusterId>)
        .collect::<Result<Selection<_>, _>>()
        .map_err(|_| bad_request(&format!("Invalid clusters '{clusters}'")))
}

/// Splits a comma-separated query value, skipping blanks.
fn split_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn no_data(empty: bool) -> Option<String> {
    empty.then(|| NO_DATA_MESSAGE.to_string())
}

fn bad_request(message: &str) -> HttpResponse {
    log::warn!("Rejected request: {message}");
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
}

fn internal_error(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({ "error": message }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use carpark_dashboard_analysis::clusters::{ClusterLabels, ClusterSet};
    use carpark_dashboard_analysis::npy::NpyArray;
    use carpark_dashboard_analysis::towns::TownStatsTable;
    use carpark_dashboard_analysis::weekday::WeekdayProfiles;
    use carpark_dashboard_carpark::registry::CarparkRegistry;
    use carpark_dashboard_dataset::Dataset;
    use carpark_dashboard_dataset::config::DashboardConfig;
    use carpark_dashboard_occupancy::store::OccupancyStore;
    use carpark_dashboard_server_models::NO_DATA_MESSAGE;
    use serde_json::Value;

    use crate::{AppState, configure_api};

    const REGISTRY: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [103.93, 1.32]},
             "properties": {"car_park_no": "B10", "planning_area": "BEDOK"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [103.94, 1.33]},
             "properties": {"car_park_no": "B12", "planning_area": "BEDOK"}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [103.95, 1.35]},
             "properties": {"car_park_no": "T1", "planning_area": "TAMPINES"}}
        ]
    }"#;

    const OCCUPANCY: &str = r#"{
        "08-01": {
            "06": [
                {"n": "B10", "t": 200, "o": 50.0},
                {"n": "T1", "t": 100, "o": 20.0}
            ],
            "09": [
                {"n": "B10", "o": 25.0},
                {"n": "B12", "o": 80.0},
                {"n": "T1", "o": 10.0}
            ]
        }
    }"#;

    const WEEKDAY: &str = r#"{
        "BEDOK": {"B10": {"0": [50.0, 45.0], "5": [70.0]}}
    }"#;

    const TOWNS: &str = r#"{
        "BEDOK": {"TOTAL_CP": 2, "TOTAL_LOTS": 400, "MSCP_LOTS": 300, "SURFACE_LOTS": 100,
                  "WD_TS": [50.0, 48.0], "WE_TS": [60.0]},
        "TAMPINES": {"TOTAL_CP": 1, "TOTAL_LOTS": 100, "MSCP_LOTS": 0, "SURFACE_LOTS": 100,
                     "WD_TS": [20.0], "WE_TS": [30.0]}
    }"#;

    const LABELS: &str = ",CAR_PARK_NO,labels\n0,B10,0\n1,B12,0\n2,T1,1\n";

    fn state() -> AppState {
        let mut config = DashboardConfig::embedded().unwrap();
        config.clusters.count = 2;

        let registry = CarparkRegistry::from_geojson_str(REGISTRY).unwrap();
        let labels = ClusterLabels::from_reader(LABELS.as_bytes()).unwrap();
        let centroids = NpyArray {
            shape: vec![2, 36, 1],
            data: (0..72_u32).map(|i| f64::from(i % 36)).collect(),
        };
        let clusters = ClusterSet::new(&registry, &labels, &centroids, 2).unwrap();

        let dataset = Dataset {
            occupancy: OccupancyStore::from_json_str(OCCUPANCY).unwrap(),
            weekday: WeekdayProfiles::from_json_str(WEEKDAY).unwrap(),
            towns: TownStatsTable::from_json_str(TOWNS).unwrap(),
            clusters,
            registry,
        };

        AppState {
            dataset: Arc::new(dataset),
            config: Arc::new(config),
        }
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(actix_web::web::Data::new(state()))
                .configure(configure_api),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }

    fn ids(markers: &Value) -> Vec<String> {
        markers
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn meta_lists_controls() {
        let (status, body) = get("/api/meta").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["firstDate"], "2022-08-01");
        assert_eq!(body["lastDate"], "2022-08-31");
        assert_eq!(body["hours"].as_array().unwrap().len(), 18);
        assert_eq!(body["planningAreas"], serde_json::json!(["BEDOK", "TAMPINES"]));
        let carparks: Vec<&str> = body["carparks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_str().unwrap())
            .collect();
        assert_eq!(carparks, vec!["B10", "B12", "T1"]);
        assert_eq!(body["clusters"], serde_json::json!([0, 1]));
        assert_eq!(body["lotTypes"][1]["label"], "Multi-Storey Car Park");
        assert!((body["map"]["zoom"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn baseline_hour_uses_its_own_totals() {
        let (status, body) =
            get("/api/availability?date=2022-08-01&hour=6&islandwide=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["empty"], false);
        assert_eq!(ids(&body["markers"]), vec!["B10", "T1"]);
        assert_eq!(
            body["markers"][0]["tooltip"],
            "B10<br>Total Lots: 200<br>Availability: 50.0%"
        );
    }

    #[actix_web::test]
    async fn later_hours_backfill_totals_and_drop_unmatched() {
        let (_, body) = get("/api/availability?date=2022-08-01&hour=9&areas=BEDOK").await;
        assert_eq!(ids(&body["markers"]), vec!["B10"]);
        assert_eq!(body["markers"][0]["totalLots"], 200);
        assert_eq!(body["markers"][0]["availableLots"], 50);
        assert_eq!(body["missingBaseline"], 1);
        assert_eq!(body["hour"], "09:00");
    }

    #[actix_web::test]
    async fn no_areas_and_absent_slots_are_empty_views() {
        let (status, body) = get("/api/availability?date=2022-08-01&hour=9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["empty"], true);
        assert_eq!(body["message"], NO_DATA_MESSAGE);

        let (status, body) =
            get("/api/availability?date=2022-08-02&hour=12&islandwide=true").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["empty"], true);
        assert!(body["markers"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn out_of_range_slots_are_rejected() {
        for uri in [
            "/api/availability?date=2022-09-01&hour=6&islandwide=true",
            "/api/availability?date=2022-08-01&hour=5&islandwide=true",
            "/api/availability?date=2022-08-01&hour=24&islandwide=true",
            "/api/availability?date=yesterday&hour=6&islandwide=true",
        ] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert!(body["error"].is_string());
        }
    }

    #[actix_web::test]
    async fn weekday_defaults_to_monday() {
        let (_, body) = get("/api/weekday/trends?area=BEDOK&carpark=B10").await;
        let series = body["series"].as_array().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0]["name"], "Monday");
        assert_eq!(series[0]["points"][1]["hour"], "07:00");
        assert!((body["location"]["zoom"].as_f64().unwrap() - 16.0).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn weekday_all_days_and_unknown_car_parks() {
        let (_, body) = get("/api/weekday/trends?area=BEDOK&carpark=B10&allDays=true").await;
        assert_eq!(body["series"].as_array().unwrap().len(), 2);

        let (_, body) = get("/api/weekday/trends?area=BEDOK&carpark=NOPE").await;
        assert_eq!(body["empty"], true);
        assert_eq!(body["message"], NO_DATA_MESSAGE);
        assert!(body["location"].is_null());

        let (status, _) = get("/api/weekday/trends?area=BEDOK&carpark=B10&days=Funday").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn weekday_car_parks_per_area() {
        let (_, body) = get("/api/weekday/carparks?area=BEDOK").await;
        assert_eq!(body["carparks"], serde_json::json!(["B10"]));
    }

    #[actix_web::test]
    async fn cluster_zero_by_default() {
        let (_, body) = get("/api/clusters/map").await;
        let layers = body["layers"].as_array().unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(ids(&layers[0]["markers"]), vec!["B10", "B12"]);
        assert_eq!(layers[0]["markers"][0]["tooltip"], "B10<br>Cluster 0");
        assert_eq!(body["counts"], serde_json::json!([{"cluster": 0, "carparks": 2}]));

        let (_, body) = get("/api/clusters/trends").await;
        assert_eq!(body["weekday"].as_array().unwrap().len(), 1);
        assert_eq!(body["weekend"][0]["points"][0]["availability"], 18.0);
    }

    #[actix_web::test]
    async fn all_clusters() {
        let (_, body) = get("/api/clusters/map?all=true").await;
        let clusters: Vec<u64> = body["counts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["cluster"].as_u64().unwrap())
            .collect();
        assert_eq!(clusters, vec![0, 1]);

        let (_, body) = get("/api/clusters/trends?clusters=").await;
        assert_eq!(body["empty"], true);

        let (status, _) = get("/api/clusters/trends?clusters=zero").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn town_comparison() {
        let (status, body) =
            get("/api/towns/compare?first=BEDOK&second=TAMPINES&lotType=surface").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["carparkCounts"][0]["area"], "TAMPINES");
        assert_eq!(body["lotType"]["label"], "Surface Car Park");
        assert_eq!(body["weekday"][0]["name"], "BEDOK");
        assert_eq!(body["weekday"][0]["points"].as_array().unwrap().len(), 2);

        let (status, body) = get("/api/towns/compare?first=BEDOK&second=ATLANTIS").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown planning area: ATLANTIS");
    }
}
