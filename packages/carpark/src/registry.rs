//! In-memory car park registry.
//!
//! Records are keyed by car park number, so filtering by planning area
//! yields them in car park order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use carpark_dashboard_carpark_models::{CarparkRecord, Selection};
use geo::Point;
use geojson::{Feature, FeatureCollection, GeoJson};

use crate::CarparkError;

/// Property holding the car park number.
const ID_PROPERTY: &str = "car_park_no";
/// Property holding the URA planning area name.
const AREA_PROPERTY: &str = "planning_area";

/// Every known car park, keyed by car park number.
#[derive(Debug, Clone, Default)]
pub struct CarparkRegistry {
    records: BTreeMap<String, CarparkRecord>,
}

impl CarparkRegistry {
    /// Builds a registry from already-parsed records. Later duplicates of
    /// the same car park number are ignored.
    pub fn from_records(records: impl IntoIterator<Item = CarparkRecord>) -> Self {
        let mut map = BTreeMap::new();
        for record in records {
            if map.contains_key(&record.id) {
                log::warn!("Duplicate car park {} in registry, keeping first", record.id);
                continue;
            }
            map.insert(record.id.clone(), record);
        }
        Self { records: map }
    }

    /// Reads and parses the registry `GeoJSON` file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CarparkError`] if the file cannot be read, is not a
    /// `FeatureCollection`, or any feature is malformed.
    pub fn load(path: &Path) -> Result<Self, CarparkError> {
        let body = std::fs::read_to_string(path)?;
        let registry = Self::from_geojson_str(&body)?;
        log::info!(
            "Loaded {} car parks in {} planning areas from {}",
            registry.len(),
            registry.planning_areas().len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parses a `GeoJSON` `FeatureCollection` of car park points.
    ///
    /// # Errors
    ///
    /// Returns [`CarparkError`] if the text is not a `FeatureCollection` or
    /// any feature lacks a Point geometry or one of the required
    /// properties.
    pub fn from_geojson_str(body: &str) -> Result<Self, CarparkError> {
        let geojson: GeoJson = body.parse()?;
        let collection = FeatureCollection::try_from(geojson)?;

        let records = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(idx, feature)| parse_feature(idx, feature))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::from_records(records))
    }

    /// Number of car parks in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the registry holds no car parks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks a car park up by number.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CarparkRecord> {
        self.records.get(id)
    }

    /// Iterates over every car park, ordered by car park number.
    pub fn iter(&self) -> impl Iterator<Item = &CarparkRecord> {
        self.records.values()
    }

    /// Distinct planning area names, sorted.
    #[must_use]
    pub fn planning_areas(&self) -> Vec<String> {
        self.records
            .values()
            .map(|r| r.planning_area.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Car parks whose planning area is selected. [`Selection::All`] is the
    /// islandwide view.
    pub fn filter<'a>(
        &'a self,
        areas: &'a Selection<String>,
    ) -> impl Iterator<Item = &'a CarparkRecord> + 'a {
        self.records
            .values()
            .filter(move |r| areas.contains(r.planning_area.as_str()))
    }
}

fn parse_feature(idx: usize, feature: Feature) -> Result<CarparkRecord, CarparkError> {
    let id = string_property(&feature, ID_PROPERTY).ok_or_else(|| CarparkError::Conversion {
        message: format!("Feature {idx} has no '{ID_PROPERTY}' property"),
    })?;

    let planning_area =
        string_property(&feature, AREA_PROPERTY).ok_or_else(|| CarparkError::Conversion {
            message: format!("Car park {id} has no '{AREA_PROPERTY}' property"),
        })?;

    let geometry = feature.geometry.ok_or_else(|| CarparkError::Conversion {
        message: format!("Car park {id} has no geometry"),
    })?;

    let point = Point::<f64>::try_from(geometry.value).map_err(|e| CarparkError::Conversion {
        message: format!("Car park {id} geometry is not a point: {e}"),
    })?;

    Ok(CarparkRecord {
        id,
        longitude: point.x(),
        latitude: point.y(),
        planning_area,
    })
}

fn string_property(feature: &Feature, name: &str) -> Option<String> {
    feature
        .property(name)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "car_park_no": "ACB", "planning_area": "DOWNTOWN CORE" },
                "geometry": { "type": "Point", "coordinates": [103.8547, 1.3008] }
            },
            {
                "type": "Feature",
                "properties": { "car_park_no": "BJ55", "planning_area": "BUKIT PANJANG" },
                "geometry": { "type": "Point", "coordinates": [103.7700, 1.3770] }
            },
            {
                "type": "Feature",
                "properties": { "car_park_no": "BJ56", "planning_area": "BUKIT PANJANG" },
                "geometry": { "type": "Point", "coordinates": [103.7710, 1.3780] }
            }
        ]
    }"#;

    fn registry() -> CarparkRegistry {
        CarparkRegistry::from_geojson_str(REGISTRY).unwrap()
    }

    #[test]
    fn parses_points_and_properties() {
        let registry = registry();
        assert_eq!(registry.len(), 3);

        let acb = registry.get("ACB").unwrap();
        assert_eq!(acb.planning_area, "DOWNTOWN CORE");
        assert!((acb.longitude - 103.8547).abs() < 1e-9);
        assert!((acb.latitude - 1.3008).abs() < 1e-9);
    }

    #[test]
    fn planning_areas_are_distinct_and_sorted() {
        assert_eq!(
            registry().planning_areas(),
            vec!["BUKIT PANJANG".to_string(), "DOWNTOWN CORE".to_string()]
        );
    }

    #[test]
    fn islandwide_filter_returns_everything() {
        let registry = registry();
        assert_eq!(registry.filter(&Selection::All).count(), registry.len());
    }

    #[test]
    fn area_filter_returns_matching_car_parks() {
        let registry = registry();
        let areas = Selection::only(["BUKIT PANJANG".to_string()]);
        let ids: Vec<&str> = registry.filter(&areas).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["BJ55", "BJ56"]);
    }

    #[test]
    fn empty_area_filter_returns_nothing() {
        assert_eq!(registry().filter(&Selection::none()).count(), 0);
    }

    #[test]
    fn rejects_non_point_geometry() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "car_park_no": "X1", "planning_area": "BEDOK" },
                "geometry": { "type": "LineString", "coordinates": [[103.9, 1.3], [103.91, 1.31]] }
            }]
        }"#;
        assert!(matches!(
            CarparkRegistry::from_geojson_str(body),
            Err(CarparkError::Conversion { .. })
        ));
    }

    #[test]
    fn rejects_missing_planning_area() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "car_park_no": "X1", "planning_area": null },
                "geometry": { "type": "Point", "coordinates": [103.9, 1.3] }
            }]
        }"#;
        assert!(matches!(
            CarparkRegistry::from_geojson_str(body),
            Err(CarparkError::Conversion { .. })
        ));
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let registry = CarparkRegistry::from_records([
            CarparkRecord {
                id: "A1".to_string(),
                longitude: 1.0,
                latitude: 2.0,
                planning_area: "BEDOK".to_string(),
            },
            CarparkRecord {
                id: "A1".to_string(),
                longitude: 3.0,
                latitude: 4.0,
                planning_area: "TAMPINES".to_string(),
            },
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("A1").unwrap().planning_area, "BEDOK");
    }
}
