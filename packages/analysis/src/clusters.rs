//! Pre-computed time-series clusters.
//!
//! Two offline artifacts are combined with the registry here: the label
//! table (`CAR_PARK_NO`, `labels`) and the centroid array, one 36-value
//! profile per cluster (18 weekday hours followed by 18 weekend hours).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use carpark_dashboard_analysis_models::{
    ClusterCount, ClusterId, ClusterProfile, HOURS_PER_PROFILE, LabelledCarpark,
    UNLABELLED_CLUSTER,
};
use carpark_dashboard_carpark::registry::CarparkRegistry;
use carpark_dashboard_carpark_models::Selection;
use serde::Deserialize;

use crate::npy::NpyArray;
use crate::{AnalysisError, profile_points};

#[derive(Debug, Deserialize)]
struct LabelRow {
    #[serde(rename = "CAR_PARK_NO")]
    carpark_id: String,
    #[serde(default)]
    labels: Option<f64>,
}

/// Cluster label per car park number, `None` where the clustering left
/// the car park out.
#[derive(Debug, Clone, Default)]
pub struct ClusterLabels {
    labels: BTreeMap<String, Option<ClusterId>>,
}

impl ClusterLabels {
    /// Reads the label CSV at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the file cannot be read or a row is
    /// malformed.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let file = std::fs::File::open(path)?;
        let labels = Self::from_reader(file)?;
        log::info!("Loaded {} cluster labels from {}", labels.len(), path.display());
        Ok(labels)
    }

    /// Parses label CSV. Extra columns (such as the leading index column)
    /// are ignored; a blank label means "unlabelled".
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if a row is malformed or a label is not a
    /// whole number between 0 and 255.
    pub fn from_reader(reader: impl Read) -> Result<Self, AnalysisError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut labels = BTreeMap::new();
        for row in reader.deserialize::<LabelRow>() {
            let row = row?;
            let label = row.labels.map(to_cluster_id).transpose()?;
            labels.insert(row.carpark_id, label);
        }

        Ok(Self { labels })
    }

    /// Number of labelled rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of one car park, if it has a row.
    #[must_use]
    pub fn get(&self, carpark_id: &str) -> Option<Option<ClusterId>> {
        self.labels.get(carpark_id).copied()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_cluster_id(label: f64) -> Result<ClusterId, AnalysisError> {
    if label.is_finite() && label.fract() == 0.0 && (0.0..=255.0).contains(&label) {
        Ok(label as ClusterId)
    } else {
        Err(AnalysisError::Conversion {
            message: format!("Invalid cluster label {label}"),
        })
    }
}

/// Everything the cluster pages render, built once from the registry, the
/// label table, and the centroid array.
#[derive(Debug, Clone)]
pub struct ClusterSet {
    carparks: Vec<LabelledCarpark>,
    profiles: Vec<ClusterProfile>,
}

impl ClusterSet {
    /// Joins the registry with the labels and splits the first
    /// `cluster_count` centroids into weekday and weekend profiles.
    ///
    /// Car parks without a label row are dropped; rows with a blank label
    /// get [`UNLABELLED_CLUSTER`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Conversion`] if the centroid array has
    /// fewer than `cluster_count` rows or a row is not two 18-hour halves.
    pub fn new(
        registry: &CarparkRegistry,
        labels: &ClusterLabels,
        centroids: &NpyArray,
        cluster_count: usize,
    ) -> Result<Self, AnalysisError> {
        let carparks: Vec<LabelledCarpark> = registry
            .iter()
            .filter_map(|record| {
                let label = labels.get(&record.id)?;
                Some(LabelledCarpark {
                    carpark: record.clone(),
                    cluster: label.unwrap_or(UNLABELLED_CLUSTER),
                })
            })
            .collect();

        if centroids.rows() < cluster_count {
            return Err(AnalysisError::Conversion {
                message: format!(
                    "Centroid array has {} rows, expected at least {cluster_count}",
                    centroids.rows()
                ),
            });
        }

        let profiles = (0..cluster_count)
            .map(|idx| centroid_profile(centroids, idx))
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Built {} cluster profiles for {} labelled car parks",
            profiles.len(),
            carparks.len()
        );

        Ok(Self { carparks, profiles })
    }

    /// Every valid cluster label, ascending.
    #[must_use]
    pub fn cluster_ids(&self) -> Vec<ClusterId> {
        self.profiles.iter().map(|p| p.cluster).collect()
    }

    /// Registry car parks that have a label row.
    #[must_use]
    pub fn carparks(&self) -> &[LabelledCarpark] {
        &self.carparks
    }

    /// Centroid profiles of the selected clusters, ascending.
    #[must_use]
    pub fn profiles(&self, clusters: &Selection<ClusterId>) -> Vec<&ClusterProfile> {
        self.profiles
            .iter()
            .filter(|p| clusters.contains(&p.cluster))
            .collect()
    }

    /// Car parks labelled with `cluster`.
    pub fn members(&self, cluster: ClusterId) -> impl Iterator<Item = &LabelledCarpark> {
        self.carparks.iter().filter(move |c| c.cluster == cluster)
    }

    /// Labelled car parks belonging to any selected valid cluster.
    /// [`Selection::All`] covers every valid cluster, never the
    /// unlabelled sentinel.
    #[must_use]
    pub fn selected(&self, clusters: &Selection<ClusterId>) -> Vec<&LabelledCarpark> {
        let valid = self.selection_ids(clusters);
        self.carparks
            .iter()
            .filter(|c| valid.contains(&c.cluster))
            .collect()
    }

    /// Car park count of each selected valid cluster, ascending.
    #[must_use]
    pub fn counts(&self, clusters: &Selection<ClusterId>) -> Vec<ClusterCount> {
        self.selection_ids(clusters)
            .into_iter()
            .map(|cluster| ClusterCount {
                cluster,
                carparks: self.members(cluster).count(),
            })
            .collect()
    }

    fn selection_ids(&self, clusters: &Selection<ClusterId>) -> Vec<ClusterId> {
        clusters.resolve(&self.cluster_ids())
    }
}

fn centroid_profile(centroids: &NpyArray, idx: usize) -> Result<ClusterProfile, AnalysisError> {
    let row = centroids.row(idx).unwrap_or_default();
    if row.len() != HOURS_PER_PROFILE * 2 {
        return Err(AnalysisError::Conversion {
            message: format!(
                "Centroid {idx} has {} values, expected {}",
                row.len(),
                HOURS_PER_PROFILE * 2
            ),
        });
    }

    let values: Vec<Option<f64>> = row.iter().copied().map(Some).collect();
    let (weekday, weekend) = values.split_at(HOURS_PER_PROFILE);

    Ok(ClusterProfile {
        cluster: ClusterId::try_from(idx).map_err(|_| AnalysisError::Conversion {
            message: format!("Cluster index {idx} does not fit a label"),
        })?,
        weekday: profile_points(weekday),
        weekend: profile_points(weekend),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npy::encode_f8;
    use carpark_dashboard_carpark_models::CarparkRecord;

    const LABELS: &str = "\
,CAR_PARK_NO,labels
0,A1,0
1,A2,0.0
2,B1,1
3,C1,
4,GHOST,2
";

    fn record(id: &str) -> CarparkRecord {
        CarparkRecord {
            id: id.to_string(),
            longitude: 103.8,
            latitude: 1.35,
            planning_area: "BEDOK".to_string(),
        }
    }

    fn centroids(clusters: usize) -> NpyArray {
        let data: Vec<f64> = (0..clusters * 36)
            .map(|i| f64::from(u32::try_from(i).unwrap()) + 0.004)
            .collect();
        NpyArray::from_bytes(&encode_f8(&[clusters, 36, 1], &data)).unwrap()
    }

    fn cluster_set() -> ClusterSet {
        let registry = CarparkRegistry::from_records(
            ["A1", "A2", "B1", "C1", "D1"].into_iter().map(record),
        );
        let labels = ClusterLabels::from_reader(LABELS.as_bytes()).unwrap();
        ClusterSet::new(&registry, &labels, &centroids(3), 3).unwrap()
    }

    fn ids(carparks: &[&LabelledCarpark]) -> Vec<String> {
        carparks.iter().map(|c| c.carpark.id.clone()).collect()
    }

    #[test]
    fn parses_labels_with_index_column() {
        let labels = ClusterLabels::from_reader(LABELS.as_bytes()).unwrap();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels.get("A2"), Some(Some(0)));
        assert_eq!(labels.get("C1"), Some(None));
        assert_eq!(labels.get("D1"), None);
    }

    #[test]
    fn rejects_fractional_labels() {
        let body = "CAR_PARK_NO,labels\nA1,1.5\n";
        assert!(matches!(
            ClusterLabels::from_reader(body.as_bytes()),
            Err(AnalysisError::Conversion { .. })
        ));
    }

    #[test]
    fn join_keeps_registry_car_parks_with_label_rows() {
        let set = cluster_set();
        let joined: Vec<(&str, ClusterId)> = set
            .carparks()
            .iter()
            .map(|c| (c.carpark.id.as_str(), c.cluster))
            .collect();
        assert_eq!(
            joined,
            vec![("A1", 0), ("A2", 0), ("B1", 1), ("C1", UNLABELLED_CLUSTER)]
        );
    }

    #[test]
    fn selecting_cluster_zero_yields_exactly_its_members() {
        let set = cluster_set();
        let selected = set.selected(&Selection::only([0]));
        assert_eq!(ids(&selected), vec!["A1", "A2"]);
    }

    #[test]
    fn selecting_all_yields_every_labelled_row() {
        let set = cluster_set();
        let selected = set.selected(&Selection::All);
        assert_eq!(ids(&selected), vec!["A1", "A2", "B1"]);
        assert_eq!(selected.len(), set.carparks().len() - 1);
    }

    #[test]
    fn counts_cover_selected_clusters() {
        let set = cluster_set();
        let counts: Vec<(ClusterId, usize)> = set
            .counts(&Selection::All)
            .into_iter()
            .map(|c| (c.cluster, c.carparks))
            .collect();
        assert_eq!(counts, vec![(0, 2), (1, 1), (2, 0)]);
        assert!(set.counts(&Selection::none()).is_empty());
        assert_eq!(set.counts(&Selection::only([1, 42])).len(), 1);
    }

    #[test]
    fn centroids_split_into_weekday_and_weekend() {
        let set = cluster_set();
        let profiles = set.profiles(&Selection::only([1]));
        assert_eq!(profiles.len(), 1);

        let profile = profiles[0];
        assert_eq!(profile.weekday.len(), 18);
        assert_eq!(profile.weekend.len(), 18);
        assert_eq!(profile.weekday[0].hour.value(), 6);
        assert_eq!(profile.weekend[17].hour.value(), 23);
        // Row 1 starts at element 36; weekend starts 18 further.
        assert!((profile.weekday[0].availability - 36.0).abs() < 1e-9);
        assert!((profile.weekend[0].availability - 54.0).abs() < 1e-9);
    }

    #[test]
    fn too_few_centroids_is_an_error() {
        let registry = CarparkRegistry::default();
        let labels = ClusterLabels::default();
        assert!(matches!(
            ClusterSet::new(&registry, &labels, &centroids(2), 13),
            Err(AnalysisError::Conversion { .. })
        ));
    }
}
