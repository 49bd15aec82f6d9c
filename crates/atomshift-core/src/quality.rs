//! Partition quality scoring: silhouette and Davies-Bouldin

use ndarray::ArrayView2;
use rayon::prelude::*;

use crate::meanshift::Partition;
use crate::types::euclidean;

/// Acceptance thresholds for the quality gate
#[derive(Debug, Clone, Copy)]
pub struct QualityThresholds {
    /// Minimum per-cluster mean silhouette, in [-1, 1]
    pub silhouette: f64,
    /// Maximum per-cluster Davies-Bouldin component
    pub davies_bouldin: f64,
}

/// Scores for one cluster of a partition.
///
/// Both scores are None when the partition has fewer than two clusters;
/// separation metrics are not applicable there.
#[derive(Debug, Clone, Copy)]
pub struct ClusterQuality {
    /// Mean silhouette over the cluster's members
    pub silhouette: Option<f64>,
    /// Davies-Bouldin component: worst compactness-to-separation ratio
    /// against any other cluster
    pub davies_bouldin: Option<f64>,
}

impl ClusterQuality {
    /// Whether this cluster passes the quality gate
    pub fn passes(&self, thresholds: &QualityThresholds) -> bool {
        let sil_ok = self
            .silhouette
            .map_or(false, |s| s >= thresholds.silhouette);
        let db_ok = self
            .davies_bouldin
            .map_or(false, |r| r <= thresholds.davies_bouldin);
        sil_ok && db_ok
    }
}

/// Quality of a whole partition plus its per-cluster breakdown
#[derive(Debug, Clone)]
pub struct PartitionQuality {
    /// Mean silhouette over all points, in [-1, 1]
    pub silhouette_mean: Option<f64>,
    /// Davies-Bouldin index: mean of the per-cluster components
    pub davies_bouldin_index: Option<f64>,
    /// Per-cluster scores, indexed by label
    pub clusters: Vec<ClusterQuality>,
}

/// Scores partitions produced by the mode-seeking step
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityEvaluator;

impl QualityEvaluator {
    /// Evaluate a partition over its coordinate matrix.
    ///
    /// Partitions with fewer than two clusters get the not-applicable
    /// sentinel on every score.
    pub fn evaluate(&self, coords: ArrayView2<'_, f64>, partition: &Partition) -> PartitionQuality {
        let k = partition.n_clusters();
        if k < 2 {
            return PartitionQuality {
                silhouette_mean: None,
                davies_bouldin_index: None,
                clusters: vec![
                    ClusterQuality {
                        silhouette: None,
                        davies_bouldin: None,
                    };
                    k
                ],
            };
        }

        let per_point = silhouette_samples(coords, partition);
        let db_components = davies_bouldin_components(coords, partition);

        let mut sil_sum = vec![0.0f64; k];
        for (row, &s) in per_point.iter().enumerate() {
            sil_sum[partition.labels[row]] += s;
        }
        let clusters: Vec<ClusterQuality> = (0..k)
            .map(|l| ClusterQuality {
                silhouette: Some(sil_sum[l] / partition.sizes[l] as f64),
                davies_bouldin: Some(db_components[l]),
            })
            .collect();

        let silhouette_mean = per_point.iter().sum::<f64>() / per_point.len() as f64;
        let davies_bouldin_index = db_components.iter().sum::<f64>() / k as f64;

        PartitionQuality {
            silhouette_mean: Some(silhouette_mean),
            davies_bouldin_index: Some(davies_bouldin_index),
            clusters,
        }
    }
}

/// Per-point silhouette values.
///
/// Points in singleton clusters score 0 by convention.
fn silhouette_samples(coords: ArrayView2<'_, f64>, partition: &Partition) -> Vec<f64> {
    let k = partition.n_clusters();
    (0..coords.nrows())
        .into_par_iter()
        .map(|row| {
            let own = partition.labels[row];
            if partition.sizes[own] <= 1 {
                return 0.0;
            }

            // Mean distance from this point to every cluster
            let mut dist_sum = vec![0.0f64; k];
            for other in 0..coords.nrows() {
                if other == row {
                    continue;
                }
                dist_sum[partition.labels[other]] +=
                    euclidean(coords.row(row), coords.row(other));
            }

            let a = dist_sum[own] / (partition.sizes[own] - 1) as f64;
            let b = (0..k)
                .filter(|&l| l != own)
                .map(|l| dist_sum[l] / partition.sizes[l] as f64)
                .fold(f64::INFINITY, f64::min);

            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .collect()
}

/// Per-cluster Davies-Bouldin components `R_i = max_j (S_i + S_j) / M_ij`.
///
/// Coincident centroids yield an infinite component, which can never pass
/// the gate.
fn davies_bouldin_components(coords: ArrayView2<'_, f64>, partition: &Partition) -> Vec<f64> {
    let k = partition.n_clusters();

    // S_i: mean member distance to the cluster centroid
    let mut scatter = vec![0.0f64; k];
    for row in 0..coords.nrows() {
        let l = partition.labels[row];
        scatter[l] += euclidean(coords.row(row), partition.centroids[l].view());
    }
    for (l, s) in scatter.iter_mut().enumerate() {
        *s /= partition.sizes[l] as f64;
    }

    (0..k)
        .map(|i| {
            (0..k)
                .filter(|&j| j != i)
                .map(|j| {
                    let separation =
                        euclidean(partition.centroids[i].view(), partition.centroids[j].view());
                    if separation > 0.0 {
                        (scatter[i] + scatter[j]) / separation
                    } else {
                        f64::INFINITY
                    }
                })
                .fold(0.0f64, f64::max)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meanshift::{MeanShiftOptions, ModeSeekingClusterer};
    use ndarray::Array2;

    fn blobs(spacing: f64) -> Array2<f64> {
        let mut rows: Vec<[f64; 2]> = Vec::new();
        for i in 0..5 {
            rows.push([i as f64 * 0.2, 0.0]);
        }
        for i in 0..5 {
            rows.push([spacing + i as f64 * 0.2, 0.0]);
        }
        let mut coords = Array2::zeros((rows.len(), 2));
        for (r, row) in rows.iter().enumerate() {
            coords[(r, 0)] = row[0];
            coords[(r, 1)] = row[1];
        }
        coords
    }

    fn partition_of(coords: &Array2<f64>, bandwidth: f64) -> Partition {
        ModeSeekingClusterer::new(bandwidth, MeanShiftOptions::default())
            .unwrap()
            .cluster(coords.view())
            .unwrap()
    }

    #[test]
    fn well_separated_blobs_score_high() {
        let coords = blobs(100.0);
        let partition = partition_of(&coords, 2.0);
        assert_eq!(partition.n_clusters(), 2);

        let q = QualityEvaluator.evaluate(coords.view(), &partition);
        let sil = q.silhouette_mean.unwrap();
        let db = q.davies_bouldin_index.unwrap();
        assert!(sil > 0.9, "silhouette {sil}");
        assert!(db < 0.1, "davies-bouldin {db}");
        for c in &q.clusters {
            assert!(c.passes(&QualityThresholds {
                silhouette: 0.5,
                davies_bouldin: 1.0,
            }));
        }
    }

    #[test]
    fn close_blobs_score_worse_than_far_blobs() {
        let far = blobs(100.0);
        let near = blobs(2.0);
        let q_far = QualityEvaluator.evaluate(far.view(), &partition_of(&far, 2.0));

        // Force the same 5/5 split on the near layout for comparison
        let partition_near = Partition {
            labels: vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1],
            centroids: half_centroids(&near),
            sizes: vec![5, 5],
        };
        let q_near = QualityEvaluator.evaluate(near.view(), &partition_near);

        assert!(q_far.silhouette_mean.unwrap() > q_near.silhouette_mean.unwrap());
        assert!(q_far.davies_bouldin_index.unwrap() < q_near.davies_bouldin_index.unwrap());
    }

    fn half_centroids(coords: &Array2<f64>) -> Vec<ndarray::Array1<f64>> {
        let first = coords.slice(ndarray::s![..5, ..]);
        let second = coords.slice(ndarray::s![5.., ..]);
        vec![
            first.mean_axis(ndarray::Axis(0)).unwrap(),
            second.mean_axis(ndarray::Axis(0)).unwrap(),
        ]
    }

    #[test]
    fn single_cluster_is_not_applicable() {
        let coords = blobs(1.0);
        let partition = partition_of(&coords, 500.0);
        assert_eq!(partition.n_clusters(), 1);

        let q = QualityEvaluator.evaluate(coords.view(), &partition);
        assert!(q.silhouette_mean.is_none());
        assert!(q.davies_bouldin_index.is_none());
        assert!(!q.clusters[0].passes(&QualityThresholds {
            silhouette: -1.0,
            davies_bouldin: f64::MAX,
        }));
    }

    #[test]
    fn singleton_cluster_members_score_zero_silhouette() {
        let mut coords = Array2::zeros((3, 2));
        coords[(0, 0)] = 0.0;
        coords[(1, 0)] = 0.3;
        coords[(2, 0)] = 10.0;
        let partition = Partition {
            labels: vec![0, 0, 1],
            centroids: vec![
                ndarray::array![0.15, 0.0],
                ndarray::array![10.0, 0.0],
            ],
            sizes: vec![2, 1],
        };
        let samples = silhouette_samples(coords.view(), &partition);
        assert_eq!(samples[2], 0.0);
        assert!(samples[0] > 0.0);
    }
}
