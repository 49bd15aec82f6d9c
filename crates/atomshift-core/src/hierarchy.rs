//! Recursive accept/recurse decision logic over the cluster tree

use std::time::{Duration, Instant};

use crate::aggregate::{ClusteringResult, ResultAggregator};
use crate::bandwidth::BandwidthEstimator;
use crate::config::ClusteringParams;
use crate::dispersion::DispersionFilter;
use crate::error::{Error, Result};
use crate::meanshift::{MeanShiftOptions, ModeSeekingClusterer};
use crate::quality::{QualityEvaluator, QualityThresholds};
use crate::types::{centroid, ClusterTree, NodeScores, PointSet, TerminationReason};

/// Per-invocation gates shared across node expansions
struct Gates {
    estimator: BandwidthEstimator,
    evaluator: QualityEvaluator,
    dispersion_filter: DispersionFilter,
    thresholds: QualityThresholds,
}

/// Orchestrates the hierarchical clustering recursion.
///
/// Nodes live in an index-addressed arena; each pending node is either
/// accepted with a termination reason or split into children that own
/// disjoint, non-empty subsets of its points. Children always shrink, so
/// the recursion makes monotonic progress toward the `min_atoms` base
/// case, and the depth budget caps every accepted level at
/// `max_iterations - 1`.
#[derive(Debug, Clone)]
pub struct HierarchyController {
    params: ClusteringParams,
    options: MeanShiftOptions,
}

impl HierarchyController {
    /// Create a controller from validated parameters
    pub fn new(params: ClusteringParams) -> Result<Self> {
        Self::with_options(params, MeanShiftOptions::default())
    }

    /// Create a controller with explicit mode-seeking options
    pub fn with_options(params: ClusteringParams, options: MeanShiftOptions) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, options })
    }

    /// Run the full recursion over a point set and flatten the result
    pub fn run(&self, points: &PointSet) -> Result<ClusteringResult> {
        let started = Instant::now();
        let budget = self.params.max_runtime_secs.map(Duration::from_secs);

        let gates = Gates {
            estimator: BandwidthEstimator::new(self.params.quantile)?,
            evaluator: QualityEvaluator,
            dispersion_filter: DispersionFilter::new(self.params.dispersion_threshold),
            thresholds: QualityThresholds {
                silhouette: self.params.silhouette_threshold,
                davies_bouldin: self.params.davies_bouldin_threshold,
            },
        };

        let all_indices: Vec<usize> = (0..points.len()).collect();
        let root_centroid = centroid(points.coords()).to_vec();
        let mut tree = ClusterTree::with_root(all_indices, root_centroid);

        tracing::info!(
            atoms = points.len(),
            min_atoms = self.params.min_atoms,
            max_iterations = self.params.max_iterations,
            "starting hierarchical clustering"
        );

        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            if let Some(limit) = budget {
                if started.elapsed() > limit {
                    return Err(Error::BudgetExceeded(limit.as_secs()));
                }
            }
            self.expand(points, &mut tree, id, &gates, &mut stack)?;
        }

        let result = ResultAggregator::aggregate(tree);
        tracing::info!(
            clusters = result.clusters_finales.len(),
            atoms = result.total_atoms(),
            nodes = result.tree.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "clustering finished"
        );
        Ok(result)
    }

    /// Decide the fate of one pending node, pushing any new pending
    /// children onto the work stack
    fn expand(
        &self,
        points: &PointSet,
        tree: &mut ClusterTree,
        id: usize,
        gates: &Gates,
        stack: &mut Vec<usize>,
    ) -> Result<()> {
        let (level, n_atoms) = {
            let node = tree.node(id);
            (node.level, node.n_atoms())
        };

        if n_atoms < self.params.min_atoms {
            tracing::debug!(node = id, level, n_atoms, "accepting: below min_atoms");
            tree.accept(id, TerminationReason::MinAtomsReached);
            return Ok(());
        }
        if n_atoms < 2 {
            // A lone atom cannot separate further even with min_atoms = 1
            tree.accept(id, TerminationReason::NoFurtherSeparation);
            return Ok(());
        }
        if level + 1 >= self.params.max_iterations {
            tracing::debug!(node = id, level, n_atoms, "accepting: depth budget exhausted");
            tree.accept(id, TerminationReason::MaxIterationsReached);
            return Ok(());
        }

        let parent_indices = tree.node(id).indices.clone();
        let coords = points.gather(&parent_indices);

        let bandwidth = gates.estimator.estimate(coords.view())?;
        let clusterer = ModeSeekingClusterer::new(bandwidth, self.options)?;
        let mut partition = clusterer.cluster(coords.view())?;
        if let Some(cap) = self.params.n_clusters_per_level {
            partition = clusterer.cap_clusters(partition, coords.view(), cap);
        }

        if partition.n_clusters() == 1 {
            tracing::debug!(node = id, level, n_atoms, bandwidth, "accepting: single mode");
            tree.accept(id, TerminationReason::NoFurtherSeparation);
            return Ok(());
        }

        tracing::debug!(
            node = id,
            level,
            n_atoms,
            bandwidth,
            sub_clusters = partition.n_clusters(),
            "recursing"
        );

        let quality = gates.evaluator.evaluate(coords.view(), &partition);
        tree.mark_recursed(id);

        for label in 0..partition.n_clusters() {
            // Partitions only carry non-empty labels, so every child owns a
            // strict, non-empty subset of the parent's points
            let members = partition.members_of(label);
            let global: Vec<usize> = members.iter().map(|&row| parent_indices[row]).collect();

            let child_coords = gather_rows(&coords, &members);
            let cluster_centroid = &partition.centroids[label];
            let dispersion =
                DispersionFilter::dispersion(child_coords.view(), cluster_centroid.view());
            let scores = NodeScores {
                silhouette: quality.clusters[label].silhouette,
                davies_bouldin: quality.clusters[label].davies_bouldin,
                dispersion: Some(dispersion),
            };

            let child = tree.push_child(id, global, cluster_centroid.to_vec(), scores);
            let passes = quality.clusters[label].passes(&gates.thresholds)
                && gates.dispersion_filter.passes(dispersion);
            if passes {
                tracing::debug!(node = child, label, "accepting child: quality gates met");
                tree.accept(child, TerminationReason::QualityMet);
            } else {
                stack.push(child);
            }
        }
        Ok(())
    }
}

/// Copy a subset of local rows into a dense matrix
fn gather_rows(coords: &ndarray::Array2<f64>, rows: &[usize]) -> ndarray::Array2<f64> {
    let mut sub = ndarray::Array2::zeros((rows.len(), coords.ncols()));
    for (i, &row) in rows.iter().enumerate() {
        sub.row_mut(i).assign(&coords.row(row));
    }
    sub
}
