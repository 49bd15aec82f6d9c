//! Flat-kernel mean-shift clustering with deterministic labeling

use ndarray::{Array1, ArrayView2};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::types::{centroid, euclidean};

/// Tuning knobs for the mode-seeking step
#[derive(Debug, Clone, Copy)]
pub struct MeanShiftOptions {
    /// Convergence tolerance as a fraction of the bandwidth
    pub tolerance: f64,
    /// Cap on shift iterations per seed
    pub max_shift_iterations: usize,
    /// Above this size, seeds are a deterministic strided subsample
    pub seed_cap: usize,
}

impl Default for MeanShiftOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_shift_iterations: 300,
            seed_cap: 1024,
        }
    }
}

/// A partition of a coordinate matrix: one label per row plus one centroid
/// per label.
///
/// Labels are dense (`0..n_clusters`) and assigned in centroid-sorted
/// order, so identical input always produces identical labelings.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Cluster label per coordinate row
    pub labels: Vec<usize>,
    /// Arithmetic centroid of each cluster's members
    pub centroids: Vec<Array1<f64>>,
    /// Member count of each cluster
    pub sizes: Vec<usize>,
}

impl Partition {
    /// Number of clusters
    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Row positions belonging to one label, in row order
    pub fn members_of(&self, label: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == label)
            .map(|(row, _)| row)
            .collect()
    }
}

/// Mean-shift clusterer at a fixed bandwidth.
///
/// Seeds are shifted toward the mean of in-bandwidth neighbours until the
/// shift magnitude falls below `tolerance * bandwidth`; converged seeds
/// within half a bandwidth of each other merge into one mode, and every
/// point is then assigned to its nearest mode.
#[derive(Debug, Clone)]
pub struct ModeSeekingClusterer {
    bandwidth: f64,
    options: MeanShiftOptions,
}

impl ModeSeekingClusterer {
    /// Create a clusterer for the given bandwidth
    pub fn new(bandwidth: f64, options: MeanShiftOptions) -> Result<Self> {
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return Err(Error::numeric(format!(
                "bandwidth must be positive and finite, got {bandwidth}"
            )));
        }
        Ok(Self { bandwidth, options })
    }

    /// Partition a coordinate matrix.
    ///
    /// A single-mode outcome is valid and signals "no further separation"
    /// to the caller; it is not an error.
    pub fn cluster(&self, coords: ArrayView2<'_, f64>) -> Result<Partition> {
        let n = coords.nrows();
        if n == 0 {
            return Err(Error::InsufficientData { needed: 1, got: 0 });
        }
        if n == 1 {
            return Ok(Partition {
                labels: vec![0],
                centroids: vec![coords.row(0).to_owned()],
                sizes: vec![1],
            });
        }

        let seeds = self.seed_rows(n);
        let converged: Vec<(Array1<f64>, usize)> = seeds
            .par_iter()
            .map(|&row| self.converge_seed(coords, row))
            .collect();

        let modes = self.merge_modes(converged);
        debug_assert!(!modes.is_empty());

        // Total assignment: every row joins its nearest mode, ties going to
        // the lowest mode index.
        let assignment: Vec<usize> = (0..n)
            .into_par_iter()
            .map(|row| {
                let mut best = 0usize;
                let mut best_dist = f64::INFINITY;
                for (m, mode) in modes.iter().enumerate() {
                    let d = euclidean(coords.row(row), mode.view());
                    if d < best_dist {
                        best_dist = d;
                        best = m;
                    }
                }
                best
            })
            .collect();

        Ok(build_partition(coords, &assignment, modes.len()))
    }

    /// Reduce a partition to at most `max_clusters` clusters by repeatedly
    /// merging the smallest cluster into the cluster with the nearest
    /// centroid (smallest-first, ties by label order), then relabeling.
    pub fn cap_clusters(
        &self,
        partition: Partition,
        coords: ArrayView2<'_, f64>,
        max_clusters: usize,
    ) -> Partition {
        if partition.n_clusters() <= max_clusters || max_clusters == 0 {
            return partition;
        }

        let mut groups: Vec<Vec<usize>> = (0..partition.n_clusters())
            .map(|l| partition.members_of(l))
            .collect();
        let mut centroids = partition.centroids;

        while groups.len() > max_clusters {
            let Some(smallest) = groups
                .iter()
                .enumerate()
                .min_by_key(|(label, members)| (members.len(), *label))
                .map(|(label, _)| label)
            else {
                break;
            };

            let mut target = None;
            let mut target_dist = f64::INFINITY;
            for (label, c) in centroids.iter().enumerate() {
                if label == smallest {
                    continue;
                }
                let d = euclidean(centroids[smallest].view(), c.view());
                if d < target_dist {
                    target_dist = d;
                    target = Some(label);
                }
            }
            let Some(target) = target else { break };

            let absorbed = std::mem::take(&mut groups[smallest]);
            groups[target].extend(absorbed);
            groups[target].sort_unstable();
            centroids[target] = centroid(subset(coords, &groups[target]).view());
            groups.remove(smallest);
            centroids.remove(smallest);
        }

        let mut assignment = vec![0usize; coords.nrows()];
        for (label, members) in groups.iter().enumerate() {
            for &row in members {
                assignment[row] = label;
            }
        }
        build_partition(coords, &assignment, groups.len())
    }

    /// Deterministic seed selection: all rows, or a strided subsample for
    /// large sets
    fn seed_rows(&self, n: usize) -> Vec<usize> {
        if n <= self.options.seed_cap {
            (0..n).collect()
        } else {
            let stride = n.div_ceil(self.options.seed_cap);
            (0..n).step_by(stride).collect()
        }
    }

    /// Shift one seed until convergence, returning the final position and
    /// its in-bandwidth population
    fn converge_seed(&self, coords: ArrayView2<'_, f64>, row: usize) -> (Array1<f64>, usize) {
        let mut pos = coords.row(row).to_owned();
        let stop = self.options.tolerance * self.bandwidth;
        let mut population = 1usize;

        for _ in 0..self.options.max_shift_iterations {
            let mut sum = Array1::<f64>::zeros(coords.ncols());
            let mut count = 0usize;
            for r in 0..coords.nrows() {
                if euclidean(pos.view(), coords.row(r)) <= self.bandwidth {
                    sum += &coords.row(r);
                    count += 1;
                }
            }
            if count == 0 {
                break;
            }
            population = count;
            let next = sum / count as f64;
            let shift = euclidean(pos.view(), next.view());
            pos = next;
            if shift < stop {
                break;
            }
        }
        (pos, population)
    }

    /// Merge converged seeds within half a bandwidth into one mode.
    ///
    /// Candidates are visited by descending population (ties broken by
    /// coordinate order) and greedily suppressed, so the dominant mode of
    /// each basin survives.
    fn merge_modes(&self, mut converged: Vec<(Array1<f64>, usize)>) -> Vec<Array1<f64>> {
        converged.sort_by(|(pa, na), (pb, nb)| {
            nb.cmp(na).then_with(|| lex_cmp(pa, pb))
        });

        let merge_radius = self.bandwidth / 2.0;
        let mut modes: Vec<Array1<f64>> = Vec::new();
        for (pos, _) in converged {
            let distinct = modes
                .iter()
                .all(|m| euclidean(pos.view(), m.view()) > merge_radius);
            if distinct {
                modes.push(pos);
            }
        }
        modes
    }
}

/// Rebuild a dense, centroid-sorted partition from a raw assignment
fn build_partition(
    coords: ArrayView2<'_, f64>,
    assignment: &[usize],
    n_raw_labels: usize,
) -> Partition {
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); n_raw_labels];
    for (row, &label) in assignment.iter().enumerate() {
        groups[label].push(row);
    }
    groups.retain(|members| !members.is_empty());

    let mut clusters: Vec<(Array1<f64>, Vec<usize>)> = groups
        .into_iter()
        .map(|members| {
            let c = centroid(subset(coords, &members).view());
            (c, members)
        })
        .collect();
    clusters.sort_by(|(ca, _), (cb, _)| lex_cmp(ca, cb));

    let mut labels = vec![0usize; coords.nrows()];
    let mut centroids = Vec::with_capacity(clusters.len());
    let mut sizes = Vec::with_capacity(clusters.len());
    for (label, (c, members)) in clusters.into_iter().enumerate() {
        for row in &members {
            labels[*row] = label;
        }
        sizes.push(members.len());
        centroids.push(c);
    }

    Partition {
        labels,
        centroids,
        sizes,
    }
}

/// Copy a subset of rows into a dense matrix
fn subset(coords: ArrayView2<'_, f64>, rows: &[usize]) -> ndarray::Array2<f64> {
    let mut sub = ndarray::Array2::zeros((rows.len(), coords.ncols()));
    for (i, &row) in rows.iter().enumerate() {
        sub.row_mut(i).assign(&coords.row(row));
    }
    sub
}

/// Lexicographic coordinate comparison used for label ordering
fn lex_cmp(a: &Array1<f64>, b: &Array1<f64>) -> std::cmp::Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.total_cmp(y) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}
