//! Mode-seeking bandwidth estimation from the nearest-neighbour distance
//! distribution

use ndarray::ArrayView2;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::types::euclidean;

/// Floor applied when every sampled neighbour distance is zero (all points
/// coincident). Keeps the mode-seeking step well-defined: it collapses to a
/// single mode instead of failing the invocation.
const MIN_BANDWIDTH: f64 = 1e-9;

/// Derives a mode-seeking radius from a point set and a quantile in (0, 1].
///
/// The bandwidth is the mean, over all points, of the distance to the k-th
/// nearest neighbour, with `k = floor(n * quantile)` clamped to `[1, n-1]`.
/// Increasing the quantile increases k, so the estimate is monotonic in the
/// quantile.
#[derive(Debug, Clone, Copy)]
pub struct BandwidthEstimator {
    quantile: f64,
}

impl BandwidthEstimator {
    /// Create an estimator for the given quantile
    pub fn new(quantile: f64) -> Result<Self> {
        if !(quantile > 0.0 && quantile <= 1.0) {
            return Err(Error::invalid_parameter(format!(
                "quantile must be in (0, 1], got {quantile}"
            )));
        }
        Ok(Self { quantile })
    }

    /// Estimate the bandwidth for a coordinate matrix with at least 2 rows
    pub fn estimate(&self, coords: ArrayView2<'_, f64>) -> Result<f64> {
        let n = coords.nrows();
        if n < 2 {
            return Err(Error::InsufficientData { needed: 2, got: n });
        }
        let k = ((n as f64 * self.quantile).floor() as usize).clamp(1, n - 1);

        // Collected in index order: a parallel float reduction would not
        // be bit-deterministic across runs
        let knn: Vec<f64> = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut dists: Vec<f64> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| euclidean(coords.row(i), coords.row(j)))
                    .collect();
                // k-th smallest neighbour distance, 1-based
                dists.select_nth_unstable_by(k - 1, |a, b| a.total_cmp(b));
                dists[k - 1]
            })
            .collect();

        let bandwidth = knn.iter().sum::<f64>() / n as f64;
        if bandwidth <= 0.0 {
            tracing::warn!(
                n,
                "all sampled neighbour distances are zero, flooring bandwidth"
            );
            return Ok(MIN_BANDWIDTH);
        }
        Ok(bandwidth)
    }
}
