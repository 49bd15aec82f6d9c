//! Intra-cluster dispersion gate

use ndarray::{ArrayView1, ArrayView2};

use crate::types::euclidean;

/// Compares intra-cluster spread against an optional threshold.
///
/// Unconfigured, the filter is a no-op and every cluster passes.
#[derive(Debug, Clone, Copy)]
pub struct DispersionFilter {
    threshold: Option<f64>,
}

impl DispersionFilter {
    /// Create a filter; `None` disables gating
    pub fn new(threshold: Option<f64>) -> Self {
        Self { threshold }
    }

    /// Mean member distance to the centroid
    pub fn dispersion(coords: ArrayView2<'_, f64>, centroid: ArrayView1<'_, f64>) -> f64 {
        let n = coords.nrows();
        if n == 0 {
            return 0.0;
        }
        let total: f64 = (0..n).map(|r| euclidean(coords.row(r), centroid)).sum();
        total / n as f64
    }

    /// Whether the given dispersion passes the configured threshold
    pub fn passes(&self, dispersion: f64) -> bool {
        match self.threshold {
            Some(t) => dispersion <= t,
            None => true,
        }
    }
}
