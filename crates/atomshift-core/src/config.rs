//! Request configuration for a clustering invocation

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Parameters for one clustering invocation.
///
/// This is the validated form of the request payload the host application
/// sends over the process boundary. Field names match the wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringParams {
    /// Path to the atom dump to cluster
    pub input_file: PathBuf,
    /// Writable directory for per-cluster artifacts
    pub output_dir: PathBuf,
    /// Clusters smaller than this are accepted without further subdivision
    pub min_atoms: usize,
    /// Hard depth cap for the recursion (levels run 0..max_iterations)
    pub max_iterations: u32,
    /// Upper bound on sub-clusters produced at one recursion step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_clusters_per_level: Option<usize>,
    /// Minimum per-cluster silhouette for quality acceptance, in [-1, 1]
    pub silhouette_threshold: f64,
    /// Maximum per-cluster Davies-Bouldin component for quality acceptance
    pub davies_bouldin_threshold: f64,
    /// Maximum mean member distance to centroid; absent disables the filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispersion_threshold: Option<f64>,
    /// Quantile of the nearest-neighbour distance distribution used for
    /// bandwidth estimation, in (0, 1]
    pub quantile: f64,
    /// Remove intermediate (non-final) artifacts once the run completes
    #[serde(default = "default_limpiar")]
    pub limpiar_intermedios: bool,
    /// Optional wall-clock budget for the whole invocation, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runtime_secs: Option<u64>,
}

fn default_limpiar() -> bool {
    true
}

impl ClusteringParams {
    /// Validate field constraints before the engine runs.
    ///
    /// Path existence is deliberately not checked here: the dump parser
    /// reports unreadable input with its own diagnostic.
    pub fn validate(&self) -> Result<()> {
        if self.min_atoms < 1 {
            return Err(Error::invalid_parameter("min_atoms must be >= 1"));
        }
        if self.max_iterations < 1 {
            return Err(Error::invalid_parameter("max_iterations must be >= 1"));
        }
        if let Some(n) = self.n_clusters_per_level {
            if n < 1 {
                return Err(Error::invalid_parameter(
                    "n_clusters_per_level must be >= 1 when present",
                ));
            }
        }
        if !(-1.0..=1.0).contains(&self.silhouette_threshold) {
            return Err(Error::invalid_parameter(format!(
                "silhouette_threshold must be in [-1, 1], got {}",
                self.silhouette_threshold
            )));
        }
        if !self.davies_bouldin_threshold.is_finite() || self.davies_bouldin_threshold < 0.0 {
            return Err(Error::invalid_parameter(format!(
                "davies_bouldin_threshold must be >= 0, got {}",
                self.davies_bouldin_threshold
            )));
        }
        if let Some(d) = self.dispersion_threshold {
            if !d.is_finite() || d < 0.0 {
                return Err(Error::invalid_parameter(format!(
                    "dispersion_threshold must be >= 0 when present, got {d}"
                )));
            }
        }
        if !(self.quantile > 0.0 && self.quantile <= 1.0) {
            return Err(Error::invalid_parameter(format!(
                "quantile must be in (0, 1], got {}",
                self.quantile
            )));
        }
        if let Some(secs) = self.max_runtime_secs {
            if secs < 1 {
                return Err(Error::invalid_parameter(
                    "max_runtime_secs must be >= 1 when present",
                ));
            }
        }
        Ok(())
    }
}
