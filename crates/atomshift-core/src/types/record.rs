//! Output-facing record and response types

use serde::{Deserialize, Serialize};

/// One accepted cluster as reported to the host application.
///
/// Derived read-only from an accepted tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    /// Hierarchy-path name, e.g. `cluster_0_1`
    pub name: String,
    /// Member atom count
    pub atoms: u64,
    /// Depth of the node in the recursion tree
    pub level: u32,
    /// Human-readable termination reason
    pub reason: String,
}

/// Response payload returned to the host over the process boundary.
///
/// A failed invocation reports zero clusters and zero atoms regardless of
/// how far the recursion got: the contract is all-or-nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringResponse {
    /// Whether the invocation completed
    pub success: bool,
    /// Human-readable status or diagnostic message
    pub message: String,
    /// Number of accepted clusters
    pub clusters_found: u64,
    /// Total atom count across accepted clusters
    pub total_atoms: u64,
    /// Accepted clusters in discovery order
    pub clusters_info: Vec<ClusterRecord>,
}

impl ClusteringResponse {
    /// Build a success response from the final records
    pub fn success(records: Vec<ClusterRecord>) -> Self {
        let total_atoms = records.iter().map(|r| r.atoms).sum();
        Self {
            success: true,
            message: format!(
                "clustering completed: {} clusters, {} atoms",
                records.len(),
                total_atoms
            ),
            clusters_found: records.len() as u64,
            total_atoms,
            clusters_info: records,
        }
    }

    /// Build a failure response carrying a diagnostic message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            clusters_found: 0,
            total_atoms: 0,
            clusters_info: Vec::new(),
        }
    }
}
