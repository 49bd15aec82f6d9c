//! Flattening the recursion tree into the final, ordered cluster list

use crate::types::{ClusterRecord, ClusterTree, NodeStatus};

/// A tree node paired with its hierarchy-path name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedNode {
    /// Arena index
    pub node: usize,
    /// Path name, e.g. `cluster_0_1`
    pub name: String,
}

/// An accepted node with its output-facing record
#[derive(Debug, Clone)]
pub struct FinalCluster {
    /// Arena index of the accepted node
    pub node: usize,
    /// Derived record reported to the host
    pub record: ClusterRecord,
}

/// The full recursion tree plus the flattened result lists
#[derive(Debug, Clone)]
pub struct ClusteringResult {
    /// Complete node arena
    pub tree: ClusterTree,
    /// Accepted clusters in discovery order
    pub clusters_finales: Vec<FinalCluster>,
    /// Non-accepted nodes, named so the artifact writer knows what
    /// `limpiar_intermedios` must remove
    pub intermediates: Vec<NamedNode>,
}

impl ClusteringResult {
    /// Total atom count across accepted clusters
    pub fn total_atoms(&self) -> u64 {
        self.clusters_finales.iter().map(|f| f.record.atoms).sum()
    }

    /// Clone the output records, in discovery order
    pub fn records(&self) -> Vec<ClusterRecord> {
        self.clusters_finales
            .iter()
            .map(|f| f.record.clone())
            .collect()
    }
}

/// Flattens a finished tree into `clusters_finales`.
///
/// Traversal is depth-first, left-to-right over children in label order
/// (labels are centroid-sorted), so discovery order is deterministic.
/// Names encode the path from the root: the root is `cluster_0`, its
/// second child `cluster_0_1`, and so on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator;

impl ResultAggregator {
    /// Consume a tree and produce the flattened result
    pub fn aggregate(tree: ClusterTree) -> ClusteringResult {
        let mut finals = Vec::new();
        let mut intermediates = Vec::new();

        let mut stack: Vec<(usize, String)> = vec![(tree.root(), "cluster_0".to_string())];
        while let Some((id, name)) = stack.pop() {
            let node = tree.node(id);
            match node.status {
                NodeStatus::Accepted => {
                    let reason = node
                        .reason
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "accepted".to_string());
                    finals.push(FinalCluster {
                        node: id,
                        record: ClusterRecord {
                            name,
                            atoms: node.n_atoms() as u64,
                            level: node.level,
                            reason,
                        },
                    });
                }
                _ => {
                    intermediates.push(NamedNode { node: id, name: name.clone() });
                    for (pos, &child) in node.children.iter().enumerate().rev() {
                        stack.push((child, format!("{name}_{pos}")));
                    }
                }
            }
        }

        ClusteringResult {
            tree,
            clusters_finales: finals,
            intermediates,
        }
    }
}
