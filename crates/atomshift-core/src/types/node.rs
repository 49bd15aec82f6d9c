//! Recursion tree nodes and the arena that owns them

use serde::Serialize;
use std::fmt;

/// Lifecycle state of a cluster node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    /// Awaiting a decision
    Pending,
    /// Terminal: part of the final result
    Accepted,
    /// Split into child nodes
    Recursed,
    /// Terminal: discarded (degenerate sub-cluster)
    Rejected,
}

/// Why a node reached a terminal accepted state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Too small to usefully subdivide
    MinAtomsReached,
    /// Depth budget exhausted before the quality gates were met
    MaxIterationsReached,
    /// Mode seeking collapsed to a single mode
    NoFurtherSeparation,
    /// Passed the silhouette, Davies-Bouldin and dispersion gates
    QualityMet,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MinAtomsReached => "minimum atom count reached",
            Self::MaxIterationsReached => "maximum iterations reached",
            Self::NoFurtherSeparation => "no further separation found",
            Self::QualityMet => "quality thresholds met",
        };
        f.write_str(text)
    }
}

/// Quality scores computed for a node when its parent was partitioned.
///
/// The root never goes through a partition evaluation, so all of its
/// scores stay unset.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeScores {
    /// Mean silhouette of the node's members within the parent partition
    pub silhouette: Option<f64>,
    /// Davies-Bouldin component of the node within the parent partition
    pub davies_bouldin: Option<f64>,
    /// Mean member distance to the node centroid
    pub dispersion: Option<f64>,
}

/// One node of the recursion tree.
///
/// Nodes reference their parent and children by arena index; the point
/// indices refer to rows of the invocation's `PointSet`.
#[derive(Debug, Clone)]
pub struct ClusterNode {
    /// Arena index of this node
    pub id: usize,
    /// Depth from the root, starting at 0
    pub level: u32,
    /// Arena index of the parent, None for the root
    pub parent: Option<usize>,
    /// Point indices owned by this node
    pub indices: Vec<usize>,
    /// Arithmetic centroid of the owned points
    pub centroid: Vec<f64>,
    /// Lifecycle state
    pub status: NodeStatus,
    /// Set exactly once, when the node is accepted
    pub reason: Option<TerminationReason>,
    /// Scores from the parent partition evaluation
    pub scores: NodeScores,
    /// Arena indices of child nodes, in label (centroid-sorted) order
    pub children: Vec<usize>,
}

impl ClusterNode {
    /// Number of member atoms
    pub fn n_atoms(&self) -> usize {
        self.indices.len()
    }
}

/// Arena of recursion-tree nodes addressed by index.
///
/// Parent/child relations are index references, so sibling subtrees stay
/// independent views over disjoint point-index slices.
#[derive(Debug, Clone)]
pub struct ClusterTree {
    nodes: Vec<ClusterNode>,
}

impl ClusterTree {
    /// Create a tree holding only the pending root node
    pub fn with_root(indices: Vec<usize>, centroid: Vec<f64>) -> Self {
        let root = ClusterNode {
            id: 0,
            level: 0,
            parent: None,
            indices,
            centroid,
            status: NodeStatus::Pending,
            reason: None,
            scores: NodeScores::default(),
            children: Vec::new(),
        };
        Self { nodes: vec![root] }
    }

    /// Arena index of the root
    pub fn root(&self) -> usize {
        0
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty (never true: a tree always has a root)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node
    pub fn node(&self, id: usize) -> &ClusterNode {
        &self.nodes[id]
    }

    /// Iterate over all nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter()
    }

    /// Append a pending child under `parent`, returning its arena index
    pub fn push_child(
        &mut self,
        parent: usize,
        indices: Vec<usize>,
        centroid: Vec<f64>,
        scores: NodeScores,
    ) -> usize {
        let id = self.nodes.len();
        let level = self.nodes[parent].level + 1;
        self.nodes.push(ClusterNode {
            id,
            level,
            parent: Some(parent),
            indices,
            centroid,
            status: NodeStatus::Pending,
            reason: None,
            scores,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Transition a pending node to accepted with the given reason
    pub fn accept(&mut self, id: usize, reason: TerminationReason) {
        let node = &mut self.nodes[id];
        debug_assert_eq!(node.status, NodeStatus::Pending);
        node.status = NodeStatus::Accepted;
        node.reason = Some(reason);
    }

    /// Transition a pending node to recursed
    pub fn mark_recursed(&mut self, id: usize) {
        let node = &mut self.nodes[id];
        debug_assert_eq!(node.status, NodeStatus::Pending);
        node.status = NodeStatus::Recursed;
    }

    /// Transition a pending node to rejected
    pub fn reject(&mut self, id: usize) {
        let node = &mut self.nodes[id];
        debug_assert_eq!(node.status, NodeStatus::Pending);
        node.status = NodeStatus::Rejected;
    }
}
