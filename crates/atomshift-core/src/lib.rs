//! atomshift-core: hierarchical quality-gated mean-shift clustering for
//! atom dumps
//!
//! The engine recursively partitions a point set of atomic positions with
//! mean-shift clustering, gates each candidate partition on silhouette,
//! Davies-Bouldin and dispersion scores, and either accepts a group as a
//! final cluster or recurses further, bounded by an iteration budget. All
//! I/O (dump parsing, artifact writing) lives outside this crate.

pub mod aggregate;
pub mod bandwidth;
pub mod config;
pub mod dispersion;
pub mod error;
pub mod hierarchy;
pub mod meanshift;
pub mod quality;
pub mod types;

pub use aggregate::{ClusteringResult, FinalCluster, NamedNode, ResultAggregator};
pub use bandwidth::BandwidthEstimator;
pub use config::ClusteringParams;
pub use dispersion::DispersionFilter;
pub use error::{Error, Result};
pub use hierarchy::HierarchyController;
pub use meanshift::{MeanShiftOptions, ModeSeekingClusterer, Partition};
pub use quality::{PartitionQuality, QualityEvaluator, QualityThresholds};
pub use types::{
    AtomPoint, ClusterNode, ClusterRecord, ClusterTree, ClusteringResponse, NodeStatus, PointSet,
    TerminationReason,
};
