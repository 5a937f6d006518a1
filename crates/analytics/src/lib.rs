//! # Insight Analytics
//!
//! Everything derived from cluster membership: per-cluster statistics, topic
//! classification with knowledge-gap detection, and the immutable
//! [`InsightSnapshot`] each run produces.
//!
//! ```text
//! Cluster members (tickets)
//!     │
//!     ├──> aggregate ──> ClusterStats (volume, CSAT, returns, median)
//!     ├──> classify  ──> topic name ──> slugify ──> detect_gap
//!     │
//!     └──> ClusterInsight ──> InsightSnapshot ──> SnapshotStore
//! ```

mod classifier;
mod error;
mod snapshot;
mod stats;

pub use classifier::{
    classify, detect_gap, slugify, DocIndex, KNOWLEDGE_GAP_MIN_TICKETS,
};
pub use error::{AnalyticsError, Result};
pub use snapshot::{ClusterInsight, InsightSnapshot, SnapshotStore, SNAPSHOT_SCHEMA_VERSION};
pub use stats::{
    aggregate, common_tags, median, sample_queries, ClusterStats, NEG_CSAT_THRESHOLD,
};
