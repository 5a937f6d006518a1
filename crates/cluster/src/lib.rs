//! # Insight Cluster
//!
//! Seeded k-means partitioning of ticket vectors.
//!
//! The engine only sees vectors and `k`; the cluster-count heuristic
//! ([`choose_k`]) and the decision to drop empty clusters belong to the
//! caller. Determinism across seeds is not a contract; consumers compare
//! member sets, not cluster ids.

mod error;
mod kmeans;

pub use error::{ClusterError, Result};
pub use kmeans::{choose_k, partition, Partition, MAX_ITERATIONS};
