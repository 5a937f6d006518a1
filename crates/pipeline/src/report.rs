use serde::Serialize;

/// Counters for one pipeline invocation, for operator-facing reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Raw rows handed to the normalizer.
    pub records_seen: usize,
    /// Rows skipped as malformed.
    pub malformed_skipped: usize,
    /// Tickets that survived normalization.
    pub tickets_loaded: usize,
    /// Tickets dropped because their embedding call failed.
    pub embedding_dropped: usize,
    /// Non-empty clusters in the produced snapshot.
    pub clusters_produced: usize,
    /// True when a fresh snapshot was reused instead of re-clustering.
    pub reused_snapshot: bool,
}
