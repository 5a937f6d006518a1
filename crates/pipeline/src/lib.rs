//! # Insight Pipeline
//!
//! Batch orchestration of the ticket insight run.
//!
//! ```text
//! Raw records
//!     │
//!     ├──> Normalizer (tolerant skip)
//!     ├──> Embedding cache (drop on service failure)
//!     ├──> k-means partition (empty clusters filtered)
//!     ├──> Aggregate + classify + gap flag
//!     └──> InsightSnapshot (atomic persist, previous snapshot kept on error)
//! ```
//!
//! A run either completes and publishes one immutable snapshot, or fails
//! and leaves the previous snapshot in place. The freshness check is the
//! only path that re-enters earlier stages.

mod error;
mod freshness;
mod orchestrator;
mod report;

pub use error::{PipelineError, Result};
pub use freshness::{
    assess_freshness, FreshnessAssessment, StaleReason, DEFAULT_STALE_AFTER_DAYS,
};
pub use orchestrator::{InsightPipeline, PipelineConfig, PipelineOutcome};
pub use report::RunReport;
