use insight_analytics::InsightSnapshot;
use serde::{Deserialize, Serialize};

/// Default staleness threshold for a persisted snapshot.
pub const DEFAULT_STALE_AFTER_DAYS: u64 = 30;

const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StaleReason {
    SnapshotMissing,
    SnapshotCorrupt,
    ThresholdExceeded,
}

#[derive(Debug, Clone)]
pub struct FreshnessAssessment {
    pub stale: bool,
    pub reasons: Vec<StaleReason>,
    /// The latest snapshot when one loaded, fresh or not.
    pub snapshot: Option<InsightSnapshot>,
}

/// Judge whether the latest snapshot may be reused.
///
/// Staleness is decided from the snapshot's stored `last_run_unix_ms`, not
/// from file modification times, so the check is portable and testable. Any
/// load failure reads as stale rather than aborting the run.
#[must_use]
pub fn assess_freshness(
    loaded: insight_analytics::Result<Option<InsightSnapshot>>,
    now_unix_ms: u64,
    stale_after_days: u64,
) -> FreshnessAssessment {
    let mut reasons = Vec::new();
    let snapshot = match loaded {
        Ok(Some(snapshot)) => {
            let age_ms = now_unix_ms.saturating_sub(snapshot.last_run_unix_ms);
            if age_ms >= stale_after_days.saturating_mul(MS_PER_DAY) {
                reasons.push(StaleReason::ThresholdExceeded);
            }
            Some(snapshot)
        }
        Ok(None) => {
            reasons.push(StaleReason::SnapshotMissing);
            None
        }
        Err(err) => {
            log::warn!("Failed to load latest snapshot: {err}");
            reasons.push(StaleReason::SnapshotCorrupt);
            None
        }
    };

    FreshnessAssessment {
        stale: !reasons.is_empty(),
        reasons,
        snapshot,
    }
}
