use crate::error::{AnalyticsError, Result};
use crate::stats::ClusterStats;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// One classified cluster with its statistics; created fresh per run and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInsight {
    pub id: usize,
    pub topic: String,
    pub slug: String,
    pub member_ticket_ids: Vec<String>,
    pub centroid: Vec<f32>,
    pub stats: ClusterStats,
    pub common_tags: Vec<String>,
    pub sample_queries: Vec<String>,
    pub knowledge_gap: bool,
}

/// Complete output of one pipeline run. Superseded, never updated, by the
/// next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSnapshot {
    pub schema_version: u32,
    /// Run key, `YYYY-MM-DD`.
    pub run_date: String,
    /// Stored freshness timestamp; staleness is judged from this field, not
    /// from file metadata.
    pub last_run_unix_ms: u64,
    pub total_tickets: usize,
    /// Tickets excluded from this run because their embedding failed.
    #[serde(default)]
    pub dropped_tickets: usize,
    pub avg_neg_csat_pct: f64,
    pub avg_return_pct: f64,
    /// Ordered descending by ticket volume.
    pub clusters: Vec<ClusterInsight>,
}

impl InsightSnapshot {
    /// Assemble a snapshot: order clusters by volume and derive the
    /// aggregate rates (mean of per-cluster percentages).
    #[must_use]
    pub fn from_clusters(
        run_date: String,
        last_run_unix_ms: u64,
        total_tickets: usize,
        dropped_tickets: usize,
        mut clusters: Vec<ClusterInsight>,
    ) -> Self {
        clusters.sort_by(|a, b| {
            b.stats
                .ticket_total
                .cmp(&a.stats.ticket_total)
                .then_with(|| a.id.cmp(&b.id))
        });

        #[allow(clippy::cast_precision_loss)]
        let count = clusters.len().max(1) as f64;
        let avg_neg_csat_pct =
            clusters.iter().map(|c| c.stats.neg_csat_pct).sum::<f64>() / count;
        let avg_return_pct = clusters.iter().map(|c| c.stats.return_pct).sum::<f64>() / count;

        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            run_date,
            last_run_unix_ms,
            total_tickets,
            dropped_tickets,
            avg_neg_csat_pct,
            avg_return_pct,
            clusters,
        }
    }

    /// Clusters currently flagged as lacking documentation.
    pub fn knowledge_gaps(&self) -> impl Iterator<Item = &ClusterInsight> {
        self.clusters.iter().filter(|c| c.knowledge_gap)
    }
}

/// Per-cluster audit row, rounded the way the exported artifacts round.
#[derive(Debug, Serialize, Deserialize)]
struct AuditRecord {
    slug: String,
    title: String,
    ticket_total: usize,
    ticket_pct: f64,
    neg_csat_pct: f64,
    refund_pct: f64,
    median_first_response_sec: u64,
    sample_queries: Vec<String>,
    common_tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuditDocument {
    date: String,
    total_clusters: usize,
    clusters: Vec<AuditRecord>,
}

/// Disk persistence for run outputs: one immutable snapshot per run date
/// plus a `latest.json` copy used by the freshness check.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn snapshot_path(&self, run_date: &str) -> PathBuf {
        self.dir.join(format!("snapshot-{run_date}.json"))
    }

    #[must_use]
    pub fn latest_path(&self) -> PathBuf {
        self.dir.join("latest.json")
    }

    #[must_use]
    pub fn audit_path(&self, run_date: &str) -> PathBuf {
        self.dir.join(format!("clusters-{run_date}.json"))
    }

    /// Persist `snapshot` under its run-date key and refresh `latest.json`.
    /// Both writes are atomic; a failed run never replaces the previous
    /// snapshot.
    pub async fn save(&self, snapshot: &InsightSnapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        write_atomic(&self.snapshot_path(&snapshot.run_date), &bytes).await?;
        write_atomic(&self.latest_path(), &bytes).await?;
        log::info!(
            "Saved snapshot for {} ({} clusters, {} tickets)",
            snapshot.run_date,
            snapshot.clusters.len(),
            snapshot.total_tickets
        );
        Ok(())
    }

    /// Write the per-run audit artifact of rounded cluster stats.
    pub async fn save_audit(&self, snapshot: &InsightSnapshot) -> Result<()> {
        let doc = AuditDocument {
            date: snapshot.run_date.clone(),
            total_clusters: snapshot.clusters.len(),
            clusters: snapshot
                .clusters
                .iter()
                .map(|c| AuditRecord {
                    slug: c.slug.clone(),
                    title: c.topic.clone(),
                    ticket_total: c.stats.ticket_total,
                    ticket_pct: round2(c.stats.ticket_pct),
                    neg_csat_pct: round2(c.stats.neg_csat_pct),
                    refund_pct: round2(c.stats.return_pct),
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    median_first_response_sec: c.stats.median_first_response_secs.round()
                        as u64,
                    sample_queries: c.sample_queries.clone(),
                    common_tags: c.common_tags.clone(),
                })
                .collect(),
        };

        let bytes = serde_json::to_vec_pretty(&doc)?;
        write_atomic(&self.audit_path(&snapshot.run_date), &bytes).await
    }

    /// Most recent snapshot, `None` when no run has been persisted yet.
    /// A present but unreadable snapshot is a distinct error so the caller
    /// can treat it as stale rather than missing.
    pub async fn load_latest(&self) -> Result<Option<InsightSnapshot>> {
        let path = self.latest_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let snapshot: InsightSnapshot =
            serde_json::from_slice(&bytes).map_err(|err| AnalyticsError::CorruptSnapshot {
                path: path.display().to_string(),
                detail: err.to_string(),
            })?;

        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(AnalyticsError::CorruptSnapshot {
                path: path.display().to_string(),
                detail: format!(
                    "unsupported schema_version {} (expected {SNAPSHOT_SCHEMA_VERSION})",
                    snapshot.schema_version
                ),
            });
        }

        Ok(Some(snapshot))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
