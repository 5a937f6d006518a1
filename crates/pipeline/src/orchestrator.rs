use crate::error::{PipelineError, Result};
use crate::freshness::{assess_freshness, FreshnessAssessment, DEFAULT_STALE_AFTER_DAYS};
use crate::report::RunReport;
use chrono::{DateTime, Utc};
use insight_analytics::{
    aggregate, classify, common_tags, detect_gap, sample_queries, slugify, ClusterInsight,
    DocIndex, InsightSnapshot, SnapshotStore,
};
use insight_cluster::{choose_k, partition};
use insight_embedding::EmbeddingCache;
use insight_ticket::{normalize_all, RawRecord, Ticket};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub stale_after_days: u64,
    /// Seed for centroid initialization; fixed by callers that want
    /// reproducible runs.
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
            seed: 0,
        }
    }
}

/// Snapshot plus the counters describing how it was produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub snapshot: InsightSnapshot,
    pub report: RunReport,
}

/// Sequences the full run: normalize → embed (cached) → partition →
/// aggregate + classify → persist. The only component allowed to re-enter
/// earlier stages, via the staleness-driven re-cluster decision.
pub struct InsightPipeline {
    cache: EmbeddingCache,
    snapshots: SnapshotStore,
    docs: DocIndex,
    config: PipelineConfig,
}

impl InsightPipeline {
    pub fn new(
        cache: EmbeddingCache,
        snapshots: SnapshotStore,
        docs: DocIndex,
        config: PipelineConfig,
    ) -> Self {
        Self {
            cache,
            snapshots,
            docs,
            config,
        }
    }

    /// Judge the latest persisted snapshot against the staleness threshold.
    pub async fn freshness(&self, now_unix_ms: u64) -> FreshnessAssessment {
        assess_freshness(
            self.snapshots.load_latest().await,
            now_unix_ms,
            self.config.stale_after_days,
        )
    }

    /// Reuse the latest snapshot when it is young enough, otherwise run the
    /// full pipeline over `records`.
    pub async fn run_if_stale(
        &self,
        records: &[RawRecord],
        now: DateTime<Utc>,
    ) -> Result<PipelineOutcome> {
        let assessment = self.freshness(unix_ms(now)).await;
        if !assessment.stale {
            if let Some(snapshot) = assessment.snapshot {
                log::info!(
                    "Snapshot from {} is fresh; skipping re-cluster",
                    snapshot.run_date
                );
                let report = RunReport {
                    tickets_loaded: snapshot.total_tickets,
                    clusters_produced: snapshot.clusters.len(),
                    reused_snapshot: true,
                    ..RunReport::default()
                };
                return Ok(PipelineOutcome { snapshot, report });
            }
        }

        log::info!("Snapshot stale ({:?}); re-clustering", assessment.reasons);
        self.run(records, now).await
    }

    /// Run every stage unconditionally and persist the resulting snapshot.
    ///
    /// Any failure before the final save leaves the previous snapshot
    /// intact; no partial snapshot is ever published.
    pub async fn run(&self, records: &[RawRecord], now: DateTime<Utc>) -> Result<PipelineOutcome> {
        let mut report = RunReport {
            records_seen: records.len(),
            ..RunReport::default()
        };

        // Stage 1: normalize, tolerating malformed rows.
        let (tickets, malformed) = normalize_all(records);
        report.malformed_skipped = malformed.len();
        report.tickets_loaded = tickets.len();
        log::info!(
            "Loaded {} tickets ({} malformed rows skipped)",
            tickets.len(),
            malformed.len()
        );
        if tickets.is_empty() {
            return Err(PipelineError::NothingToCluster);
        }

        // Stage 2: vectors, cached per ticket id. A failed embedding drops
        // that ticket rather than corrupting cluster geometry with a
        // substitute vector.
        let results = self.cache.embed_all(&tickets).await;
        let mut surviving: Vec<Ticket> = Vec::with_capacity(tickets.len());
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(tickets.len());
        for (ticket, result) in tickets.into_iter().zip(results) {
            match result {
                Ok(vector) => {
                    surviving.push(ticket);
                    vectors.push(vector);
                }
                Err(err) => {
                    log::warn!("Dropping ticket {}: {err}", ticket.id);
                    report.embedding_dropped += 1;
                }
            }
        }
        if report.embedding_dropped > 0 {
            log::warn!(
                "{} tickets dropped to embedding failures",
                report.embedding_dropped
            );
        }
        if surviving.is_empty() {
            return Err(PipelineError::EmbeddingsUnavailable {
                dropped: report.embedding_dropped,
            });
        }

        // Stage 3: partition. Empty clusters are dropped below, not kept as
        // placeholders.
        let k = choose_k(surviving.len());
        let parts = partition(&vectors, k, self.config.seed)?;

        // Per-cluster statistics, topic, gap flag.
        let grand_total = surviving.len();
        let mut clusters = Vec::new();
        for (id, member_indices) in parts.members().into_iter().enumerate() {
            if member_indices.is_empty() {
                continue;
            }
            let members: Vec<&Ticket> = member_indices.iter().map(|&i| &surviving[i]).collect();

            let stats = aggregate(&members, grand_total);
            let topic = classify(&members);
            let slug = slugify(&topic);
            let knowledge_gap = detect_gap(stats.ticket_total, &topic, &self.docs);

            clusters.push(ClusterInsight {
                id,
                member_ticket_ids: members.iter().map(|t| t.id.clone()).collect(),
                centroid: parts.centroids[id].clone(),
                common_tags: common_tags(&members),
                sample_queries: sample_queries(&members),
                topic,
                slug,
                stats,
                knowledge_gap,
            });
        }
        report.clusters_produced = clusters.len();

        let snapshot = InsightSnapshot::from_clusters(
            now.format("%Y-%m-%d").to_string(),
            unix_ms(now),
            grand_total,
            report.embedding_dropped,
            clusters,
        );

        self.snapshots.save(&snapshot).await?;
        self.snapshots.save_audit(&snapshot).await?;

        Ok(PipelineOutcome { snapshot, report })
    }
}

fn unix_ms(now: DateTime<Utc>) -> u64 {
    u64::try_from(now.timestamp_millis()).unwrap_or(0)
}
