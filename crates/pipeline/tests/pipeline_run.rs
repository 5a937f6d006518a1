use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use insight_analytics::{DocIndex, SnapshotStore};
use insight_embedding::{EmbeddingCache, EmbeddingClient, EmbeddingError, EmbeddingStore};
use insight_pipeline::{InsightPipeline, PipelineConfig, PipelineError};
use insight_ticket::{columns, RawRecord};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Embeds by keyword so semantically distinct groups land far apart.
struct KeywordClient;

#[async_trait]
impl EmbeddingClient for KeywordClient {
    async fn embed(&self, text: &str) -> insight_embedding::Result<Vec<f32>> {
        if text.contains("out of stock") {
            Ok(vec![0.0, 0.0])
        } else if text.contains("refund") {
            Ok(vec![10.0, 10.0])
        } else {
            Ok(vec![5.0, 5.0])
        }
    }
}

struct OutageClient;

#[async_trait]
impl EmbeddingClient for OutageClient {
    async fn embed(&self, _text: &str) -> insight_embedding::Result<Vec<f32>> {
        Err(EmbeddingError::EmbeddingUnavailable {
            detail: "service down".to_string(),
        })
    }
}

fn record(id: &str, body: &str, tags: &str) -> RawRecord {
    let mut row = RawRecord::new();
    row.insert(
        columns::CONVERSATION_URL.to_string(),
        format!("https://support.example.com/admin/conversations/{id}"),
    );
    row.insert(columns::MESSAGE_BODY.to_string(), body.to_string());
    row.insert(columns::CONVERSATION_TAGS.to_string(), tags.to_string());
    row
}

/// Ten inventory tickets and nine refund tickets: two well-separated
/// groups under [`KeywordClient`].
fn sample_records() -> Vec<RawRecord> {
    let mut records = Vec::new();
    for i in 0..10 {
        records.push(record(
            &format!("inv-{i}"),
            "Widget crate is out of stock again\nWhen will you restock the pallet?",
            "inventory, backorder",
        ));
    }
    for i in 0..9 {
        records.push(record(
            &format!("ref-{i}"),
            "Please refund my damaged pallet\nIt arrived crushed",
            "refund, damaged",
        ));
    }
    records
}

fn pipeline(
    dir: &Path,
    client: Arc<dyn EmbeddingClient>,
    docs: DocIndex,
    config: PipelineConfig,
) -> InsightPipeline {
    let cache = EmbeddingCache::new(EmbeddingStore::new(dir.join("vectors")), client);
    InsightPipeline::new(cache, SnapshotStore::new(dir.join("snapshots")), docs, config)
}

fn run_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 2, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn run_produces_an_ordered_consistent_snapshot() {
    let dir = TempDir::new().unwrap();
    let p = pipeline(
        dir.path(),
        Arc::new(KeywordClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );

    let outcome = p.run(&sample_records(), run_date()).await.unwrap();
    let snapshot = outcome.snapshot;

    assert_eq!(snapshot.total_tickets, 19);
    assert_eq!(snapshot.run_date, "2025-07-02");
    assert_eq!(snapshot.clusters.len(), 2);
    assert_eq!(outcome.report.clusters_produced, 2);
    assert_eq!(outcome.report.malformed_skipped, 0);

    // Descending by volume: the 10-ticket inventory cluster leads.
    assert_eq!(snapshot.clusters[0].stats.ticket_total, 10);
    assert_eq!(snapshot.clusters[0].topic, "Inventory Issues");
    assert_eq!(snapshot.clusters[1].stats.ticket_total, 9);
    assert_eq!(snapshot.clusters[1].topic, "Returns & Refunds");

    let pct_sum: f64 = snapshot.clusters.iter().map(|c| c.stats.ticket_pct).sum();
    assert!((pct_sum - 100.0).abs() < 1e-9, "pct sum was {pct_sum}");

    // Every refund ticket carries return intent.
    assert_eq!(snapshot.clusters[1].stats.return_pct, 100.0);
    assert_eq!(snapshot.clusters[1].slug, "returns-refunds");
    assert_eq!(
        snapshot.clusters[0].common_tags,
        vec!["inventory".to_string(), "backorder".to_string()]
    );
}

#[tokio::test]
async fn gap_flag_follows_volume_and_doc_coverage() {
    let dir = TempDir::new().unwrap();
    let p = pipeline(
        dir.path(),
        Arc::new(KeywordClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );

    let snapshot = p.run(&sample_records(), run_date()).await.unwrap().snapshot;
    // 10 tickets and no article: flagged. 9 tickets: never flagged.
    assert!(snapshot.clusters[0].knowledge_gap);
    assert!(!snapshot.clusters[1].knowledge_gap);

    let covered = TempDir::new().unwrap();
    let p = pipeline(
        covered.path(),
        Arc::new(KeywordClient),
        DocIndex::new(vec!["Inventory-Issues-playbook.md".to_string()]),
        PipelineConfig::default(),
    );
    let snapshot = p.run(&sample_records(), run_date()).await.unwrap().snapshot;
    assert!(!snapshot.clusters[0].knowledge_gap);
}

#[tokio::test]
async fn member_sets_are_stable_across_seeds() {
    let records = sample_records();
    let mut seen: Vec<BTreeSet<BTreeSet<String>>> = Vec::new();

    for seed in [1u64, 42, 7_777] {
        let dir = TempDir::new().unwrap();
        let p = pipeline(
            dir.path(),
            Arc::new(KeywordClient),
            DocIndex::default(),
            PipelineConfig {
                seed,
                ..PipelineConfig::default()
            },
        );
        let snapshot = p.run(&records, run_date()).await.unwrap().snapshot;
        let groups: BTreeSet<BTreeSet<String>> = snapshot
            .clusters
            .iter()
            .map(|c| c.member_ticket_ids.iter().cloned().collect())
            .collect();
        seen.push(groups);
    }

    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[1], seen[2]);
}

#[tokio::test]
async fn persisted_snapshot_matches_and_survives_failed_runs() {
    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(dir.path().join("snapshots"));
    let p = pipeline(
        dir.path(),
        Arc::new(KeywordClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );

    let first = p.run(&sample_records(), run_date()).await.unwrap().snapshot;
    assert_eq!(store.load_latest().await.unwrap().unwrap(), first);

    // A later run against a dead embedding service fails without touching
    // the published snapshot. The cache already holds the old ids, so use
    // fresh record ids to force service calls.
    let failing = pipeline(
        dir.path(),
        Arc::new(OutageClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );
    let fresh_rows: Vec<RawRecord> = (0..3)
        .map(|i| record(&format!("new-{i}"), "totally new complaint text", ""))
        .collect();
    let err = failing.run(&fresh_rows, run_date()).await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::EmbeddingsUnavailable { dropped: 3 }
    ));
    assert_eq!(store.load_latest().await.unwrap().unwrap(), first);
}

#[tokio::test]
async fn fresh_snapshot_short_circuits_the_run() {
    let dir = TempDir::new().unwrap();
    let p = pipeline(
        dir.path(),
        Arc::new(KeywordClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );
    let first = p.run(&sample_records(), run_date()).await.unwrap().snapshot;

    // Same day, dead service: the fresh snapshot is reused untouched.
    let gated = pipeline(
        dir.path(),
        Arc::new(OutageClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );
    let outcome = gated.run_if_stale(&sample_records(), run_date()).await.unwrap();
    assert!(outcome.report.reused_snapshot);
    assert_eq!(outcome.snapshot, first);

    // Thirty-one days later the threshold trips and the run re-clusters.
    let later = Utc.with_ymd_and_hms(2025, 8, 2, 12, 0, 0).unwrap();
    let rerun = pipeline(
        dir.path(),
        Arc::new(KeywordClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );
    let outcome = rerun.run_if_stale(&sample_records(), later).await.unwrap();
    assert!(!outcome.report.reused_snapshot);
    assert_eq!(outcome.snapshot.run_date, "2025-08-02");
}

#[tokio::test]
async fn empty_input_aborts_with_nothing_to_cluster() {
    let dir = TempDir::new().unwrap();
    let p = pipeline(
        dir.path(),
        Arc::new(KeywordClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );
    let err = p.run(&[], run_date()).await.unwrap_err();
    assert!(matches!(err, PipelineError::NothingToCluster));
}

#[tokio::test]
async fn malformed_rows_are_skipped_not_fatal() {
    let dir = TempDir::new().unwrap();
    let p = pipeline(
        dir.path(),
        Arc::new(KeywordClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );

    let mut records = sample_records();
    records.push(RawRecord::new());
    let mut blank = RawRecord::new();
    blank.insert(columns::MESSAGE_BODY.to_string(), "   ".to_string());
    records.push(blank);

    let outcome = p.run(&records, run_date()).await.unwrap();
    assert_eq!(outcome.report.records_seen, 21);
    assert_eq!(outcome.report.malformed_skipped, 2);
    assert_eq!(outcome.snapshot.total_tickets, 19);
}

#[tokio::test]
async fn second_run_is_served_from_the_vector_cache() {
    let dir = TempDir::new().unwrap();
    let records = sample_records();

    let p = pipeline(
        dir.path(),
        Arc::new(KeywordClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );
    let first = p.run(&records, run_date()).await.unwrap().snapshot;

    // Same cache dir, dead service: every vector must come from the store.
    let cached_only = pipeline(
        dir.path(),
        Arc::new(OutageClient),
        DocIndex::default(),
        PipelineConfig::default(),
    );
    let second = cached_only.run(&records, run_date()).await.unwrap().snapshot;

    let groups = |snapshot: &insight_analytics::InsightSnapshot| -> BTreeSet<BTreeSet<String>> {
        snapshot
            .clusters
            .iter()
            .map(|c| c.member_ticket_ids.iter().cloned().collect())
            .collect()
    };
    assert_eq!(groups(&first), groups(&second));

    let totals: HashMap<&str, usize> = second
        .clusters
        .iter()
        .map(|c| (c.topic.as_str(), c.stats.ticket_total))
        .collect();
    assert_eq!(totals["Inventory Issues"], 10);
    assert_eq!(totals["Returns & Refunds"], 9);
}
