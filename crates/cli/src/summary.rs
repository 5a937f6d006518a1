use insight_analytics::InsightSnapshot;
use insight_pipeline::RunReport;

const TOP_ISSUE_COUNT: usize = 5;

/// Console summary of a run, printed to stdout after `analyze` and by
/// `report`. The run counters and docs line are present only when a
/// pipeline actually executed.
#[must_use]
pub fn render(
    snapshot: &InsightSnapshot,
    report: Option<&RunReport>,
    docs_written: Option<usize>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Support Insights ({})\n", snapshot.run_date));
    out.push_str(&format!("Tickets analysed: {}\n", snapshot.total_tickets));

    if let Some(report) = report {
        if report.reused_snapshot {
            out.push_str("Reused fresh snapshot; no re-clustering performed\n");
        } else if report.malformed_skipped > 0 || report.embedding_dropped > 0 {
            out.push_str(&format!(
                "Skipped {} malformed rows, dropped {} tickets on embedding failures\n",
                report.malformed_skipped, report.embedding_dropped
            ));
        }
    }

    out.push_str("\nTop issues:\n");
    for cluster in snapshot.clusters.iter().take(TOP_ISSUE_COUNT) {
        out.push_str(&format!(
            "  {}: {:.1}%\n",
            cluster.topic, cluster.stats.ticket_pct
        ));
    }

    out.push_str(&format!(
        "\nAvg. negative CSAT: {:.1}% | Return rate: {:.1}%\n",
        snapshot.avg_neg_csat_pct, snapshot.avg_return_pct
    ));

    let gaps = snapshot.knowledge_gaps().count();
    if gaps > 0 {
        out.push_str(&format!("Knowledge gaps: {gaps}\n"));
    }

    if let Some(written) = docs_written {
        out.push_str(&format!("\nDocs updated: {written} playbooks + index.md\n"));
    }

    out
}
