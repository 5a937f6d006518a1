use insight_analytics::InsightSnapshot;

/// Render the support index page: all playbooks ordered by volume, aggregate
/// rates, and the current knowledge gaps.
#[must_use]
pub fn render_index(snapshot: &InsightSnapshot) -> String {
    let mut md = String::new();
    md.push_str("---\n");
    md.push_str("title: \"Support Playbooks\"\n");
    md.push_str("description: \"AI-ready support playbooks generated from customer tickets\"\n");
    md.push_str("---\n\n");
    md.push_str("# Support Playbooks\n\n");
    md.push_str(
        "This section contains support playbooks generated from analysis of customer \
         support tickets.\n\n",
    );

    md.push_str("## Playbooks by Volume\n\n");
    for cluster in &snapshot.clusters {
        md.push_str(&format!(
            "- **[{}]({}.md)** - {} tickets ({:.1}%)\n",
            cluster.topic, cluster.slug, cluster.stats.ticket_total, cluster.stats.ticket_pct
        ));
    }
    md.push('\n');

    md.push_str("## Quick Stats\n\n");
    md.push_str(&format!(
        "- **Total Tickets Analyzed**: {}\n",
        snapshot.total_tickets
    ));
    md.push_str(&format!(
        "- **Negative CSAT**: {:.1}%\n",
        snapshot.avg_neg_csat_pct
    ));
    md.push_str(&format!(
        "- **Return Rate**: {:.1}%\n\n",
        snapshot.avg_return_pct
    ));

    md.push_str("## Knowledge Gaps\n\n");
    let mut any_gap = false;
    for cluster in snapshot.knowledge_gaps() {
        any_gap = true;
        md.push_str(&format!(
            "- **{}** - {} tickets need documentation\n",
            cluster.topic, cluster.stats.ticket_total
        ));
    }
    if !any_gap {
        md.push_str("No knowledge gaps detected.\n");
    }
    md.push('\n');

    md.push_str("---\n");
    md.push_str(&format!("*Last updated: {}*\n", snapshot.run_date));

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_analytics::{ClusterInsight, ClusterStats};

    fn snapshot(gap: bool) -> InsightSnapshot {
        let cluster = ClusterInsight {
            id: 0,
            topic: "Shipping & Delivery".to_string(),
            slug: "shipping-delivery".to_string(),
            member_ticket_ids: vec!["a".to_string()],
            centroid: vec![0.0],
            stats: ClusterStats {
                ticket_total: 14,
                ticket_pct: 100.0,
                neg_csat_total: 2,
                neg_csat_pct: 14.285,
                return_total: 0,
                return_pct: 0.0,
                median_first_response_secs: 120.0,
            },
            common_tags: Vec::new(),
            sample_queries: Vec::new(),
            knowledge_gap: gap,
        };
        InsightSnapshot::from_clusters("2025-07-02".to_string(), 1, 14, 0, vec![cluster])
    }

    #[test]
    fn lists_playbooks_and_footer() {
        let md = render_index(&snapshot(false));
        assert!(md.contains("- **[Shipping & Delivery](shipping-delivery.md)** - 14 tickets (100.0%)"));
        assert!(md.contains("- **Total Tickets Analyzed**: 14"));
        assert!(md.contains("*Last updated: 2025-07-02*"));
        assert!(md.contains("No knowledge gaps detected."));
    }

    #[test]
    fn gap_section_names_the_cluster() {
        let md = render_index(&snapshot(true));
        assert!(md.contains("- **Shipping & Delivery** - 14 tickets need documentation"));
    }
}
