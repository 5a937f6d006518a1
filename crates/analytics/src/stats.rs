use insight_ticket::Ticket;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Threshold below which a present rating counts as negative CSAT.
pub const NEG_CSAT_THRESHOLD: u8 = 3;

const TOP_TAG_COUNT: usize = 5;
const SAMPLE_QUERY_COUNT: usize = 5;
const MIN_SAMPLE_QUERY_LEN: usize = 10;

/// Per-cluster operational statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub ticket_total: usize,
    /// Share of the grand total, in percent.
    pub ticket_pct: f64,
    pub neg_csat_total: usize,
    pub neg_csat_pct: f64,
    pub return_total: usize,
    pub return_pct: f64,
    pub median_first_response_secs: f64,
}

/// Compute the statistics for one cluster's members.
///
/// `member_count` is at least 1 by construction: empty clusters are dropped
/// before aggregation. A cluster with zero negative ratings reports a flat
/// 0% regardless of how many members lack a rating.
#[must_use]
pub fn aggregate(tickets: &[&Ticket], grand_total: usize) -> ClusterStats {
    let member_count = tickets.len();
    let neg_csat_total = tickets.iter().filter(|t| t.is_negative_csat()).count();
    let return_total = tickets.iter().filter(|t| t.return_flag).count();

    #[allow(clippy::cast_precision_loss)]
    let (members_f, grand_f) = (member_count as f64, grand_total.max(1) as f64);

    #[allow(clippy::cast_precision_loss)]
    let neg_csat_pct = if neg_csat_total == 0 {
        0.0
    } else {
        100.0 * neg_csat_total as f64 / members_f
    };

    #[allow(clippy::cast_precision_loss)]
    let return_pct = 100.0 * return_total as f64 / members_f;

    let response_times: Vec<u64> = tickets
        .iter()
        .filter_map(|t| t.first_response_secs)
        .collect();

    ClusterStats {
        ticket_total: member_count,
        ticket_pct: 100.0 * members_f / grand_f,
        neg_csat_total,
        neg_csat_pct,
        return_total,
        return_pct,
        median_first_response_secs: median(response_times),
    }
}

/// Median of the present values: mean of the two middle values for an even
/// count, the middle value for an odd count, 0 for an empty set.
#[must_use]
pub fn median(mut values: Vec<u64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();

    let mid = values.len() / 2;
    #[allow(clippy::cast_precision_loss)]
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] as f64 + values[mid] as f64) / 2.0
    } else {
        values[mid] as f64
    };
    median
}

/// Top tags by frequency across the cluster, ties broken by first
/// appearance, capped at five.
#[must_use]
pub fn common_tags(tickets: &[&Ticket]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    let mut order = 0usize;

    for ticket in tickets {
        for tag in &ticket.tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
            first_seen.entry(tag.as_str()).or_insert_with(|| {
                let seen = order;
                order += 1;
                seen
            });
        }
    }

    let mut ranked: Vec<&str> = counts.keys().copied().collect();
    ranked.sort_by(|a, b| {
        counts[b]
            .cmp(&counts[a])
            .then_with(|| first_seen[a].cmp(&first_seen[b]))
    });

    ranked
        .into_iter()
        .take(TOP_TAG_COUNT)
        .map(ToString::to_string)
        .collect()
}

/// Up to five representative subjects, skipping ones too short to be useful.
#[must_use]
pub fn sample_queries(tickets: &[&Ticket]) -> Vec<String> {
    tickets
        .iter()
        .map(|t| t.subject.as_str())
        .filter(|subject| subject.len() > MIN_SAMPLE_QUERY_LEN)
        .take(SAMPLE_QUERY_COUNT)
        .map(ToString::to_string)
        .collect()
}
