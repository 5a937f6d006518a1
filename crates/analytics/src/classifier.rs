use crate::error::Result;
use insight_ticket::Ticket;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::path::Path;

/// Minimum cluster size before a missing article counts as a knowledge gap.
pub const KNOWLEDGE_GAP_MIN_TICKETS: usize = 10;

/// A direct classification rule: every group must have at least one of its
/// substrings present. Declaration order is the evaluation order and it
/// matters: a cluster mentioning both stock-outs and refunds belongs to the
/// earlier rule.
struct TopicRule {
    label: &'static str,
    requires: &'static [&'static [&'static str]],
}

const TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        label: "Inventory Issues",
        requires: &[&["out of stock", "backorder", "unavailable"]],
    },
    TopicRule {
        label: "Order Updates",
        requires: &[&["order"], &["update", "shipping"]],
    },
    TopicRule {
        label: "Pricing & Billing",
        requires: &[&["price", "cost", "billing"]],
    },
    TopicRule {
        label: "Returns & Refunds",
        requires: &[&["return", "refund", "cancel"]],
    },
    TopicRule {
        label: "Payment Processing",
        requires: &[&["credit card", "payment", "authorization"]],
    },
    TopicRule {
        label: "Product Substitutions",
        requires: &[&["substitute", "replacement", "alternative"]],
    },
    TopicRule {
        label: "Shipping & Delivery",
        requires: &[&["shipping", "delivery", "overnight"]],
    },
];

/// Weighted themes scored by keyword occurrence counts. Ties break by
/// declaration order.
const THEMES: &[(&str, &[&str])] = &[
    ("Order Updates", &["order", "update", "shipping", "delivery", "tracking"]),
    (
        "Inventory Issues",
        &["out of stock", "backorder", "unavailable", "substitute", "replacement"],
    ),
    (
        "Pricing & Billing",
        &["price", "cost", "billing", "payment", "charge", "fee"],
    ),
    (
        "Product Information",
        &["product", "item", "details", "specifications", "features"],
    ),
    ("Returns & Refunds", &["return", "refund", "cancel", "exchange"]),
    ("Account Issues", &["account", "login", "password", "profile", "settings"]),
    (
        "Shipping Problems",
        &["shipping", "delivery", "tracking", "package", "carrier"],
    ),
    ("Quality Issues", &["quality", "defective", "damaged", "broken", "issue"]),
    ("General Support", &["help", "support", "question", "inquiry", "assistance"]),
];

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
        "by", "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does",
        "did", "will", "would", "could", "should", "may", "might", "must", "can", "this",
        "that", "these", "those", "i", "you", "he", "she", "it", "we", "they", "me", "him",
        "her", "us", "them", "my", "your", "his", "its", "our", "their", "mine", "yours",
        "hers", "ours", "theirs",
    ]
    .into_iter()
    .collect()
});

const FALLBACK_TOPIC: &str = "General Support";
const MIN_TOKEN_LEN: usize = 4;

/// Assign a human-readable topic to a cluster's tickets.
///
/// Layers apply in strict priority: direct substring rules, then weighted
/// theme scoring, then a frequency-based name from the cluster's own
/// vocabulary, then [`FALLBACK_TOPIC`].
#[must_use]
pub fn classify(tickets: &[&Ticket]) -> String {
    let text = combined_text(tickets);

    if let Some(label) = match_direct_rules(&text) {
        return label.to_string();
    }
    if let Some(label) = best_theme(&text) {
        return label.to_string();
    }
    if let Some(label) = frequency_name(&text) {
        return label;
    }
    FALLBACK_TOPIC.to_string()
}

fn combined_text(tickets: &[&Ticket]) -> String {
    let mut text = String::new();
    for ticket in tickets {
        text.push_str(&ticket.subject);
        text.push(' ');
        text.push_str(&ticket.messages);
        text.push(' ');
    }
    text.to_lowercase()
}

fn match_direct_rules(text: &str) -> Option<&'static str> {
    TOPIC_RULES
        .iter()
        .find(|rule| {
            rule.requires
                .iter()
                .all(|group| group.iter().any(|needle| text.contains(needle)))
        })
        .map(|rule| rule.label)
}

fn best_theme(text: &str) -> Option<&'static str> {
    let mut best: Option<(&'static str, usize)> = None;
    for (label, keywords) in THEMES {
        let score: usize = keywords.iter().map(|kw| text.matches(kw).count()).sum();
        if score > 0 && best.is_none_or(|(_, top)| score > top) {
            best = Some((label, score));
        }
    }
    best.map(|(label, _)| label)
}

/// Name a cluster from its two most frequent meaningful tokens.
fn frequency_name(text: &str) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for token in text.split(|c: char| !c.is_alphanumeric()) {
        if token.len() < MIN_TOKEN_LEN || STOP_WORDS.contains(token) {
            continue;
        }
        match counts.iter_mut().find(|(seen, _)| *seen == token) {
            Some((_, count)) => *count += 1,
            None => counts.push((token, 1)),
        }
    }

    if counts.is_empty() {
        return None;
    }

    // Stable sort keeps first-appearance order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let name = counts
        .iter()
        .take(2)
        .map(|(token, _)| title_case(token))
        .collect::<Vec<_>>()
        .join(" ");

    Some(format!("{name} Support"))
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Hyphenated lowercase form of a topic name, used for article filenames.
#[must_use]
pub fn slugify(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    let mut last_dash = true;

    for ch in topic.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-') && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

/// Read-only listing of existing documentation article filenames.
#[derive(Debug, Clone, Default)]
pub struct DocIndex {
    files: Vec<String>,
}

impl DocIndex {
    #[must_use]
    pub fn new(files: Vec<String>) -> Self {
        Self { files }
    }

    /// List markdown article filenames under `dir`. A missing directory is an
    /// empty index, not an error; every sizable cluster then reads as a gap.
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Docs directory {} missing; treating as empty", dir.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("md")) {
                if let Some(name) = path.file_name() {
                    files.push(name.to_string_lossy().to_string());
                }
            }
        }
        files.sort();

        Ok(Self { files })
    }

    /// Whether any listed filename contains `slug`, case-insensitively.
    #[must_use]
    pub fn covers(&self, slug: &str) -> bool {
        let slug = slug.to_lowercase();
        self.files
            .iter()
            .any(|file| file.to_lowercase().contains(&slug))
    }
}

/// A cluster is a knowledge gap only when it is big enough to matter and no
/// existing article covers its topic slug.
#[must_use]
pub fn detect_gap(ticket_total: usize, topic: &str, docs: &DocIndex) -> bool {
    ticket_total >= KNOWLEDGE_GAP_MIN_TICKETS && !docs.covers(&slugify(topic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ticket(text: &str) -> Ticket {
        Ticket {
            id: "t".to_string(),
            subject: text.lines().next().unwrap_or_default().to_string(),
            messages: text.to_string(),
            tags: Vec::new(),
            rating: None,
            return_flag: false,
            return_reason: None,
            first_response_secs: None,
            created_at: String::new(),
            channel: String::new(),
            brand: String::new(),
        }
    }

    fn classify_texts(texts: &[&str]) -> String {
        let tickets: Vec<Ticket> = texts.iter().map(|t| ticket(t)).collect();
        let refs: Vec<&Ticket> = tickets.iter().collect();
        classify(&refs)
    }

    #[test]
    fn earlier_rule_wins_over_later_match() {
        // Both the inventory and the returns rule match; declared order decides.
        let topic = classify_texts(&["item is out of stock, I want a refund"]);
        assert_eq!(topic, "Inventory Issues");
    }

    #[test]
    fn order_rule_needs_both_groups() {
        assert_eq!(
            classify_texts(&["any update on my order?"]),
            "Order Updates"
        );
    }

    #[test]
    fn theme_scoring_picks_highest_count() {
        // No direct rule matches; "account"/"login"/"password" outscore others.
        let topic = classify_texts(&[
            "my account login fails",
            "reset my password please, the account page rejects my login",
        ]);
        assert_eq!(topic, "Account Issues");
    }

    #[test]
    fn frequency_fallback_names_from_tokens() {
        let topic = classify_texts(&[
            "warehouse forklift broke again",
            "forklift warehouse maintenance overdue",
        ]);
        assert_eq!(topic, "Warehouse Forklift Support");
    }

    #[test]
    fn empty_text_falls_back_to_general_support() {
        assert_eq!(classify_texts(&["a of to", "is it"]), "General Support");
    }

    #[test]
    fn slugify_hyphenates_and_strips() {
        assert_eq!(slugify("Shipping & Delivery"), "shipping-delivery");
        assert_eq!(slugify("  Pricing &  Billing!"), "pricing-billing");
        assert_eq!(slugify("General Support"), "general-support");
    }

    #[test]
    fn gap_requires_minimum_volume() {
        let docs = DocIndex::default();
        assert!(detect_gap(10, "Shipping & Delivery", &docs));
        assert!(!detect_gap(9, "Shipping & Delivery", &docs));
    }

    #[test]
    fn gap_respects_existing_articles_case_insensitively() {
        let docs = DocIndex::new(vec!["SHIPPING-DELIVERY-playbook.md".to_string()]);
        assert!(!detect_gap(10, "Shipping & Delivery", &docs));

        let unrelated = DocIndex::new(vec!["refund-cancel-flow.md".to_string()]);
        assert!(detect_gap(10, "Shipping & Delivery", &unrelated));
    }

    #[tokio::test]
    async fn doc_index_loads_markdown_names_only() {
        let dir = tempfile::TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("shipping-delivery.md"), "x").await.unwrap();
        tokio::fs::write(dir.path().join("notes.txt"), "x").await.unwrap();

        let docs = DocIndex::load(dir.path()).await.unwrap();
        assert!(docs.covers("shipping-delivery"));
        assert!(!docs.covers("notes"));
    }

    #[tokio::test]
    async fn missing_docs_dir_is_an_empty_index() {
        let docs = DocIndex::load("/definitely/not/here").await.unwrap();
        assert!(!docs.covers("anything"));
    }
}
