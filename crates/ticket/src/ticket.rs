use serde::{Deserialize, Serialize};

/// One normalized support conversation. Created once during normalization and
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Stable identifier, used as the embedding-cache key. Either the
    /// conversation segment from the source URL or a content digest.
    pub id: String,
    /// First non-empty line of the message body.
    pub subject: String,
    /// Full message text, possibly multi-part.
    pub messages: String,
    /// Free-text labels in insertion order (display only).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Satisfaction score when one could be extracted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Whether the message text signals return/refund intent.
    #[serde(default)]
    pub return_flag: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_reason: Option<String>,
    /// Seconds until the first staff response, when recorded by the export.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_response_secs: Option<u64>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub brand: String,
}

impl Ticket {
    /// Text handed to the embedding service for this ticket.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.subject, self.messages)
    }

    /// Whether a present rating falls below the negative-CSAT threshold.
    #[must_use]
    pub fn is_negative_csat(&self) -> bool {
        self.rating.is_some_and(|r| r < 3)
    }
}
