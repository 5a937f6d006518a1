use crate::error::{Result, TicketError};
use crate::source::RawRecord;
use crate::ticket::Ticket;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Column keys recognized in vendor exports. Missing columns degrade to
/// defaults; only the total absence of usable text is an error.
pub mod columns {
    pub const CONVERSATION_URL: &str = "Conversation_URL";
    pub const MESSAGE_BODY: &str = "Message_Body";
    pub const CONVERSATION_TAGS: &str = "Conversation_Tags";
    pub const MESSAGE_TIMESTAMP: &str = "Message_Timestamp";
    pub const FIRST_RESPONSE_SECONDS: &str = "First_Response_Seconds";
    pub const CHANNEL: &str = "Channel";
    pub const BRAND: &str = "Brand";
}

/// Keywords whose presence anywhere in the message text marks return intent.
const RETURN_KEYWORDS: [&str; 4] = ["return", "refund", "cancel", "exchange"];

static RATING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)rating[:\s]*(\d+)").expect("valid rating pattern"));

static CONVERSATION_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"conversations/([^/\s]+)").expect("valid conversation pattern"));

/// Produce exactly one [`Ticket`] from a raw tabular record.
///
/// Partial data degrades gracefully to empty/optional fields. Fails with
/// [`TicketError::MalformedRecord`] only when the record carries no usable
/// text at all.
pub fn normalize(record: &RawRecord) -> Result<Ticket> {
    let body = record
        .get(columns::MESSAGE_BODY)
        .map(String::as_str)
        .unwrap_or_default();

    if body.trim().is_empty() {
        return Err(TicketError::MalformedRecord {
            context: format!(
                "no message text (url={})",
                record
                    .get(columns::CONVERSATION_URL)
                    .map(String::as_str)
                    .unwrap_or("missing")
            ),
        });
    }

    let created_at = record
        .get(columns::MESSAGE_TIMESTAMP)
        .cloned()
        .unwrap_or_default();

    let id = ticket_id(record, body, &created_at);
    let (return_flag, return_reason) = detect_return_intent(body);

    Ok(Ticket {
        id,
        subject: extract_subject(body),
        messages: body.to_string(),
        tags: parse_tags(
            record
                .get(columns::CONVERSATION_TAGS)
                .map(String::as_str)
                .unwrap_or_default(),
        ),
        rating: extract_rating(body),
        return_flag,
        return_reason,
        first_response_secs: record
            .get(columns::FIRST_RESPONSE_SECONDS)
            .and_then(|raw| raw.trim().parse::<u64>().ok()),
        created_at,
        channel: record.get(columns::CHANNEL).cloned().unwrap_or_default(),
        brand: record.get(columns::BRAND).cloned().unwrap_or_default(),
    })
}

/// Normalize a batch, skipping malformed records instead of failing the run.
/// Returns the surviving tickets alongside the per-record errors so the
/// caller can report how many rows were dropped.
#[must_use]
pub fn normalize_all(records: &[RawRecord]) -> (Vec<Ticket>, Vec<TicketError>) {
    let mut tickets = Vec::with_capacity(records.len());
    let mut errors = Vec::new();

    for record in records {
        match normalize(record) {
            Ok(ticket) => tickets.push(ticket),
            Err(err) => {
                log::warn!("Skipping record: {err}");
                errors.push(err);
            }
        }
    }

    (tickets, errors)
}

/// Stable id for a record: the conversation segment of the source URL when
/// present, else a digest of the record content. Both are reproducible across
/// runs, which keeps the embedding cache from degenerating into misses.
fn ticket_id(record: &RawRecord, body: &str, created_at: &str) -> String {
    if let Some(url) = record.get(columns::CONVERSATION_URL) {
        if let Some(caps) = CONVERSATION_REF_RE.captures(url) {
            return caps[1].to_string();
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    hasher.update(created_at.as_bytes());
    let digest = hasher.finalize();
    format!("ticket-{:016x}", u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ]))
}

fn extract_subject(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("No subject")
        .to_string()
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn extract_rating(body: &str) -> Option<u8> {
    let caps = RATING_RE.captures(body)?;
    caps[1].parse::<u64>().ok().map(|value| value.min(u64::from(u8::MAX)) as u8)
}

fn detect_return_intent(body: &str) -> (bool, Option<String>) {
    let lower = body.to_lowercase();
    for keyword in RETURN_KEYWORDS {
        if lower.contains(keyword) {
            return (true, Some(format!("{keyword}_requested")));
        }
    }
    (false, None)
}
