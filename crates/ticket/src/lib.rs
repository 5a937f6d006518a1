//! # Insight Ticket
//!
//! Canonical ticket entity plus normalization from raw vendor exports.
//!
//! ## Pipeline position
//!
//! ```text
//! Export files
//!     │
//!     ├──> Record source (column map rows)
//!     │
//!     └──> Normalizer
//!            └─> Ticket (stable id, subject, tags, rating, return intent)
//! ```
//!
//! Normalization is tolerant: a malformed row is reported and skipped, never
//! silently dropped and never fatal to the batch.

mod error;
mod normalizer;
mod source;
mod ticket;

pub use error::{Result, TicketError};
pub use normalizer::{columns, normalize, normalize_all};
pub use source::{load_records, RawRecord};
pub use ticket::Ticket;
