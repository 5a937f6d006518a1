//! # Insight Embedding
//!
//! Vector representations for tickets: an opaque embedding-service client
//! and a persistent per-ticket cache keyed by stable ticket id.
//!
//! ```text
//! Ticket
//!     │
//!     ├──> EmbeddingCache.get_or_create
//!     │        ├─ hit:  EmbeddingStore (sharded binary files)
//!     │        └─ miss: EmbeddingClient (HTTP) ──> insert_if_absent
//!     │
//!     └──> Vec<f32>
//! ```
//!
//! The store is append-only and idempotent per key; the service call fails
//! fast and never substitutes a default vector.

mod cache;
mod client;
mod error;
mod store;

pub use cache::EmbeddingCache;
pub use client::{truncate_chars, EmbeddingClient, HttpEmbeddingClient, MAX_EMBED_CHARS};
pub use error::{EmbeddingError, Result};
pub use store::EmbeddingStore;
