use crate::client::{truncate_chars, EmbeddingClient, MAX_EMBED_CHARS};
use crate::error::{EmbeddingError, Result};
use crate::store::EmbeddingStore;
use insight_ticket::Ticket;
use std::sync::Arc;

/// Vector lookup with persistent fill-on-miss.
///
/// Hits return the stored vector unchanged; staleness against current ticket
/// content is accepted. Misses call the external service exactly as needed
/// and persist the result with insert-if-absent semantics, so a duplicate
/// fill is never an error.
#[derive(Clone)]
pub struct EmbeddingCache {
    store: EmbeddingStore,
    client: Arc<dyn EmbeddingClient>,
}

impl EmbeddingCache {
    pub fn new(store: EmbeddingStore, client: Arc<dyn EmbeddingClient>) -> Self {
        Self { store, client }
    }

    /// Vector for `ticket`, from the store when present, else from the
    /// service.
    ///
    /// A store write failure is retried as lookup-then-insert once before it
    /// surfaces; a service failure surfaces immediately with no substitute
    /// vector.
    pub async fn get_or_create(&self, ticket: &Ticket) -> Result<Vec<f32>> {
        if let Some(vector) = self.store.get(&ticket.id).await {
            log::debug!("Embedding cache hit for {}", ticket.id);
            return Ok(vector);
        }

        log::debug!("Embedding cache miss for {}", ticket.id);
        let text = ticket.embedding_text();
        let vector = self.client.embed(truncate_chars(&text, MAX_EMBED_CHARS)).await?;

        if let Err(err) = self.store.insert_if_absent(&ticket.id, &vector).await {
            log::warn!("Vector store write failed for {}: {err}; retrying once", ticket.id);
            if let Some(stored) = self.store.get(&ticket.id).await {
                return Ok(stored);
            }
            self.store.insert_if_absent(&ticket.id, &vector).await?;
        }

        Ok(vector)
    }

    /// Fetch vectors for a batch with bounded fan-out.
    ///
    /// Results keep the input order; each ticket fails independently so the
    /// caller can count drops and decide whether enough of the batch
    /// survived.
    pub async fn embed_all(&self, tickets: &[Ticket]) -> Vec<Result<Vec<f32>>> {
        let max_concurrent = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .clamp(2, 8);

        let mut results = Vec::with_capacity(tickets.len());

        for batch in tickets.chunks(max_concurrent) {
            let mut tasks = Vec::with_capacity(batch.len());
            for ticket in batch {
                let cache = self.clone();
                let ticket = ticket.clone();
                tasks.push(tokio::spawn(async move { cache.get_or_create(&ticket).await }));
            }

            for task in tasks {
                match task.await {
                    Ok(result) => results.push(result),
                    Err(err) => {
                        results.push(Err(EmbeddingError::Other(format!("task panicked: {err}"))));
                    }
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct StubClient {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubClient {
        fn new() -> Self {
            Self { calls: AtomicUsize::new(0), fail: false }
        }

        fn failing() -> Self {
            Self { calls: AtomicUsize::new(0), fail: true }
        }
    }

    #[async_trait]
    impl EmbeddingClient for StubClient {
        #[allow(clippy::cast_precision_loss)]
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EmbeddingError::EmbeddingUnavailable {
                    detail: "stub outage".to_string(),
                });
            }
            Ok(vec![text.len() as f32, 1.0, 2.0])
        }
    }

    fn ticket(id: &str, body: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            subject: body.lines().next().unwrap_or_default().to_string(),
            messages: body.to_string(),
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

    #[tokio::test]
    async fn second_lookup_skips_the_service() {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(StubClient::new());
        let cache = EmbeddingCache::new(EmbeddingStore::new(dir.path()), client.clone());
        let t = ticket("abc-123", "where is my order");

        let first = cache.get_or_create(&t).await.unwrap();
        let second = cache.get_or_create(&t).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn service_failure_propagates_without_substitute() {
        let dir = TempDir::new().unwrap();
        let cache = EmbeddingCache::new(
            EmbeddingStore::new(dir.path()),
            Arc::new(StubClient::failing()),
        );
        let t = ticket("abc-123", "anything");

        let err = cache.get_or_create(&t).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::EmbeddingUnavailable { .. }));
        assert_eq!(cache.store.get("abc-123").await, None);
    }

    #[tokio::test]
    async fn batch_results_keep_input_order() {
        let dir = TempDir::new().unwrap();
        let cache = EmbeddingCache::new(
            EmbeddingStore::new(dir.path()),
            Arc::new(StubClient::new()),
        );
        let tickets = vec![ticket("a", "x"), ticket("b", "xx"), ticket("c", "xxx")];

        let results = cache.embed_all(&tickets).await;
        assert_eq!(results.len(), 3);
        let lens: Vec<f32> = results
            .into_iter()
            .map(|r| r.unwrap()[0])
            .collect();
        // Embedding text is "subject messages", so lengths differ per ticket.
        assert!(lens[0] < lens[1] && lens[1] < lens[2]);
    }
}
