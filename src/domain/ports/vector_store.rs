use crate::domain::{errors::DomainError, Embedding, IndexEntry, RetrievalResult};
use async_trait::async_trait;

/// One client's namespace of indexed chunks.
///
/// Implementations must tolerate concurrent queries while an `add` is in
/// flight: a query sees either the state before or after the write.
#[async_trait]
pub trait VectorStore: Send + Sync {
    fn namespace(&self) -> &str;

    /// Upserts entries by id.
    async fn add(&self, entries: Vec<IndexEntry>) -> Result<(), DomainError>;

    /// At most `k` entries by ascending distance, ties in insertion order.
    /// An empty namespace yields an empty list.
    async fn query(&self, vector: &Embedding, k: usize)
        -> Result<Vec<RetrievalResult>, DomainError>;

    async fn count(&self) -> Result<usize, DomainError>;
}
