use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

/// Text embedding model. The same instance must serve ingestion and queries.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;

    /// One vector per input, in input order. Every vector has `dimension()` components.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError>;

    /// Fixed for the lifetime of the process; index namespaces are sized by it.
    fn dimension(&self) -> usize;
}
