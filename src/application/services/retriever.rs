use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DomainError, RetrievalResult,
};

/// Embeds a query and looks up its nearest chunks in one client namespace.
pub struct Retriever {
    embedding: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl Retriever {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            index,
            default_top_k,
        }
    }

    pub fn index(&self) -> &Arc<dyn VectorStore> {
        &self.index
    }

    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievalResult>, DomainError> {
        self.retrieve_top_k(query, self.default_top_k).await
    }

    /// An empty namespace yields an empty list, meaning "no grounding context".
    #[instrument(skip(self), fields(namespace = self.index.namespace()))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>, DomainError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedding.embed(query).await?;
        let results = self.index.query(&embedding, top_k).await?;

        let preview: String = query.chars().take(50).collect();
        tracing::info!(count = results.len(), query = %preview, "retrieved chunks");
        Ok(results)
    }
}
