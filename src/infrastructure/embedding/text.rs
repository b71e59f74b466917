use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingModel;
use rig::providers::openai;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI embeddings through rig. The same model embeds documents at
/// ingestion time and queries at retrieval time.
pub struct TextEmbedding {
    model: String,
    dimension: usize,
}

impl TextEmbedding {
    pub fn new() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }

    /// Fails fast when the provider key is absent instead of on the first request.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, DomainError> {
        if std::env::var(API_KEY_ENV).map(|k| k.trim().is_empty()).unwrap_or(true) {
            return Err(DomainError::configuration(format!(
                "{API_KEY_ENV} must be set for embedding model '{}'",
                config.model
            )));
        }
        Ok(Self::new()
            .with_model(config.model.clone())
            .with_dimension(config.dimension))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    fn to_embedding(&self, vec: Vec<f64>) -> Result<Embedding, DomainError> {
        if vec.len() != self.dimension {
            return Err(DomainError::embedding(format!(
                "model '{}' returned {} dimensions, expected {}",
                self.model,
                vec.len(),
                self.dimension
            )));
        }
        Ok(Embedding::new(vec.into_iter().map(|x| x as f32).collect()))
    }
}

impl Default for TextEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let client = openai::Client::from_env();
        let model = client.embedding_model(&self.model);

        let embeddings = model
            .embed_texts(texts.iter().map(|t| t.to_string()))
            .await
            .map_err(|e| DomainError::embedding(e.to_string()))?;

        if embeddings.len() != texts.len() {
            return Err(DomainError::embedding(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                embeddings.len()
            )));
        }

        embeddings
            .into_iter()
            .map(|emb| self.to_embedding(emb.vec))
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
