//! Deterministic doubles for the embedding and generation ports.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::ports::{EmbeddingService, GenerationClient, GenerationParams, VectorStore};
use crate::domain::{
    Chunker, Document, DomainError, Embedding, IndexEntry, PromptMessage, RetrievalResult,
};
use crate::infrastructure::InMemoryVectorStore;

pub const LETTER_DIMENSION: usize = 26;

/// Embeds text as its ASCII letter histogram.
pub struct LetterEmbedding;

#[async_trait]
impl EmbeddingService for LetterEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let mut counts = vec![0.0f32; LETTER_DIMENSION];
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            counts[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        Ok(Embedding::new(counts))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        LETTER_DIMENSION
    }
}

/// `LetterEmbedding` that records the size of every batch it is handed.
#[derive(Default)]
pub struct BatchRecordingEmbedding {
    batches: Mutex<Vec<usize>>,
}

impl BatchRecordingEmbedding {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingService for BatchRecordingEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        LetterEmbedding.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        self.batches.lock().unwrap().push(texts.len());
        LetterEmbedding.embed_batch(texts).await
    }

    fn dimension(&self) -> usize {
        LETTER_DIMENSION
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub messages: Vec<PromptMessage>,
    pub params: GenerationParams,
}

/// Replays scripted outcomes, then falls back to a fixed reply (or a
/// permanent failure when built with `failing`).
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, DomainError>>>,
    fallback: Option<String>,
    delay: Duration,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(text.into()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fallback: None,
            ..Self::replying("")
        }
    }

    pub fn then(self, outcome: Result<String, DomainError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[PromptMessage],
        params: GenerationParams,
    ) -> Result<String, DomainError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system_prompt: system_prompt.to_string(),
            messages: messages.to_vec(),
            params,
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| DomainError::generation("backend returned status 500")),
        }
    }
}

/// A namespace whose backend is down; every call fails with `detail`.
pub struct UnavailableIndex {
    pub detail: String,
}

#[async_trait]
impl VectorStore for UnavailableIndex {
    fn namespace(&self) -> &str {
        "unavailable"
    }

    async fn add(&self, _entries: Vec<IndexEntry>) -> Result<(), DomainError> {
        Err(DomainError::vector_store(self.detail.clone()))
    }

    async fn query(
        &self,
        _vector: &Embedding,
        _k: usize,
    ) -> Result<Vec<RetrievalResult>, DomainError> {
        Err(DomainError::vector_store(self.detail.clone()))
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Err(DomainError::vector_store(self.detail.clone()))
    }
}

/// A letter-embedded in-memory namespace holding `docs`, chunked with size 200.
pub async fn seeded_index(client: &str, docs: &[(&str, &str)]) -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::for_client(client, LETTER_DIMENSION));
    let chunker = Chunker::new(200, 20).unwrap();
    let embedding = LetterEmbedding;

    let mut entries = Vec::new();
    for (source, text) in docs {
        for chunk in chunker.chunk(&Document::new(*source, *text)) {
            let vector = embedding.embed(&chunk.text).await.unwrap();
            entries.push(IndexEntry::from_chunk(&chunk, vector, client));
        }
    }
    store.add(entries).await.unwrap();
    store
}
