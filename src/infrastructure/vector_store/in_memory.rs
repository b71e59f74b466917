use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::{
    ports::VectorStore, DistanceMetric, DomainError, Embedding, IndexEntry, RetrievalResult,
};

use super::collection_name;

/// Brute-force namespace kept in insertion order.
///
/// Queries scan under a read lock and writes take the write lock, so a query
/// never observes a half-applied `add`.
pub struct InMemoryVectorStore {
    namespace: String,
    dimension: usize,
    metric: DistanceMetric,
    entries: RwLock<Vec<IndexEntry>>,
}

impl InMemoryVectorStore {
    pub fn new(namespace: impl Into<String>, dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            namespace: namespace.into(),
            dimension,
            metric,
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn for_client(client: &str, dimension: usize) -> Self {
        Self::new(collection_name(client), dimension, DistanceMetric::default())
    }

    fn check_dimension(&self, vector: &Embedding) -> Result<(), DomainError> {
        if vector.dimension() != self.dimension {
            return Err(DomainError::configuration(format!(
                "vector dimension {} does not match index dimension {} in '{}'",
                vector.dimension(),
                self.dimension,
                self.namespace
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn add(&self, entries: Vec<IndexEntry>) -> Result<(), DomainError> {
        for entry in &entries {
            self.check_dimension(&entry.vector)?;
        }

        let mut store = self
            .entries
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        for entry in entries {
            match store.iter_mut().find(|existing| existing.id == entry.id) {
                Some(existing) => *existing = entry,
                None => store.push(entry),
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        vector: &Embedding,
        k: usize,
    ) -> Result<Vec<RetrievalResult>, DomainError> {
        self.check_dimension(vector)?;

        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        let mut scored: Vec<(f32, &IndexEntry)> = store
            .iter()
            .map(|entry| (vector.distance(&entry.vector, self.metric), entry))
            .collect();

        // Total order with NaN last; stable, so ties keep insertion order.
        scored.sort_by(|a, b| {
            a.0.is_nan()
                .cmp(&b.0.is_nan())
                .then_with(|| a.0.total_cmp(&b.0))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, entry)| RetrievalResult {
                content: entry.document.clone(),
                metadata: entry.metadata.clone(),
                distance,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(store.len())
    }
}
