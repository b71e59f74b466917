use async_trait::async_trait;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    ports::VectorStore, DistanceMetric, DomainError, Embedding, EntryMetadata, IndexEntry,
    RetrievalResult,
};

pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
    metric: DistanceMetric,
}

impl QdrantVectorStore {
    pub async fn new(
        url: &str,
        collection: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<Self, DomainError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        let store = Self {
            client,
            collection: collection.to_string(),
            dimension,
            metric,
        };

        store.ensure_collection().await?;

        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<(), DomainError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        if !exists {
            let distance = match self.metric {
                DistanceMetric::Cosine => Distance::Cosine,
                DistanceMetric::Euclidean => Distance::Euclid,
            };
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(VectorParamsBuilder::new(self.dimension as u64, distance)),
                )
                .await
                .map_err(|e| DomainError::vector_store(e.to_string()))?;
            info!(collection = %self.collection, "Created collection");
        }

        Ok(())
    }

    /// Qdrant only accepts integers or UUIDs as point ids.
    fn point_id(id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes()).to_string()
    }

    fn check_dimension(&self, vector: &Embedding) -> Result<(), DomainError> {
        if vector.dimension() != self.dimension {
            return Err(DomainError::configuration(format!(
                "vector dimension {} does not match index dimension {} in '{}'",
                vector.dimension(),
                self.dimension,
                self.collection
            )));
        }
        Ok(())
    }

    // Qdrant reports cosine as a similarity and euclid as a distance.
    fn distance_from_score(&self, score: f32) -> f32 {
        match self.metric {
            DistanceMetric::Cosine => 1.0 - score,
            DistanceMetric::Euclidean => score,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn namespace(&self) -> &str {
        &self.collection
    }

    async fn add(&self, entries: Vec<IndexEntry>) -> Result<(), DomainError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut points = Vec::with_capacity(entries.len());
        for entry in entries {
            self.check_dimension(&entry.vector)?;

            let payload: Payload = serde_json::json!({
                "chunk_id": entry.metadata.chunk_id,
                "source": entry.metadata.source,
                "client": entry.metadata.client,
                "content": entry.document,
            })
            .try_into()
            .map_err(|_| DomainError::internal("Failed to create payload"))?;

            points.push(PointStruct::new(
                Self::point_id(&entry.id),
                entry.vector.into_inner(),
                payload,
            ));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        vector: &Embedding,
        k: usize,
    ) -> Result<Vec<RetrievalResult>, DomainError> {
        self.check_dimension(vector)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector.as_slice().to_vec(), k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload;
                let text = |key: &str| payload.get(key)?.as_str().map(|s| s.to_string());

                Some(RetrievalResult {
                    content: text("content")?,
                    metadata: EntryMetadata {
                        source: text("source")?,
                        client: text("client").unwrap_or_default(),
                        chunk_id: text("chunk_id")?,
                    },
                    distance: self.distance_from_score(point.score),
                })
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(|e| DomainError::vector_store(e.to_string()))?;

        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}
