use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    Chunker, Document, DomainError, Embedding, IndexEntry,
};

const DEFAULT_BATCH_SIZE: usize = 256;

#[derive(Debug, Default)]
pub struct IngestionReport {
    pub files_indexed: usize,
    pub chunks_indexed: usize,
    /// `(file name, error)` for every file that was skipped.
    pub failures: Vec<(String, String)>,
}

/// Chunks documents, embeds the chunks and adds them to a client namespace.
pub struct IngestionService {
    chunker: Chunker,
    embedding: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorStore>,
    client: String,
    batch_size: usize,
}

impl IngestionService {
    pub fn new(
        chunker: Chunker,
        embedding: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorStore>,
        client: impl Into<String>,
    ) -> Self {
        Self {
            chunker,
            embedding,
            index,
            client: client.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Caps how many chunks go into a single `embed_batch` call.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Returns the number of chunks indexed.
    #[instrument(skip(self, document), fields(source = %document.source))]
    pub async fn ingest(&self, document: &Document) -> Result<usize, DomainError> {
        let chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embed_in_batches(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DomainError::embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| IndexEntry::from_chunk(chunk, vector, &self.client))
            .collect();
        let count = entries.len();
        self.index.add(entries).await?;

        Ok(count)
    }

    /// Indexes every `*.md` file in `dir`. A file that fails is logged and
    /// skipped; it never aborts the rest of the batch.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn ingest_directory(&self, dir: &Path) -> Result<IngestionReport, DomainError> {
        let mut report = IngestionReport::default();

        let files = match markdown_files(dir).await {
            Ok(files) => files,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("documentation path does not exist");
                return Ok(report);
            }
            Err(e) => return Err(e.into()),
        };

        if files.is_empty() {
            tracing::warn!("no documentation files found");
            return Ok(report);
        }
        tracing::info!(count = files.len(), "found documentation files");

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            match self.ingest_file(&path, &name).await {
                Ok(count) => {
                    report.files_indexed += 1;
                    report.chunks_indexed += count;
                }
                Err(e) => {
                    tracing::error!(file = %name, error = %e, "skipping document");
                    report.failures.push((name, e.to_string()));
                }
            }
        }

        tracing::info!(
            files = report.files_indexed,
            chunks = report.chunks_indexed,
            failed = report.failures.len(),
            "ingestion finished"
        );
        Ok(report)
    }

    async fn embed_in_batches(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.embedding.embed_batch(batch).await?);
        }
        Ok(embeddings)
    }

    async fn ingest_file(&self, path: &Path, name: &str) -> Result<usize, DomainError> {
        let text = tokio::fs::read_to_string(path).await?;
        self.ingest(&Document::new(name, text)).await
    }
}

async fn markdown_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "md") {
            continue;
        }
        // Follows symlinks; a dangling link is skipped.
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if is_file {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{BatchRecordingEmbedding, LetterEmbedding, LETTER_DIMENSION};
    use crate::infrastructure::InMemoryVectorStore;

    fn service(index: Arc<InMemoryVectorStore>) -> IngestionService {
        IngestionService::new(
            Chunker::new(40, 5).unwrap(),
            Arc::new(LetterEmbedding),
            index,
            "maveric",
        )
    }

    #[tokio::test]
    async fn test_entry_count_matches_chunk_count() {
        let index = Arc::new(InMemoryVectorStore::for_client("maveric", LETTER_DIMENSION));
        let svc = service(index.clone());
        let doc = Document::new(
            "readme.md",
            "Digital Twin training uses UE data. RF Prediction follows training. \
             Orchestration schedules every job.",
        );

        let expected = Chunker::new(40, 5).unwrap().chunk(&doc).len();
        let indexed = svc.ingest(&doc).await.unwrap();

        assert_eq!(indexed, expected);
        assert_eq!(index.count().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_large_document_is_embedded_in_bounded_batches() {
        let index = Arc::new(InMemoryVectorStore::for_client("maveric", LETTER_DIMENSION));
        let embedding = Arc::new(BatchRecordingEmbedding::default());
        let svc = IngestionService::new(
            Chunker::new(40, 5).unwrap(),
            embedding.clone(),
            index.clone(),
            "maveric",
        )
        .with_batch_size(8);
        let doc = Document::new("big.md", "Lorem ipsum dolor sit amet consectetur. ".repeat(100));

        let indexed = svc.ingest(&doc).await.unwrap();

        let batches = embedding.batch_sizes();
        assert!(indexed > 8);
        assert!(batches.len() > 1);
        assert!(batches.iter().all(|&n| n <= 8));
        assert_eq!(batches.iter().sum::<usize>(), indexed);
        assert_eq!(index.count().await.unwrap(), indexed);
    }

    #[tokio::test]
    async fn test_reingesting_is_idempotent() {
        let index = Arc::new(InMemoryVectorStore::for_client("maveric", LETTER_DIMENSION));
        let svc = service(index.clone());
        let doc = Document::new("readme.md", "One sentence. Another sentence here.");

        let first = svc.ingest(&doc).await.unwrap();
        svc.ingest(&doc).await.unwrap();

        assert_eq!(index.count().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_directory_ingestion_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_guide.md"), "Train the twin. Then predict.").unwrap();
        std::fs::write(dir.path().join("b_broken.md"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not markdown").unwrap();
        std::fs::create_dir(dir.path().join("drafts.md")).unwrap();

        let index = Arc::new(InMemoryVectorStore::for_client("maveric", LETTER_DIMENSION));
        let report = service(index.clone())
            .ingest_directory(dir.path())
            .await
            .unwrap();

        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "b_broken.md");
        assert_eq!(index.count().await.unwrap(), report.chunks_indexed);
    }

    #[tokio::test]
    async fn test_missing_directory_is_not_an_error() {
        let index = Arc::new(InMemoryVectorStore::for_client("maveric", LETTER_DIMENSION));
        let report = service(index)
            .ingest_directory(Path::new("/definitely/not/here"))
            .await
            .unwrap();

        assert_eq!(report.files_indexed, 0);
        assert!(report.failures.is_empty());
    }
}
