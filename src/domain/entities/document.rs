use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Embedding;

/// A source document, identified by its file name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }

    /// File name without its extension, used as the chunk id prefix.
    pub fn stem(&self) -> &str {
        Path::new(&self.source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub document_id: String,
    pub id: String,
    pub index: usize,
    pub text: String,
    /// Char offset of the first char of `text` in the source document.
    pub start: usize,
    /// Char offset one past the last char of `text`.
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub source: String,
    pub client: String,
    pub chunk_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Embedding,
    pub document: String,
    pub metadata: EntryMetadata,
}

impl IndexEntry {
    pub fn from_chunk(chunk: &Chunk, vector: Embedding, client: &str) -> Self {
        Self {
            id: chunk.id.clone(),
            vector,
            document: chunk.text.clone(),
            metadata: EntryMetadata {
                source: chunk.document_id.clone(),
                client: client.to_string(),
                chunk_id: chunk.id.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub content: String,
    pub metadata: EntryMetadata,
    pub distance: f32,
}

/// Citation record returned alongside a generated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub source: String,
}

impl From<&RetrievalResult> for Source {
    fn from(result: &RetrievalResult) -> Self {
        Self {
            source: result.metadata.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_stem_strips_extension() {
        assert_eq!(Document::new("maveric_readme.md", "").stem(), "maveric_readme");
        assert_eq!(Document::new("LICENSE", "").stem(), "LICENSE");
    }

    #[test]
    fn test_index_entry_metadata_from_chunk() {
        let chunk = Chunk {
            document_id: "guide.md".into(),
            id: "guide_3".into(),
            index: 3,
            text: "Train the twin.".into(),
            start: 10,
            end: 25,
        };
        let entry = IndexEntry::from_chunk(&chunk, Embedding::new(vec![1.0]), "maveric");

        assert_eq!(entry.id, "guide_3");
        assert_eq!(entry.document, "Train the twin.");
        assert_eq!(entry.metadata.source, "guide.md");
        assert_eq!(entry.metadata.client, "maveric");
        assert_eq!(entry.metadata.chunk_id, "guide_3");
    }
}
