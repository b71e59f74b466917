mod in_memory;
mod qdrant;

pub use in_memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;

/// Per-client namespace name.
pub fn collection_name(client: &str) -> String {
    format!("docbot_{client}")
}
