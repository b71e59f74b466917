mod embedding;
mod llm;
mod message_store;
mod vector_store;

pub use embedding::EmbeddingService;
pub use llm::{GenerationClient, GenerationParams};
pub use message_store::MessageStore;
pub use vector_store::VectorStore;
