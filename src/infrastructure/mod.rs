pub mod config;
pub mod embedding;
pub mod llm;
pub mod message_store;
pub mod vector_store;

pub use config::{load_client_config, AppConfig, MessageBackend, VectorBackend};
pub use embedding::TextEmbedding;
pub use llm::{AnthropicGenerator, RetryPolicy, RetryingGenerationClient};
pub use message_store::{create_pool, InMemoryMessageStore, RedisMessageStore, RedisPool};
pub use vector_store::{collection_name, InMemoryVectorStore, QdrantVectorStore};
