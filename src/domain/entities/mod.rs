mod client;
mod conversation;
mod document;
mod embedding;

pub use client::{ClientConfig, ModuleInfo};
pub use conversation::{
    Conversation, ConversationMode, Message, MessageRole, PromptMessage, Visualization,
};
pub use document::{Chunk, Document, EntryMetadata, IndexEntry, RetrievalResult, Source};
pub use embedding::{DistanceMetric, Embedding};
