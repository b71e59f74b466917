mod conversation;
mod ingestion;
mod retriever;

pub use conversation::{
    ConversationOrchestrator, HistoryMessage, HistoryView, TurnRequest, TurnResult,
};
pub use ingestion::{IngestionReport, IngestionService};
pub use retriever::Retriever;
