//! Application layer - Use cases and orchestration.
//!
//! This module contains application services that orchestrate domain logic
//! and infrastructure. Services depend on domain ports (traits) rather than
//! concrete implementations.

pub mod prompt;
pub mod services;
pub mod session_locks;
pub mod suggestions;

#[cfg(test)]
pub(crate) mod testing;

pub use prompt::{Prompt, PromptBuilder};
pub use services::{
    ConversationOrchestrator, HistoryMessage, HistoryView, IngestionReport, IngestionService,
    Retriever, TurnRequest, TurnResult,
};
pub use session_locks::SessionLocks;
pub use suggestions::{derive_visualization, SuggestionTable};
