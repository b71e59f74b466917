use async_trait::async_trait;

use crate::domain::{errors::DomainError, Conversation, Message};

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn find(&self, session_id: &str) -> Result<Option<Conversation>, DomainError>;

    /// Returns the conversation for `session_id`, creating it on first use.
    async fn get_or_create(&self, session_id: &str, client: &str)
        -> Result<Conversation, DomainError>;

    /// Stores `conversation` and appends `messages` as one unit: either all
    /// of it is recorded or none. Fails with `NotFound` if the conversation
    /// was deleted in the meantime.
    async fn append(
        &self,
        conversation: &Conversation,
        messages: &[Message],
    ) -> Result<(), DomainError>;

    /// Messages in chronological order; with `limit`, only the most recent ones.
    async fn list(
        &self,
        conversation: &Conversation,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, DomainError>;

    /// Deletes the conversation and its messages. `false` if it did not exist.
    async fn delete(&self, session_id: &str) -> Result<bool, DomainError>;
}
