use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::{ports::MessageStore, Conversation, DomainError, Message};

struct StoredConversation {
    conversation: Conversation,
    messages: Vec<Message>,
}

/// Process-local conversation store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryMessageStore {
    sessions: RwLock<HashMap<String, StoredConversation>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(e: impl std::fmt::Display) -> DomainError {
    DomainError::internal(e.to_string())
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn find(&self, session_id: &str) -> Result<Option<Conversation>, DomainError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(session_id).map(|s| s.conversation.clone()))
    }

    async fn get_or_create(
        &self,
        session_id: &str,
        client: &str,
    ) -> Result<Conversation, DomainError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let stored = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| StoredConversation {
                conversation: Conversation::new(session_id, client),
                messages: Vec::new(),
            });
        Ok(stored.conversation.clone())
    }

    async fn append(
        &self,
        conversation: &Conversation,
        messages: &[Message],
    ) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let stored = sessions
            .get_mut(&conversation.session_id)
            .filter(|s| s.conversation.id == conversation.id)
            .ok_or_else(|| {
                DomainError::not_found(format!("conversation '{}'", conversation.session_id))
            })?;

        stored.conversation = conversation.clone();
        stored.messages.extend_from_slice(messages);
        Ok(())
    }

    async fn list(
        &self,
        conversation: &Conversation,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, DomainError> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        let Some(stored) = sessions
            .get(&conversation.session_id)
            .filter(|s| s.conversation.id == conversation.id)
        else {
            return Ok(Vec::new());
        };

        let skip = limit
            .map(|n| stored.messages.len().saturating_sub(n))
            .unwrap_or(0);
        Ok(stored.messages[skip..].to_vec())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        Ok(sessions.remove(session_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageRole;

    fn message(conversation: &Conversation, content: &str) -> Message {
        Message::new(conversation.id, MessageRole::User, content)
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = InMemoryMessageStore::new();
        let a = store.get_or_create("s1", "maveric").await.unwrap();
        let b = store.get_or_create("s1", "other").await.unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(b.client, "maveric");
        assert!(store.find("s2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_chronological_and_limited_to_most_recent() {
        let store = InMemoryMessageStore::new();
        let conversation = store.get_or_create("s1", "maveric").await.unwrap();
        let batch: Vec<Message> = (0..4).map(|i| message(&conversation, &format!("m{i}"))).collect();
        store.append(&conversation, &batch).await.unwrap();

        let all = store.list(&conversation, None).await.unwrap();
        let contents: Vec<&str> = all.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m0", "m1", "m2", "m3"]);

        let recent = store.list(&conversation, Some(2)).await.unwrap();
        assert_eq!(recent[0].content, "m2");
        assert_eq!(recent[1].content, "m3");
    }

    #[tokio::test]
    async fn test_append_updates_conversation_record() {
        let store = InMemoryMessageStore::new();
        let mut conversation = store.get_or_create("s1", "maveric").await.unwrap();
        conversation.touch(crate::domain::ConversationMode::General, chrono::Utc::now());

        store.append(&conversation, &[]).await.unwrap();

        let found = store.find("s1").await.unwrap().unwrap();
        assert_eq!(found.mode, crate::domain::ConversationMode::General);
    }

    #[tokio::test]
    async fn test_append_after_delete_is_not_found() {
        let store = InMemoryMessageStore::new();
        let conversation = store.get_or_create("s1", "maveric").await.unwrap();
        assert!(store.delete("s1").await.unwrap());

        let err = store
            .append(&conversation, &[message(&conversation, "late")])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        // A recreated session does not accept writes meant for the old one.
        store.get_or_create("s1", "maveric").await.unwrap();
        assert!(store.append(&conversation, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_reports_absence() {
        let store = InMemoryMessageStore::new();
        assert!(!store.delete("missing").await.unwrap());
    }
}
