use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use crate::application::prompt::{PromptBuilder, DEFAULT_HISTORY_WINDOW};
use crate::application::services::Retriever;
use crate::application::session_locks::SessionLocks;
use crate::application::suggestions::{derive_visualization, SuggestionTable};
use crate::domain::{
    ports::{GenerationClient, GenerationParams, MessageStore},
    ClientConfig, Conversation, ConversationMode, DomainError, Message, MessageRole,
    PromptMessage, Source, Visualization,
};

const DEFAULT_HISTORY_FETCH_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub message: String,
    pub session_id: Option<String>,
    pub mode: String,
    pub module: Option<String>,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            mode: ConversationMode::default().as_str().to_string(),
            module: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    pub session_id: String,
    pub response: String,
    pub sources: Vec<Source>,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,
    pub mode: ConversationMode,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visualization: Option<Visualization>,
}

impl From<Message> for HistoryMessage {
    fn from(msg: Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
            timestamp: msg.timestamp,
            sources: msg.sources,
            visualization: msg.visualization,
        }
    }
}

/// Drives one user turn: session lookup, retrieval, prompt, generation,
/// suggestions and visualization, then persists the user/assistant pair.
///
/// Built once at startup and shared; all per-turn state lives on the stack.
pub struct ConversationOrchestrator {
    client_id: String,
    client: Arc<ClientConfig>,
    retriever: Arc<Retriever>,
    generator: Arc<dyn GenerationClient>,
    store: Arc<dyn MessageStore>,
    prompts: PromptBuilder,
    suggestions: SuggestionTable,
    params: GenerationParams,
    history_fetch_limit: usize,
    locks: SessionLocks,
}

impl ConversationOrchestrator {
    pub fn new(
        client_id: impl Into<String>,
        client: Arc<ClientConfig>,
        retriever: Arc<Retriever>,
        generator: Arc<dyn GenerationClient>,
        store: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            prompts: PromptBuilder::new(&client),
            suggestions: SuggestionTable::for_client(&client),
            client,
            retriever,
            generator,
            store,
            params: GenerationParams::default(),
            history_fetch_limit: DEFAULT_HISTORY_FETCH_LIMIT.max(DEFAULT_HISTORY_WINDOW),
            locks: SessionLocks::new(),
        }
    }

    pub fn with_generation_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_history(mut self, window: usize, fetch_limit: usize) -> Self {
        self.prompts = self.prompts.with_history_window(window);
        self.history_fetch_limit = fetch_limit.max(window);
        self
    }

    pub fn client(&self) -> &ClientConfig {
        &self.client
    }

    /// Looks up the conversation for `session_id`, creating it on first use.
    #[instrument(skip(self))]
    pub async fn resolve_session(&self, session_id: &str) -> Result<Conversation, DomainError> {
        self.store.get_or_create(session_id, &self.client_id).await
    }

    #[instrument(skip(self, request), fields(session_id = tracing::field::Empty, mode = %request.mode))]
    pub async fn process_turn(&self, request: TurnRequest) -> Result<TurnResult, DomainError> {
        if request.message.trim().is_empty() {
            return Err(DomainError::validation("message must not be empty"));
        }

        let session_id = request
            .session_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::Span::current().record("session_id", session_id.as_str());
        let mode = ConversationMode::parse(&request.mode);

        let _guard = self.locks.acquire(&session_id).await;

        let mut conversation = self.resolve_session(&session_id).await?;
        let history: Vec<PromptMessage> = self
            .store
            .list(&conversation, Some(self.history_fetch_limit))
            .await?
            .iter()
            .map(PromptMessage::from)
            .collect();

        let context = self.retriever.retrieve(&request.message).await?;
        if context.is_empty() {
            tracing::warn!("no grounding context retrieved");
        }

        let prompt = self
            .prompts
            .build(mode, &context, &history, &request.message);

        let response = self
            .generator
            .generate(&prompt.system, &prompt.messages, self.params)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "generation failed"))?;

        let suggestions = self.suggestions.lookup(mode, request.module.as_deref());
        let visualization = if self.client.enable_visualizations {
            derive_visualization(&request.message, mode)
        } else {
            None
        };

        let now = Utc::now();
        let user_message = Message::new(conversation.id, MessageRole::User, &request.message)
            .with_timestamp(now);
        let assistant_message = Message::new(conversation.id, MessageRole::Assistant, &response)
            .with_sources(prompt.sources.clone())
            .with_visualization(visualization.clone())
            .with_timestamp(now);
        conversation.touch(mode, now);

        self.store
            .append(&conversation, &[user_message, assistant_message])
            .await?;

        tracing::info!(sources = prompt.sources.len(), "turn completed");
        Ok(TurnResult {
            session_id,
            response,
            sources: prompt.sources,
            suggestions,
            visualization,
            mode,
            timestamp: now,
        })
    }

    /// Full chronological history, or `None` for an unknown session.
    #[instrument(skip(self))]
    pub async fn history(&self, session_id: &str) -> Result<Option<HistoryView>, DomainError> {
        let Some(conversation) = self.store.find(session_id).await? else {
            return Ok(None);
        };
        let messages = self.store.list(&conversation, None).await?;

        Ok(Some(HistoryView {
            session_id: conversation.session_id,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
            messages: messages.into_iter().map(HistoryMessage::from).collect(),
        }))
    }

    /// `false` when there was no such session.
    #[instrument(skip(self))]
    pub async fn delete_session(&self, session_id: &str) -> Result<bool, DomainError> {
        let _guard = self.locks.acquire(session_id).await;
        let deleted = self.store.delete(session_id).await?;
        if deleted {
            tracing::info!("deleted conversation session");
        }
        Ok(deleted)
    }
}

impl std::fmt::Debug for ConversationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationOrchestrator")
            .field("client_id", &self.client_id)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
