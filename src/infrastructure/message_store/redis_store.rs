use async_trait::async_trait;
use deadpool_redis::{redis, redis::AsyncCommands, Config, Pool, Runtime};

use crate::domain::{ports::MessageStore, Conversation, DomainError, Message};

pub type RedisPool = Pool;

pub mod keys {
    pub fn conversation(session_id: &str) -> String {
        format!("conversation:{}", session_id)
    }

    pub fn messages(session_id: &str) -> String {
        format!("conversation:{}:messages", session_id)
    }
}

pub fn create_pool(redis_url: &str) -> Result<RedisPool, DomainError> {
    let cfg = Config::from_url(redis_url);
    cfg.create_pool(Some(Runtime::Tokio1))
        .map_err(|e| DomainError::configuration(format!("Redis pool error: {e}")))
}

fn redis_error(e: redis::RedisError) -> DomainError {
    DomainError::internal(format!("Redis error: {e}"))
}

/// LRANGE bounds selecting the `limit` most recent entries.
fn range_for(limit: Option<usize>) -> (isize, isize) {
    match limit {
        Some(n) => (-(n.min(isize::MAX as usize) as isize), -1),
        None => (0, -1),
    }
}

const MAX_APPEND_ATTEMPTS: usize = 3;

/// Appending is only valid onto the record that was resolved for this turn.
fn ensure_same_conversation(
    existing: Option<&Conversation>,
    conversation: &Conversation,
) -> Result<(), DomainError> {
    match existing {
        Some(existing) if existing.id == conversation.id => Ok(()),
        _ => Err(DomainError::not_found(format!(
            "conversation '{}'",
            conversation.session_id
        ))),
    }
}

/// MULTI/EXEC block that rewrites the record and pushes the new messages.
fn append_pipeline(
    conversation: &Conversation,
    messages: &[Message],
) -> Result<redis::Pipeline, DomainError> {
    let session_id = conversation.session_id.as_str();
    let payloads = messages
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;

    let mut pipe = redis::pipe();
    pipe.atomic()
        .set(keys::conversation(session_id), serde_json::to_string(conversation)?)
        .ignore();
    if !payloads.is_empty() {
        pipe.rpush(keys::messages(session_id), payloads).ignore();
    }
    Ok(pipe)
}

/// Conversations as a JSON record per session plus a JSON list of messages.
#[derive(Clone)]
pub struct RedisMessageStore {
    pool: RedisPool,
}

impl RedisMessageStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, DomainError> {
        self.pool
            .get()
            .await
            .map_err(|e| DomainError::internal(format!("Redis pool error: {e}")))
    }
}

#[async_trait]
impl MessageStore for RedisMessageStore {
    async fn find(&self, session_id: &str) -> Result<Option<Conversation>, DomainError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn
            .get(keys::conversation(session_id))
            .await
            .map_err(redis_error)?;

        raw.map(|json| serde_json::from_str(&json).map_err(Into::into))
            .transpose()
    }

    async fn get_or_create(
        &self,
        session_id: &str,
        client: &str,
    ) -> Result<Conversation, DomainError> {
        let mut conn = self.conn().await?;
        let fresh = Conversation::new(session_id, client);
        let created: bool = conn
            .set_nx(keys::conversation(session_id), serde_json::to_string(&fresh)?)
            .await
            .map_err(redis_error)?;

        if created {
            tracing::debug!(session_id, "created conversation");
            return Ok(fresh);
        }

        self.find(session_id).await?.ok_or_else(|| {
            DomainError::not_found(format!("conversation '{session_id}' vanished during lookup"))
        })
    }

    async fn append(
        &self,
        conversation: &Conversation,
        messages: &[Message],
    ) -> Result<(), DomainError> {
        let session_id = conversation.session_id.as_str();
        let record_key = keys::conversation(session_id);
        let pipe = append_pipeline(conversation, messages)?;
        let mut conn = self.conn().await?;

        // WATCH aborts the EXEC if another process touches the record after the check.
        for _ in 0..MAX_APPEND_ATTEMPTS {
            redis::cmd("WATCH")
                .arg(&record_key)
                .query_async::<()>(&mut conn)
                .await
                .map_err(redis_error)?;

            let raw: Option<String> = conn.get(&record_key).await.map_err(redis_error)?;
            let existing = raw
                .map(|json| serde_json::from_str::<Conversation>(&json))
                .transpose()?;
            if let Err(e) = ensure_same_conversation(existing.as_ref(), conversation) {
                redis::cmd("UNWATCH")
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(redis_error)?;
                return Err(e);
            }

            let committed: Option<()> = pipe.query_async(&mut conn).await.map_err(redis_error)?;
            if committed.is_some() {
                return Ok(());
            }
            tracing::debug!(session_id, "conversation changed during append, retrying");
        }

        Err(DomainError::internal(format!(
            "conversation '{session_id}' kept changing during append"
        )))
    }

    async fn list(
        &self,
        conversation: &Conversation,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, DomainError> {
        if limit == Some(0) {
            return Ok(Vec::new());
        }
        let (start, stop) = range_for(limit);
        let mut conn = self.conn().await?;
        let raw: Vec<String> = conn
            .lrange(keys::messages(&conversation.session_id), start, stop)
            .await
            .map_err(redis_error)?;

        raw.iter()
            .map(|json| serde_json::from_str(json).map_err(Into::into))
            .collect()
    }

    async fn delete(&self, session_id: &str) -> Result<bool, DomainError> {
        let mut conn = self.conn().await?;
        let (removed, _): (i64, i64) = redis::pipe()
            .atomic()
            .del(keys::conversation(session_id))
            .del(keys::messages(session_id))
            .query_async(&mut conn)
            .await
            .map_err(redis_error)?;
        Ok(removed > 0)
    }
}
