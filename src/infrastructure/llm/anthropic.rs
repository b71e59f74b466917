use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::{Chat, Message};
use rig::providers::anthropic;

use crate::domain::{
    ports::{GenerationClient, GenerationParams},
    DomainError, MessageRole, PromptMessage,
};

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

// Substrings of provider errors worth another attempt.
const TRANSIENT_MARKERS: &[&str] = &[
    "overloaded",
    "rate limit",
    "rate_limit",
    "429",
    "500",
    "502",
    "503",
    "504",
    "529",
    "timed out",
    "timeout",
    "connection",
];

/// Single-shot Anthropic chat completion. Retries and timeouts are layered
/// on by [`super::RetryingGenerationClient`].
pub struct AnthropicGenerator {
    model: String,
}

impl AnthropicGenerator {
    pub fn new(model: impl Into<String>) -> Result<Self, DomainError> {
        if std::env::var(API_KEY_ENV).map(|k| k.trim().is_empty()).unwrap_or(true) {
            return Err(DomainError::configuration(format!("{API_KEY_ENV} must be set")));
        }
        Ok(Self {
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn to_rig_message(message: &PromptMessage) -> Message {
    match message.role {
        MessageRole::User => Message::user(message.content.clone()),
        MessageRole::Assistant => Message::assistant(message.content.clone()),
    }
}

pub(crate) fn classify_error(message: String) -> DomainError {
    let lower = message.to_lowercase();
    if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
        DomainError::transient_generation(message)
    } else {
        DomainError::generation(message)
    }
}

#[async_trait]
impl GenerationClient for AnthropicGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[PromptMessage],
        params: GenerationParams,
    ) -> Result<String, DomainError> {
        let Some((prompt, history)) = messages.split_last() else {
            return Err(DomainError::validation("generation needs at least one message"));
        };
        if prompt.role != MessageRole::User {
            return Err(DomainError::validation("last prompt message must come from the user"));
        }

        let client = anthropic::Client::from_env();
        let agent = client
            .agent(&self.model)
            .preamble(system_prompt)
            .max_tokens(params.max_tokens)
            .temperature(params.temperature)
            .build();

        let history: Vec<Message> = history.iter().map(to_rig_message).collect();

        agent
            .chat(to_rig_message(prompt), history)
            .await
            .map_err(|e| classify_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overload_and_rate_limit_are_transient() {
        assert!(classify_error("ProviderError: overloaded_error".into()).is_transient());
        assert!(classify_error("HTTP status 429 Too Many Requests".into()).is_transient());
        assert!(classify_error("error sending request: connection reset".into()).is_transient());
    }

    #[test]
    fn test_request_errors_are_permanent() {
        let err = classify_error("ProviderError: invalid x-api-key".into());
        assert!(!err.is_transient());
        assert!(matches!(err, DomainError::Generation { .. }));
    }

    #[tokio::test]
    async fn test_empty_message_list_is_rejected() {
        let generator = AnthropicGenerator {
            model: "claude-test".into(),
        };
        let err = generator
            .generate("system", &[], GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
