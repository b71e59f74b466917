use crate::domain::{errors::DomainError, PromptMessage};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u64,
    pub temperature: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

/// Single request/response call to a text-generation backend.
///
/// `messages` is chronological and ends with the user turn to answer.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[PromptMessage],
        params: GenerationParams,
    ) -> Result<String, DomainError>;
}
