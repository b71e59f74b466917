use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::domain::{
    ports::{GenerationClient, GenerationParams},
    DomainError, PromptMessage,
};
use crate::infrastructure::config::LlmConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound for a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.retry.max_attempts,
            base_delay: Duration::from_millis(config.retry.base_delay_ms),
            max_delay: Duration::from_millis(config.retry.max_delay_ms),
            timeout: config.timeout(),
        }
    }

    /// Exponential delay before retry number `attempt` (1-based), capped at
    /// `max_delay`, with equal jitter: half fixed, half random.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let capped = self.base_delay.saturating_mul(factor).min(self.max_delay);

        let half = capped / 2;
        let jitter_ms = rand::rng().random_range(0..=half.as_millis() as u64);
        half + Duration::from_millis(jitter_ms)
    }
}

/// Wraps a [`GenerationClient`] with a per-attempt timeout and bounded
/// retries of transient failures. Permanent errors return immediately.
pub struct RetryingGenerationClient {
    inner: Arc<dyn GenerationClient>,
    policy: RetryPolicy,
}

impl RetryingGenerationClient {
    pub fn new(inner: Arc<dyn GenerationClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl GenerationClient for RetryingGenerationClient {
    async fn generate(
        &self,
        system_prompt: &str,
        messages: &[PromptMessage],
        params: GenerationParams,
    ) -> Result<String, DomainError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let outcome = tokio::time::timeout(
                self.policy.timeout,
                self.inner.generate(system_prompt, messages, params),
            )
            .await
            .unwrap_or_else(|_| {
                Err(DomainError::timeout(format!(
                    "generation exceeded {:?}",
                    self.policy.timeout
                )))
            });

            match outcome {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient generation failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
