mod anthropic;
mod retry;

pub use anthropic::AnthropicGenerator;
pub use retry::{RetryPolicy, RetryingGenerationClient};
