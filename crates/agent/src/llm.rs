use anyhow::Result;
use async_trait::async_trait;

/// One completion with the token usage the provider reported. Usage feeds the
/// cost tracker, so providers that don't report it should estimate rather
/// than return zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LlmCompletion {
    pub text: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

/// Pluggable completion transport (OpenAI, Anthropic, Ollama, test stubs).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<LlmCompletion>;
}
