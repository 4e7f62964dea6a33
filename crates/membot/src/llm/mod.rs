//! External language model capabilities
//!
//! The core never generates text itself. It decides what context to send
//! through [`ChatModel`] and folds human turns into a digest through
//! [`Summarizer`]. [`OpenAiClient`] implements both over an
//! OpenAI-compatible chat completions endpoint.

pub mod openai;
pub mod prompts;

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Turn;

pub use openai::OpenAiClient;

/// Errors reported by an external model provider
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Sampling parameters for one generation call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Produces the assistant's reply for a conversation
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a reply to `new_input` given the retained `window`.
    ///
    /// The window is ordered oldest first and may already end with the
    /// human turn carrying `new_input`.
    async fn generate(
        &self,
        system_preamble: &str,
        window: &[Turn],
        new_input: &str,
        params: GenerationParams,
    ) -> Result<String, LlmError>;

    /// Model identifier for logging and `describe`
    fn model_name(&self) -> &str;
}

/// Folds new text into a running summary
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, existing_digest: &str, new_text: &str) -> Result<String, LlmError>;
}
