//! Structured results returned across the orchestrator boundary

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::LlmError;
use crate::memory::{MemoryError, MemoryStats};
use crate::security::ValidationError;

const INVALID_INPUT_RESPONSE: &str =
    "I'm sorry, but your input doesn't meet our security requirements. Please try a shorter message.";
const MEMORY_WRITE_RESPONSE: &str =
    "I'm sorry, but I couldn't process your message. Please try again.";
const APOLOGY_RESPONSE: &str = "I'm sorry, but I encountered an error. Please try again.";

/// Opaque failure code surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input failed validation; the user can retry
    InvalidInput,
    /// The human turn could not be stored
    MemoryWriteFailed,
    /// The external model did not answer in time
    ExternalTimeout,
    /// Any other failure, including provider errors
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::MemoryWriteFailed => "memory_write_failed",
            ErrorKind::ExternalTimeout => "external_timeout",
            ErrorKind::Internal => "internal",
        }
    }

    /// Text shown in the chat surface instead of internal detail
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => INVALID_INPUT_RESPONSE,
            ErrorKind::MemoryWriteFailed => MEMORY_WRITE_RESPONSE,
            ErrorKind::ExternalTimeout | ErrorKind::Internal => APOLOGY_RESPONSE,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `chat` call. Always produced, never a raw fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOutcome {
    pub success: bool,
    /// The model's reply, or a generic apology on failure
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_stats: Option<MemoryStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_summary: Option<String>,
}

impl ChatOutcome {
    pub fn success(response: String, stats: MemoryStats, summary: String) -> Self {
        Self {
            success: true,
            response,
            error: None,
            memory_stats: Some(stats),
            conversation_summary: Some(summary),
        }
    }

    pub fn failure(kind: ErrorKind) -> Self {
        Self {
            success: false,
            response: kind.user_message().to_string(),
            error: Some(kind),
            memory_stats: None,
            conversation_summary: None,
        }
    }
}

/// Static description of the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotInfo {
    pub name: String,
    pub personality: String,
    pub model: String,
    pub memory_type: String,
    pub security_features: Vec<String>,
}

/// Internal reasons a chat step failed; logged, then reduced to [`ErrorKind`]
#[derive(Debug, Error)]
pub(crate) enum ChatFailure {
    #[error("Input validation failed: {0}")]
    Rejected(#[from] ValidationError),
    #[error("Failed to add message to memory: {0}")]
    MemoryWrite(#[from] MemoryError),
    #[error("{step} timed out after {secs:.1}s")]
    Timeout { step: &'static str, secs: f64 },
    #[error("Generation failed: {0}")]
    Generation(LlmError),
}

impl ChatFailure {
    pub(crate) fn kind(&self) -> ErrorKind {
        match self {
            ChatFailure::Rejected(_) => ErrorKind::InvalidInput,
            ChatFailure::MemoryWrite(_) => ErrorKind::MemoryWriteFailed,
            ChatFailure::Timeout { .. } | ChatFailure::Generation(LlmError::Timeout(_)) => {
                ErrorKind::ExternalTimeout
            }
            ChatFailure::Generation(_) => ErrorKind::Internal,
        }
    }
}
