//! Error types for Membot

use thiserror::Error;

use crate::llm::LlmError;
use crate::memory::MemoryError;

/// Main error type for Membot operations
#[derive(Error, Debug)]
pub enum MembotError {
    /// Configuration errors (missing API key, out-of-range values, bad TOML)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Memory store errors
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    /// External LLM provider errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// No room for another session
    #[error("Session limit reached ({0} active)")]
    SessionLimit(usize),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for Membot operations
pub type Result<T> = std::result::Result<T, MembotError>;
