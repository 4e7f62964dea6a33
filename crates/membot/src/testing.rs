//! Test utilities for membot - deterministic model and summarizer doubles
//!
//! These stand in for the external language model so that orchestration,
//! memory and web tests run without network access:
//! - [`EchoModel`] replies with `Echo: {input}` or a fixed reply
//! - [`FailingModel`] and [`FailingSummarizer`] always return provider errors
//! - [`SlowModel`] sleeps before answering, for timeout paths
//! - [`MockSummarizer`] joins human turns with `" | "`

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::llm::{ChatModel, GenerationParams, LlmError, Summarizer};
use crate::memory::Turn;

/// Chat model that echoes its input.
///
/// Records the window length it was given on each call.
#[derive(Debug, Default)]
pub struct EchoModel {
    reply: Option<String>,
    windows: Mutex<Vec<usize>>,
}

impl EchoModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `reply` instead of echoing
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            windows: Mutex::new(Vec::new()),
        }
    }

    /// Window lengths seen so far, one per call
    pub fn window_lengths(&self) -> Vec<usize> {
        self.windows.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.window_lengths().len()
    }
}

#[async_trait]
impl ChatModel for EchoModel {
    async fn generate(
        &self,
        _system_preamble: &str,
        window: &[Turn],
        new_input: &str,
        _params: GenerationParams,
    ) -> Result<String, LlmError> {
        if let Ok(mut windows) = self.windows.lock() {
            windows.push(window.len());
        }
        Ok(self
            .reply
            .clone()
            .unwrap_or_else(|| format!("Echo: {}", new_input.trim())))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

/// Chat model whose provider always fails
#[derive(Debug, Clone, Default)]
pub struct FailingModel;

#[async_trait]
impl ChatModel for FailingModel {
    async fn generate(
        &self,
        _system_preamble: &str,
        _window: &[Turn],
        _new_input: &str,
        _params: GenerationParams,
    ) -> Result<String, LlmError> {
        Err(LlmError::ApiError("API returned 500".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

/// Chat model that waits `delay` before echoing
#[derive(Debug)]
pub struct SlowModel {
    delay: Duration,
    started: AtomicUsize,
}

impl SlowModel {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: AtomicUsize::new(0),
        }
    }

    /// Number of calls that have begun
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for SlowModel {
    async fn generate(
        &self,
        _system_preamble: &str,
        _window: &[Turn],
        new_input: &str,
        _params: GenerationParams,
    ) -> Result<String, LlmError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(format!("Echo: {}", new_input.trim()))
    }

    fn model_name(&self) -> &str {
        "slow"
    }
}

/// Summarizer that joins human turns with `" | "`
#[derive(Debug, Clone, Default)]
pub struct MockSummarizer;

impl MockSummarizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, existing_digest: &str, new_text: &str) -> Result<String, LlmError> {
        if existing_digest.is_empty() {
            Ok(new_text.to_string())
        } else {
            Ok(format!("{existing_digest} | {new_text}"))
        }
    }
}

/// Summarizer whose provider always fails
#[derive(Debug, Clone, Default)]
pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _existing_digest: &str, _new_text: &str) -> Result<String, LlmError> {
        Err(LlmError::ApiError("summary provider unavailable".to_string()))
    }
}
