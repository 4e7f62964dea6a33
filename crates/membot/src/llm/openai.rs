//! OpenAI-compatible chat completions client
//!
//! Implements [`ChatModel`] and [`Summarizer`] over any endpoint that speaks
//! the `/chat/completions` protocol, with bearer authentication and
//! exponential backoff on rate limiting.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{LlmConfig, MemoryConfig};
use crate::llm::prompts::{summary_prompt, transcript_prompt};
use crate::llm::{ChatModel, GenerationParams, LlmError, Summarizer};
use crate::memory::{Role, Turn};

const MAX_RETRIES: u32 = 3;
const SUMMARY_PREAMBLE: &str = "You are a helpful assistant that writes concise conversation summaries.";

/// Client for an OpenAI-compatible HTTP API
#[derive(Debug)]
pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    return_messages: bool,
    summary_temperature: f32,
    summary_max_tokens: u32,
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

/// Message in the chat completion request
#[derive(Debug, Serialize, PartialEq)]
struct Message {
    role: &'static str,
    content: String,
}

impl Message {
    fn new(role: &'static str, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a client with an already resolved API key
    pub fn new(llm: &LlmConfig, memory: &MemoryConfig, api_key: String) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .map_err(|e| LlmError::ApiError(e.to_string()))?;

        info!(
            "OpenAiClient initialized with model: {}, api_url: {}",
            llm.model, llm.api_url
        );

        Ok(Self {
            client,
            api_url: llm.api_url.clone(),
            api_key,
            model: llm.model.clone(),
            return_messages: memory.return_messages,
            summary_temperature: llm.summary_temperature,
            summary_max_tokens: u32::try_from(memory.max_tokens).unwrap_or(u32::MAX),
        })
    }

    /// Build the message list for a reply.
    ///
    /// When the window already ends with the pending human turn it is not
    /// repeated; `new_input` is always the final user message.
    fn build_messages(&self, system_preamble: &str, window: &[Turn], new_input: &str) -> Vec<Message> {
        let history = match window.last() {
            Some(last) if last.role == Role::Human && last.content == new_input.trim() => {
                &window[..window.len() - 1]
            }
            _ => window,
        };

        let mut messages = vec![Message::new("system", system_preamble)];

        if self.return_messages {
            messages.extend(history.iter().map(|turn| {
                let role = match turn.role {
                    Role::Human => "user",
                    Role::Assistant => "assistant",
                };
                Message::new(role, turn.content.clone())
            }));
            messages.push(Message::new("user", new_input));
        } else {
            messages.push(Message::new("user", transcript_prompt(history, new_input)));
        }

        messages
    }

    /// Call the API with exponential backoff for rate limiting
    ///
    /// Makes up to 3 attempts with backoff delays of 1s, 2s on 429 or
    /// transport errors. Timeouts are reported immediately.
    async fn call_api(&self, request: &ChatCompletionRequest<'_>) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));
        debug!("Calling chat completions at: {}", url);

        let mut last_error = None;
        let mut delay = Duration::from_secs(1);

        for attempt in 0..MAX_RETRIES {
            match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();

                    if status == 429 {
                        warn!(
                            "Rate limited on attempt {}/{}, waiting {:?}",
                            attempt + 1,
                            MAX_RETRIES,
                            delay
                        );
                        last_error = Some(format!("API returned {status}"));
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        continue;
                    }

                    if !status.is_success() {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        return Err(LlmError::ApiError(format!(
                            "API returned {status}: {error_text}"
                        )));
                    }

                    let completion: ChatCompletionResponse = response
                        .json()
                        .await
                        .map_err(|e| LlmError::ParseError(e.to_string()))?;

                    return completion
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.message.content)
                        .ok_or_else(|| LlmError::ApiError("Empty response".to_string()));
                }
                Err(e) if e.is_timeout() => {
                    return Err(LlmError::Timeout(e.to_string()));
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    last_error = Some(err_msg.clone());
                    if attempt < MAX_RETRIES - 1 {
                        warn!(
                            "Request failed on attempt {}/{}, retrying: {}",
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(LlmError::ApiError(format!(
            "Failed after {} retries: {}",
            MAX_RETRIES,
            last_error.unwrap_or_else(|| "Unknown error".to_string())
        )))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn generate(
        &self,
        system_preamble: &str,
        window: &[Turn],
        new_input: &str,
        params: GenerationParams,
    ) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: self.build_messages(system_preamble, window, new_input),
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        };
        let reply = self.call_api(&request).await?;
        Ok(reply.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Summarizer for OpenAiClient {
    async fn summarize(&self, existing_digest: &str, new_text: &str) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                Message::new("system", SUMMARY_PREAMBLE),
                Message::new("user", summary_prompt(existing_digest, new_text)),
            ],
            temperature: self.summary_temperature,
            max_tokens: self.summary_max_tokens,
        };
        let summary = self.call_api(&request).await?;
        debug!("Summary response: {}", summary);
        Ok(summary.trim().to_string())
    }
}
