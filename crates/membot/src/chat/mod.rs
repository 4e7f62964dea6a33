//! Conversation orchestrator
//!
//! [`Chatbot`] runs one exchange end to end: validate the input, store the
//! human turn, ask the external model for a reply with the retained window
//! as context, store the reply, fold the human turn into the digest, and
//! report stats. Every failure is caught here and returned as a
//! [`ChatOutcome`]; internal detail is only logged. Once a reply exists the
//! exchange succeeds even if the digest cannot be updated.
//!
//! One `Chatbot` is one session. Its store sits behind an async mutex held
//! for the whole of `chat`, so calls on the same session queue in order
//! while separate sessions proceed independently.

mod types;

pub use types::{BotInfo, ChatOutcome, ErrorKind};

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::llm::prompts::system_preamble;
use crate::llm::{ChatModel, GenerationParams, LlmError, OpenAiClient, Summarizer};
use crate::memory::{
    ConversationExport, Exchange, MEMORY_TYPE, MemoryStats, MemoryStore, Role, Turn,
};
use crate::security::{InputValidator, SECURITY_FEATURES};
use types::ChatFailure;

/// Reply, stats and digest of a successful exchange
struct Reply {
    response: String,
    stats: MemoryStats,
    summary: String,
}

pub struct Chatbot {
    info: BotInfo,
    preamble: String,
    params: GenerationParams,
    validator: InputValidator,
    model: Arc<dyn ChatModel>,
    external_timeout: Duration,
    store: TokioMutex<MemoryStore>,
}

impl Chatbot {
    /// Build a session around the given model and summarizer
    pub fn new(config: &Config, model: Arc<dyn ChatModel>, summarizer: Arc<dyn Summarizer>) -> Self {
        let info = BotInfo {
            name: config.chatbot.name.clone(),
            personality: config.chatbot.personality.clone(),
            model: config.llm.model.clone(),
            memory_type: MEMORY_TYPE.to_string(),
            security_features: SECURITY_FEATURES.iter().map(|s| s.to_string()).collect(),
        };
        debug!(
            "Chatbot {} using model {} (window of {} turns)",
            info.name,
            model.model_name(),
            config.memory.window_size
        );

        Self {
            preamble: system_preamble(&config.chatbot.name, &config.chatbot.personality),
            params: GenerationParams {
                temperature: config.llm.temperature,
                max_output_tokens: config.llm.max_tokens,
            },
            validator: InputValidator::new(&config.security),
            model,
            external_timeout: Duration::from_secs(config.llm.timeout_secs),
            store: TokioMutex::new(MemoryStore::new(
                &config.memory,
                &config.security,
                summarizer,
            )),
            info,
        }
    }

    /// Build a session backed by the configured OpenAI-compatible API.
    ///
    /// Fails when no API key is available.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.llm.resolve_api_key()?;
        let client = Arc::new(OpenAiClient::new(&config.llm, &config.memory, api_key)?);
        info!("Chatbot initialized successfully");
        Ok(Self::new(config, client.clone(), client))
    }

    /// Override the bound applied to each external call
    pub fn with_external_timeout(mut self, timeout: Duration) -> Self {
        self.external_timeout = timeout;
        self
    }

    /// Run one exchange. Never fails; see [`ChatOutcome`].
    pub async fn chat(&self, input: &str) -> ChatOutcome {
        let mut store = self.store.lock().await;

        match self.process(&mut store, input).await {
            Ok(reply) => ChatOutcome::success(reply.response, reply.stats, reply.summary),
            Err(failure) => {
                let kind = failure.kind();
                match kind {
                    ErrorKind::InvalidInput => warn!("Chat input rejected: {failure}"),
                    _ => error!("Error in chat: {failure}"),
                }
                ChatOutcome::failure(kind)
            }
        }
    }

    async fn process(
        &self,
        store: &mut MemoryStore,
        input: &str,
    ) -> std::result::Result<Reply, ChatFailure> {
        self.validator.check(input)?;
        store.append(input, Role::Human)?;

        let window = store.window();
        debug!("Generating reply with {} turns of context", window.len());
        let response = self
            .bounded(
                "generation",
                self.model
                    .generate(&self.preamble, &window, input, self.params),
            )
            .await?
            .map_err(ChatFailure::Generation)?;

        if let Err(e) = store.append(&response, Role::Assistant) {
            warn!("Assistant reply not stored in memory: {e}");
        }

        // A failed digest update keeps the previous digest and does not fail the exchange
        match self
            .bounded("summarization", store.absorb_human(input.trim()))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Summary not updated, keeping previous digest: {e}"),
            Err(e) => warn!("Summary not updated, keeping previous digest: {e}"),
        }

        Ok(Reply {
            response,
            stats: store.stats(),
            summary: store.digest().to_string(),
        })
    }

    async fn bounded<T>(
        &self,
        step: &'static str,
        call: impl Future<Output = std::result::Result<T, LlmError>>,
    ) -> std::result::Result<std::result::Result<T, LlmError>, ChatFailure> {
        tokio::time::timeout(self.external_timeout, call)
            .await
            .map_err(|_| ChatFailure::Timeout {
                step,
                secs: self.external_timeout.as_secs_f64(),
            })
    }

    /// Empty the window and digest. Always succeeds.
    pub async fn clear(&self) -> bool {
        self.store.lock().await.clear();
        true
    }

    pub async fn export(&self) -> ConversationExport {
        self.store.lock().await.export()
    }

    /// Export and write to `dir` as `conversation_YYYYMMDD_HHMMSS.json`
    pub async fn save_export(&self, dir: &Path) -> Result<PathBuf> {
        self.export().await.save_to_dir(dir)
    }

    pub async fn stats(&self) -> MemoryStats {
        self.store.lock().await.stats()
    }

    /// Retained turns, oldest first
    pub async fn window(&self) -> Vec<Turn> {
        self.store.lock().await.window()
    }

    /// Retained turns paired as (human, ai) exchanges
    pub async fn history(&self) -> Vec<Exchange> {
        self.store.lock().await.exchanges()
    }

    pub async fn summary(&self) -> String {
        self.store.lock().await.digest().to_string()
    }

    /// True while a `chat` call holds this session
    pub fn is_processing(&self) -> bool {
        self.store.try_lock().is_err()
    }

    /// Static configuration echo; touches no session state
    pub fn describe(&self) -> BotInfo {
        self.info.clone()
    }
}

impl std::fmt::Debug for Chatbot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chatbot")
            .field("info", &self.info)
            .field("params", &self.params)
            .field("external_timeout", &self.external_timeout)
            .finish_non_exhaustive()
    }
}
