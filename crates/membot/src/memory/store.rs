//! Windowed conversation store
//!
//! Keeps the most recent turns in a fixed-size window with strict FIFO
//! eviction, tracks lifetime metadata, and owns the summary digest so that
//! `clear` and `export` cover both.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::{MemoryConfig, SecurityConfig};
use crate::llm::{LlmError, Summarizer};
use crate::memory::summary::SummaryAccumulator;
use crate::memory::types::{
    ConversationExport, ConversationMetadata, Exchange, ExportedMessage, MEMORY_TYPE, MemoryError,
    MemoryStats, Role, Turn,
};
use crate::security::InputValidator;

#[derive(Debug)]
pub struct MemoryStore {
    turns: VecDeque<Turn>,
    window_size: usize,
    validator: InputValidator,
    next_sequence: u64,
    metadata: ConversationMetadata,
    summary: SummaryAccumulator,
}

impl MemoryStore {
    pub fn new(
        memory: &MemoryConfig,
        security: &SecurityConfig,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            turns: VecDeque::with_capacity(memory.window_size),
            window_size: memory.window_size.max(1),
            validator: InputValidator::new(security),
            next_sequence: 0,
            metadata: ConversationMetadata::new(Utc::now()),
            summary: SummaryAccumulator::new(summarizer),
        }
    }

    /// Append a turn, evicting the oldest turns beyond the window.
    ///
    /// Content is trimmed and capped at the input limit before storing.
    pub fn append(&mut self, content: &str, role: Role) -> Result<Turn, MemoryError> {
        if !self.validator.validate_input_length(content) {
            let len = content.chars().count();
            tracing::warn!("Message too long: {len} characters");
            return Err(MemoryError::TooLong {
                len,
                max: self.validator.max_input_length(),
            });
        }

        let sanitized = sanitize(content, self.validator.max_input_length());
        let turn = Turn::new(self.next_sequence, role, sanitized);
        self.next_sequence += 1;

        self.metadata.message_count += 1;
        self.metadata.total_tokens += turn.word_count() as u64;

        tracing::info!(
            "Message added to memory: {} chars ({})",
            turn.content.len(),
            role
        );

        self.turns.push_back(turn.clone());
        self.enforce_window();
        Ok(turn)
    }

    /// Fold a human turn into the summary digest
    pub async fn absorb_human(&mut self, text: &str) -> Result<(), LlmError> {
        self.summary.absorb(text).await
    }

    /// Retained turns, oldest first
    pub fn window(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Iterate the retained turns without cloning
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn metadata(&self) -> &ConversationMetadata {
        &self.metadata
    }

    pub fn digest(&self) -> &str {
        self.summary.digest()
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            total_messages: self.turns.len(),
            window_size: self.window_size,
            has_summary: self.summary.has_summary(),
            memory_type: MEMORY_TYPE.to_string(),
            conversation_metadata: self.metadata.clone(),
        }
    }

    /// Pair consecutive (human, ai) turns; unpaired turns are skipped
    pub fn exchanges(&self) -> Vec<Exchange> {
        let turns: Vec<&Turn> = self.turns.iter().collect();
        let mut exchanges = Vec::new();
        let mut i = 0;

        while i + 1 < turns.len() {
            let (first, second) = (turns[i], turns[i + 1]);
            if first.role == Role::Human && second.role == Role::Assistant {
                exchanges.push(Exchange {
                    human: first.content.clone(),
                    ai: second.content.clone(),
                });
                i += 2;
            } else {
                i += 1;
            }
        }

        exchanges
    }

    /// Empty the window and digest and start fresh metadata.
    ///
    /// The new start time is strictly later than the previous one.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.summary.clear();
        self.next_sequence = 0;
        self.metadata = ConversationMetadata::new(later_than(self.metadata.start_time));
        tracing::info!("Memory cleared successfully");
    }

    /// Snapshot of the window; every message is stamped with the export time
    pub fn export(&self) -> ConversationExport {
        let exported_at = Utc::now();
        ConversationExport {
            messages: self
                .turns
                .iter()
                .map(|t| ExportedMessage {
                    role: t.role,
                    content: t.content.clone(),
                    timestamp: exported_at,
                })
                .collect(),
            metadata: self.metadata.clone(),
            summary: self.summary.digest().to_string(),
        }
    }

    fn enforce_window(&mut self) {
        while self.turns.len() > self.window_size {
            if let Some(evicted) = self.turns.pop_front() {
                tracing::debug!("Evicted turn {} from window", evicted.sequence_index);
            }
        }
    }
}

fn sanitize(content: &str, max_chars: usize) -> String {
    let trimmed = content.trim();
    if trimmed.chars().count() > max_chars {
        trimmed.chars().take(max_chars).collect()
    } else {
        trimmed.to_string()
    }
}

fn later_than(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}
