//! Core memory types: turns, metadata, statistics and export snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label reported for the windowed store in stats and `describe`
pub const MEMORY_TYPE: &str = "ConversationBufferWindowMemory with Summary";

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Message typed by the user
    #[serde(rename = "human")]
    Human,
    /// Reply produced by the model
    #[serde(rename = "ai")]
    Assistant,
}

impl Role {
    /// Convert role to its export representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Assistant => "ai",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Position in insertion order since the last clear
    pub sequence_index: u64,
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(sequence_index: u64, role: Role, content: String) -> Self {
        Self {
            sequence_index,
            role,
            content,
        }
    }

    /// Approximate token count: whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

/// Lifetime counters for a conversation. Reset only by an explicit clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMetadata {
    pub start_time: DateTime<Utc>,
    /// Every successful append, never decremented by eviction
    pub message_count: u64,
    /// Sum of word counts of every stored turn
    pub total_tokens: u64,
}

impl ConversationMetadata {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            message_count: 0,
            total_tokens: 0,
        }
    }
}

/// Snapshot of the store's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Turns currently in the window (post-eviction)
    pub total_messages: usize,
    pub window_size: usize,
    pub has_summary: bool,
    pub memory_type: String,
    pub conversation_metadata: ConversationMetadata,
}

/// One exported message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedMessage {
    #[serde(rename = "type")]
    pub role: Role,
    pub content: String,
    /// Assigned at export time, not when the turn was recorded
    pub timestamp: DateTime<Utc>,
}

/// Exported conversation, serialized as the export file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationExport {
    pub messages: Vec<ExportedMessage>,
    pub metadata: ConversationMetadata,
    pub summary: String,
}

/// A (human, ai) pair of consecutive turns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub human: String,
    pub ai: String,
}

/// Memory store errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Message too long: {len} characters (maximum {max})")]
    TooLong { len: usize, max: usize },
}
