//! Conversation memory
//!
//! A fixed-size window of recent turns with lifetime metadata, a running
//! digest of human turns, and a JSON export of both.

pub mod export;
pub mod store;
pub mod summary;
pub mod types;

pub use store::MemoryStore;
pub use summary::{NO_HISTORY_SUMMARY, SummaryAccumulator};
pub use types::{
    ConversationExport, ConversationMetadata, Exchange, ExportedMessage, MEMORY_TYPE, MemoryError,
    MemoryStats, Role, Turn,
};
