//! Membot - Conversational assistant with bounded memory
//!
//! This crate keeps a sliding window of recent turns plus a running digest
//! of everything the user has said, and delegates reply generation to an
//! OpenAI-compatible language model. It is served over HTTP by the `membot`
//! binary and driven interactively by `membot-cli`.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod security;
pub mod testing;
pub mod web;

pub use error::MembotError;
