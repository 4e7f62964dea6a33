//! HTTP/JSON surface over independent chat sessions
//!
//! Each session owns its own [`Chatbot`](crate::chat::Chatbot); sessions are
//! created on demand and addressed by UUID.

mod handlers;
mod server;

pub use server::{AppState, ChatbotFactory, WebServer, create_router};
