pub mod chat;
pub mod clear;
pub mod export;
pub mod info;
pub mod stats;

pub use chat::{ChatCommand, SlashCommand};
pub use clear::ClearCommand;
pub use export::ExportCommand;
pub use info::InfoCommand;
pub use stats::StatsCommand;

#[cfg(test)]
pub(crate) mod tests {
    use membot::chat::Chatbot;
    use membot::config::Config;
    use membot::testing::{EchoModel, MockSummarizer};
    use std::sync::Arc;

    pub(crate) fn test_chatbot() -> Chatbot {
        Chatbot::new(
            &Config::default(),
            Arc::new(EchoModel::new()),
            Arc::new(MockSummarizer::new()),
        )
    }
}
