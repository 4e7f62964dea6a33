use clap::Parser;
use membot::chat::Chatbot;

use crate::error::CliResult;
use crate::output::{OutputFormat, render_stats};

#[derive(Parser, Debug, Default)]
pub struct StatsCommand {}

impl StatsCommand {
    pub async fn run(&self, bot: &Chatbot, format: OutputFormat) -> CliResult<String> {
        render_stats(&bot.stats().await, format)
    }

    pub async fn execute(&self, bot: &Chatbot, format: OutputFormat) -> CliResult<()> {
        println!("{}", self.run(bot, format).await?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::test_chatbot;

    #[tokio::test]
    async fn test_stats_after_exchange() {
        let bot = test_chatbot();
        bot.chat("Hello").await;

        let out = StatsCommand::default()
            .run(&bot, OutputFormat::Json)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["total_messages"], 2);
        assert_eq!(json["has_summary"], true);
    }
}
