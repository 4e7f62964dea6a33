use clap::Parser;
use membot::chat::Chatbot;

use crate::error::CliResult;
use crate::output::OutputFormat;

#[derive(Parser, Debug, Default)]
pub struct ClearCommand {}

impl ClearCommand {
    pub async fn run(&self, bot: &Chatbot, format: OutputFormat) -> CliResult<String> {
        let success = bot.clear().await;
        match format {
            OutputFormat::Json => Ok(serde_json::json!({ "success": success }).to_string()),
            OutputFormat::Table if success => {
                Ok("Conversation memory cleared successfully!".to_string())
            }
            OutputFormat::Table => Ok("Failed to clear conversation memory".to_string()),
        }
    }

    pub async fn execute(&self, bot: &Chatbot, format: OutputFormat) -> CliResult<()> {
        println!("{}", self.run(bot, format).await?);
        Ok(())
    }
}
