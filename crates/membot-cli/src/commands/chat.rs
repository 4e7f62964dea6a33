//! Interactive chat loop

use clap::Parser;
use membot::chat::Chatbot;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;

use crate::commands::{ClearCommand, ExportCommand, InfoCommand, StatsCommand};
use crate::error::CliResult;
use crate::output::OutputFormat;

const SLASH_HELP: &str = "\
Special Commands:
  /clear    - Clear conversation memory
  /stats    - Show memory statistics
  /info     - Show chatbot information
  /export   - Export conversation data
  /help     - Show this help
  /quit     - Exit chat mode";

#[derive(Parser, Debug, Default)]
pub struct ChatCommand {
    #[clap(long, short = 'o', help = "Directory for /export files (default: current directory)")]
    pub export_dir: Option<PathBuf>,
}

/// Commands available inside the chat loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Clear,
    Stats,
    Info,
    Export,
    Help,
    Quit,
    Unknown(String),
}

impl SlashCommand {
    /// Parse a line starting with `/`; anything else is not a command
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }

        Some(match line.to_lowercase().as_str() {
            "/clear" => SlashCommand::Clear,
            "/stats" => SlashCommand::Stats,
            "/info" => SlashCommand::Info,
            "/export" => SlashCommand::Export,
            "/help" => SlashCommand::Help,
            "/quit" | "/exit" => SlashCommand::Quit,
            _ => SlashCommand::Unknown(line.to_string()),
        })
    }
}

impl ChatCommand {
    pub async fn execute(&self, bot: &Chatbot, format: OutputFormat) -> CliResult<()> {
        let info = bot.describe();
        println!("Starting interactive chat with {}...", info.name);
        println!("Type '/help' for available commands");
        println!("{}", "-".repeat(60));

        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline("You: ") {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(input)?;

                    if let Some(command) = SlashCommand::parse(input) {
                        if command == SlashCommand::Quit {
                            println!("Goodbye!");
                            break;
                        }
                        match self.handle(bot, &command, format).await {
                            Ok(output) => println!("{output}"),
                            Err(e) => println!("Error: {e}"),
                        }
                        continue;
                    }

                    println!("Thinking...");
                    let outcome = bot.chat(input).await;
                    if outcome.success {
                        println!("{}: {}", info.name, outcome.response);
                        if let Some(stats) = outcome.memory_stats {
                            println!("Memory: {} messages in history", stats.total_messages);
                        }
                    } else {
                        println!("Error: {}", outcome.response);
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Run a slash command and return what to print
    pub async fn handle(
        &self,
        bot: &Chatbot,
        command: &SlashCommand,
        format: OutputFormat,
    ) -> CliResult<String> {
        match command {
            SlashCommand::Clear => ClearCommand::default().run(bot, format).await,
            SlashCommand::Stats => StatsCommand::default().run(bot, format).await,
            SlashCommand::Info => InfoCommand::default().run(bot, format),
            SlashCommand::Export => {
                ExportCommand {
                    dir: self.export_dir.clone(),
                }
                .run(bot, format)
                .await
            }
            SlashCommand::Help => Ok(SLASH_HELP.to_string()),
            SlashCommand::Quit => Ok("Goodbye!".to_string()),
            SlashCommand::Unknown(raw) => Ok(format!(
                "Unknown command: {raw}\nType '/help' for available commands"
            )),
        }
    }
}
