use clap::Parser;
use membot::chat::Chatbot;

use crate::error::CliResult;
use crate::output::{OutputFormat, render_info};

#[derive(Parser, Debug, Default)]
pub struct InfoCommand {}

impl InfoCommand {
    pub fn run(&self, bot: &Chatbot, format: OutputFormat) -> CliResult<String> {
        render_info(&bot.describe(), format)
    }

    pub fn execute(&self, bot: &Chatbot, format: OutputFormat) -> CliResult<()> {
        println!("{}", self.run(bot, format)?);
        Ok(())
    }
}
