use clap::Parser;
use membot::chat::Chatbot;
use membot::memory::export::EXPORT_FAILED_MESSAGE;
use std::path::PathBuf;

use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, render_export_summary};

#[derive(Parser, Debug, Default)]
pub struct ExportCommand {
    #[clap(long, short = 'o', help = "Directory to write the export file to (default: current directory)")]
    pub dir: Option<PathBuf>,
}

impl ExportCommand {
    pub async fn run(&self, bot: &Chatbot, format: OutputFormat) -> CliResult<String> {
        let dir = self.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let export = bot.export().await;

        let path = export.save_to_dir(&dir).map_err(|e| {
            tracing::error!("Error exporting conversation: {e}");
            CliError(EXPORT_FAILED_MESSAGE.to_string())
        })?;

        match format {
            OutputFormat::Json => Ok(serde_json::json!({
                "path": path.display().to_string(),
                "messages": export.messages.len(),
            })
            .to_string()),
            OutputFormat::Table => Ok(render_export_summary(&export, &path.display().to_string())),
        }
    }

    pub async fn execute(&self, bot: &Chatbot, format: OutputFormat) -> CliResult<()> {
        println!("{}", self.run(bot, format).await?);
        Ok(())
    }
}
