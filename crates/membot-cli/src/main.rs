use std::path::PathBuf;

use clap::{Parser, Subcommand};
use membot::chat::Chatbot;
use membot::config::Config;
use membot_cli::commands::{ChatCommand, ClearCommand, ExportCommand, InfoCommand, StatsCommand};
use membot_cli::error::CliResult;
use membot_cli::output::OutputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "membot-cli")]
#[command(about = "Membot CLI - Chat with a memory-enabled assistant from the terminal")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Start interactive chat mode (default)")]
    Chat(ChatCommand),

    #[clap(about = "Show chatbot information")]
    Info(InfoCommand),

    #[clap(about = "Show memory statistics")]
    Stats(StatsCommand),

    #[clap(about = "Clear conversation memory")]
    Clear(ClearCommand),

    #[clap(about = "Export conversation data to a JSON file")]
    Export(ExportCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let config = Config::load(cli.config.as_deref())?;
    let bot = Chatbot::from_config(&config)?;

    match cli.command {
        None => ChatCommand::default().execute(&bot, format).await,
        Some(Command::Chat(cmd)) => cmd.execute(&bot, format).await,
        Some(Command::Info(cmd)) => cmd.execute(&bot, format),
        Some(Command::Stats(cmd)) => cmd.execute(&bot, format).await,
        Some(Command::Clear(cmd)) => cmd.execute(&bot, format).await,
        Some(Command::Export(cmd)) => cmd.execute(&bot, format).await,
    }
}

/// Logs go to stderr and default to warnings so they stay out of the chat
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
