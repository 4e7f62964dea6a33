//! Membot Daemon - HTTP API for conversational sessions with memory

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use membot::config::Config;
use membot::error::Result;
use membot::web::{AppState, WebServer};

/// Membot - A chatbot that remembers the conversation
#[derive(Parser)]
#[command(name = "membot")]
#[command(about = "A conversational assistant with windowed memory and a running summary")]
#[command(version)]
pub struct Cli {
    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the web server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,membot=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting Membot daemon");

    let config = Config::load(config_path.as_deref())?;
    tracing::debug!(
        "Config loaded: model={}, window_size={}, max_input_length={}",
        config.llm.model,
        config.memory.window_size,
        config.security.max_input_length
    );

    let state = Arc::new(AppState::from_config(&config)?);
    let server = WebServer::new(&config, state);
    server.serve().await?;

    tracing::info!("Membot daemon stopped");
    Ok(())
}
