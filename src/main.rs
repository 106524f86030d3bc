//! Task Board Server
//!
//! Kanban-style task board: a board UI backed by a CRUD API over SQLite,
//! with an LLM chat assistant that creates, assigns, and deletes tasks
//! from natural-language commands.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use taskboard::assistant::{Assistant, provider::provider_from_config};
use taskboard::config::Config;
use taskboard::db::Database;
use taskboard::server::{AppState, serve};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Kanban task board server with an AI assistant")]
struct Cli {
    /// Path to a YAML config file (default: .taskboard/config.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the SQLite database file (overrides config).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Port to listen on (overrides config).
    #[arg(long)]
    port: Option<u16>,

    /// Log filter, e.g. "info" or "taskboard=debug".
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seed a demo team into an empty users table and exit.
    #[arg(long)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => {
            let mut c = Config::load(path)?;
            c.apply_env();
            c
        }
        None => Config::load_or_default(),
    };

    if let Some(db_path) = cli.db_path {
        config.server.db_path = db_path;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)?;
    info!(path = %config.server.db_path.display(), "opened task database");

    if cli.seed_demo {
        let seeded = db.seed_demo_users()?;
        info!(seeded, "demo users seeded");
        return Ok(());
    }

    let assistant = match provider_from_config(&config.ai) {
        Ok(provider) => {
            info!(provider = provider.name(), "assistant enabled");
            Some(Assistant::new(db.clone(), provider))
        }
        Err(err) => {
            warn!("assistant disabled: {}", err);
            None
        }
    };

    serve(AppState::new(db, assistant), config.server.port).await
}
