//! Quill CLI — entry point.
//!
//! # Commands
//!
//! - `quill chat` — interactive chat REPL with locally persisted conversations
//! - `quill serve [--bind ADDR]` — run the relay endpoint

mod controller;
mod helpers;
mod repl;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use quill_core::config::{load_config, Config};
use quill_core::render::PlainText;
use quill_core::store::ConversationStore;
use quill_core::utils;
use quill_gemini::GeminiClient;
use quill_server::{GeminiRelay, Relay};

use crate::controller::SessionController;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// ✒ Quill — a Gemini-backed chat client with local conversations
#[derive(Parser)]
#[command(name = "quill", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively (conversations persist under ~/.quill/)
    Chat {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Run the relay endpoint
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { logs } => {
            init_logging(logs);
            run_chat().await
        }
        Commands::Serve { bind, logs } => {
            init_logging(logs);
            run_serve(bind).await
        }
    }
}

// ─────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────

async fn run_chat() -> Result<()> {
    let config = load_config(None);
    let relay = build_relay(&config)?;

    let store = ConversationStore::load(utils::get_conversations_path());
    info!(conversations = store.conversations().len(), "store hydrated");

    let controller = SessionController::new(store, relay);
    repl::run(controller, &PlainText).await
}

async fn run_serve(bind: Option<String>) -> Result<()> {
    let config = load_config(None);
    let relay = build_relay(&config)?;

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    quill_server::http::serve(&bind, relay)
        .await
        .with_context(|| format!("relay endpoint failed on {bind}"))
}

/// Build the Gemini-backed relay from the loaded configuration.
fn build_relay(config: &Config) -> Result<Arc<dyn Relay>> {
    if !config.gemini.is_configured() {
        bail!(
            "No Gemini API key configured. Set GEMINI_API_KEY or add \
             `gemini.apiKey` to ~/.quill/config.json."
        );
    }

    let client = GeminiClient::new(&config.gemini, config.generation.clone());
    Ok(Arc::new(GeminiRelay::new(client)))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("quill=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
