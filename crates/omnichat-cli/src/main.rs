//! OmniChat CLI — entry point.
//!
//! # Commands
//!
//! - `omnichat chat [-m MESSAGE]` — main chat (single-shot or REPL)
//! - `omnichat history <show|clear|clear-role|clear-range|clear-id>`
//! - `omnichat onboard` — initialize config + tool catalog
//! - `omnichat status` — show configuration and catalog state

mod helpers;
mod history_cmd;
mod onboard;
mod repl;
mod status;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use omnichat_adapters::{CalendarAdapter, GmailAdapter};
use omnichat_core::adapter::ToolAdapter;
use omnichat_core::config::{load_config, Config};
use omnichat_core::store::{CatalogStore, HistoryStore};
use omnichat_core::types::Role;
use omnichat_orchestrator::{Orchestrator, ToolDispatcher, ToolRegistry};
use omnichat_providers::{GeminiClient, ModelClient};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// OmniChat — a tool-calling chat assistant
#[derive(Parser)]
#[command(name = "omnichat", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Context window override (number of recent messages)
        #[arg(long)]
        limit: Option<usize>,

        /// Clear stored history before starting
        #[arg(long, default_value_t = false)]
        fresh: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Manage the stored conversation history
    History {
        #[command(subcommand)]
        action: history_cmd::HistoryCommands,
    },

    /// Initialize configuration and the tool catalog
    Onboard,

    /// Show configuration and catalog state
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            limit,
            fresh,
            logs,
        } => {
            init_logging(logs);
            run_chat(message, limit, fresh).await
        }
        Commands::History { action } => {
            init_logging(false);
            let config = load_config(None);
            let path = db_path(&config);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let history = HistoryStore::open(&path)?;
            history_cmd::dispatch(action, &history)
        }
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

/// Everything a chat session needs: the durable history plus the
/// orchestrator over the registered tools.
pub struct Runtime {
    pub history: HistoryStore,
    pub orchestrator: Orchestrator,
    pub context_window: usize,
}

async fn run_chat(message: Option<String>, limit: Option<usize>, fresh: bool) -> Result<()> {
    let config = load_config(None);
    let mut runtime = build_runtime(&config)?;
    if let Some(limit) = limit {
        runtime.context_window = limit;
    }

    if fresh {
        runtime.history.clear()?;
        info!("cleared stored history");
    }

    match message {
        Some(msg) => {
            // Single-shot mode: same persistence contract as the REPL.
            runtime.history.append(Role::User, &msg)?;
            let context = runtime.history.recent(runtime.context_window * 2)?;
            let response = runtime.orchestrator.process_message(&context).await;
            runtime.history.append(Role::Assistant, &response)?;
            helpers::print_response(&response);
        }
        None => {
            repl::run(&runtime).await?;
        }
    }

    Ok(())
}

/// Resolve the SQLite database path from config.
pub fn db_path(config: &Config) -> PathBuf {
    config
        .history
        .db_path
        .as_deref()
        .map(helpers::expand_tilde)
        .unwrap_or_else(omnichat_core::utils::get_default_db_path)
}

/// Wire stores, registry, dispatcher, model client, and orchestrator
/// from the loaded configuration.
pub fn build_runtime(config: &Config) -> Result<Runtime> {
    let path = db_path(config);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let history = HistoryStore::open(&path)
        .with_context(|| format!("failed to open history store at {}", path.display()))?;
    let catalog = CatalogStore::open(&path)?;

    // Idempotent; keeps the catalog current even if `onboard` never ran.
    catalog.register_descriptor(&CalendarAdapter::descriptor())?;
    catalog.register_descriptor(&GmailAdapter::descriptor())?;

    let registry = Arc::new(ToolRegistry::load(&catalog)?);

    let google_calendar = config.google.clone();
    let google_gmail = config.google.clone();
    let dispatcher = ToolDispatcher::new(registry.clone())
        .with_tool_timeout(Duration::from_secs(config.orchestrator.tool_timeout_secs))
        .with_factory(CalendarAdapter::NAME, move || {
            Ok(Arc::new(CalendarAdapter::from_config(&google_calendar)?) as Arc<dyn ToolAdapter>)
        })
        .with_factory(GmailAdapter::NAME, move || {
            Ok(Arc::new(GmailAdapter::from_config(&google_gmail)?) as Arc<dyn ToolAdapter>)
        });

    let client = Arc::new(GeminiClient::new(&config.model)?);
    info!(model = client.model(), tools = registry.len(), "runtime ready");

    let mut orchestrator = Orchestrator::new(client, registry, dispatcher)
        .with_max_rounds(config.orchestrator.max_rounds);
    if let Some(system_prompt) = &config.orchestrator.system_prompt {
        orchestrator = orchestrator.with_system_prompt(system_prompt);
    }

    Ok(Runtime {
        history,
        orchestrator,
        context_window: config.history.context_window,
    })
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("omnichat=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
