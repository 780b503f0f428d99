//! Mindbridge — entry point.
//!
//! # Commands
//!
//! - `mindbridge serve` (default) — MCP server on stdio
//! - `mindbridge providers` — print the configured-provider table

mod dispatch;
mod mcp;

use anyhow::Result;
use clap::{Parser, Subcommand};

use mindbridge_core::config::load_config;
use mindbridge_providers::ollama::OllamaProvider;
use mindbridge_providers::{ProviderRegistry, REASONING_MODELS};

use crate::mcp::McpServer;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Mindbridge — one question, many LLM vendors
#[derive(Parser)]
#[command(name = "mindbridge", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the MCP protocol on stdin/stdout
    Serve {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configured providers and their models
    Providers {
        /// Query the local Ollama daemon for its live tag list
        #[arg(long, default_value_t = false)]
        live: bool,

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
    // Optional .env next to the process; absence is not an error.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve { logs: false }) {
        Commands::Serve { logs } => {
            init_logging(logs);
            serve().await
        }
        Commands::Providers { live, logs } => {
            init_logging(logs);
            providers(live).await
        }
    }
}

async fn serve() -> Result<()> {
    let config = load_config();
    let registry = ProviderRegistry::from_config(&config);

    // Banner on stderr; stdout is the protocol stream.
    eprintln!("MindBridge MCP server running on stdio");
    eprintln!("Configured providers: {}", registry.provider_ids().join(", "));
    eprintln!("Available tools:");
    eprintln!("- getSecondOpinion: Get responses from various LLM providers");
    eprintln!("- listProviders: List all configured providers and their models");
    eprintln!("- listReasoningModels: List models optimized for reasoning tasks");

    McpServer::new(registry).run().await
}

async fn providers(live: bool) -> Result<()> {
    let config = load_config();
    let registry = ProviderRegistry::from_config(&config);

    println!("Configured providers:");
    for id in registry.provider_ids() {
        let reasoning = if registry.supports_reasoning_effort(id) {
            " (supports reasoning_effort)"
        } else {
            ""
        };
        println!("\n  {id}{reasoning}");

        let models = if id == "ollama" && live {
            match &config.ollama {
                Some(c) => OllamaProvider::new(c).live_models().await,
                None => vec![],
            }
        } else {
            registry.models_for(id)
        };

        if models.is_empty() {
            println!("    (any model accepted)");
        } else {
            for model in models {
                println!("    {model}");
            }
        }
    }

    println!("\nReasoning models: {}", REASONING_MODELS.join(", "));
    Ok(())
}

/// Initialize tracing/logging. Everything goes to stderr so the
/// JSON-RPC stream on stdout stays clean.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("mindbridge=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
