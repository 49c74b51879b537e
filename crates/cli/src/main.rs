//! ragpack CLI
//!
//! Main entry point for the ragpack command-line tool.
//! Builds, inspects and queries portable `.rag` packs.

mod commands;
mod sources;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use commands::{
    AskCommand, Context, CreateCommand, InfoCommand, Overrides, QueryCommand, RebuildCommand,
};
use ragpack_core::{config::AppConfig, logging, ProviderSpec};
use std::path::PathBuf;

/// ragpack - portable, optionally encrypted RAG packs
#[derive(Parser, Debug)]
#[command(name = "ragpack")]
#[command(about = "Build and query portable RAG packs", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "RAGPACK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Embedding provider as provider:model (e.g. ollama:nomic-embed-text)
    #[arg(short, long, global = true)]
    embedding: Option<ProviderSpec>,

    /// Embedding dimensionality
    #[arg(long, global = true)]
    dimensions: Option<usize>,

    /// LLM provider as provider:model (e.g. openai:gpt-4o-mini)
    #[arg(short, long, global = true)]
    llm: Option<ProviderSpec>,

    /// Pack password
    #[arg(long, global = true, env = "RAGPACK_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a pack from source files
    Create(CreateCommand),

    /// Show a pack's manifest
    Info(InfoCommand),

    /// Retrieve the most similar chunks
    Query(QueryCommand),

    /// Answer a question from a pack
    Ask(AskCommand),

    /// Re-embed a pack with another embedding provider
    Rebuild(RebuildCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let overrides = Overrides {
        embedding: cli.embedding.clone(),
        dimensions: cli.dimensions,
        llm: cli.llm.clone(),
    };
    let config = config.with_overrides(
        cli.embedding,
        cli.dimensions,
        cli.llm,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("ragpack CLI starting");
    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Embedding: {} ({}d)", config.embedding, config.embedding_dimensions);
    tracing::debug!("LLM: {}", config.llm);

    let command_name = match &cli.command {
        Commands::Create(_) => "create",
        Commands::Info(_) => "info",
        Commands::Query(_) => "query",
        Commands::Ask(_) => "ask",
        Commands::Rebuild(_) => "rebuild",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let ctx = Context {
        config,
        overrides,
        password: cli.password,
    };

    let result = match cli.command {
        Commands::Create(cmd) => cmd.execute(&ctx).await,
        Commands::Info(cmd) => cmd.execute().await,
        Commands::Query(cmd) => cmd.execute(&ctx).await,
        Commands::Ask(cmd) => cmd.execute(&ctx).await,
        Commands::Rebuild(cmd) => cmd.execute(&ctx).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
