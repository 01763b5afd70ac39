//! TaxGPT CLI
//!
//! Main entry point for the taxgpt command-line tool: answers Indian income
//! tax questions from the terminal or over HTTP.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, ServeCommand};
use std::path::PathBuf;
use taxgpt_core::logging::{self, LogFormat};
use taxgpt_core::AppConfig;

/// TaxGPT - retrieval-augmented answers to Indian income tax questions
#[derive(Parser, Debug)]
#[command(name = "taxgpt")]
#[command(about = "Retrieval-augmented answers to Indian income tax questions", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "TAXGPT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "TAXGPT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log output format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (openai, ollama)
    #[arg(short, long, global = true, env = "TAXGPT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "TAXGPT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a tax question
    Ask(AskCommand),

    /// Serve the question-answering API over HTTP
    Serve(ServeCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // The workspace decides which .taxgpt/config.yaml is read
    let config = AppConfig::load_for(cli.workspace.as_deref())
        .context("Failed to load configuration")?;

    // A config file named on the command line is merged on top
    let config = match cli.config {
        Some(ref path) => config
            .merge_yaml(path)
            .with_context(|| format!("Failed to load config file {:?}", path))?,
        None => config,
    };

    let mut config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    logging::init_logging(
        config.log_level.as_deref(),
        config.no_color,
        LogFormat::parse(&config.log_format),
    )
    .context("Failed to initialize logging")?;

    tracing::info!("TaxGPT CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate().context("Invalid configuration")?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Serve(_) => "serve",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    Ok(result?)
}
