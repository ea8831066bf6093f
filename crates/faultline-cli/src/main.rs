//! Faultline CLI - Command-line interface for Faultline
//!
//! Provides commands for:
//! - Fetching the remote routing flag
//! - Dry-running (or sending) an error through the router
//! - Managing locally saved crash and error reports
//! - Viewing and validating configuration
//! - Testing the chat webhook

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faultline_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, flag::FlagCommand,
    report::ReportCommand, route::RouteCommand, webhook::WebhookCommand,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "faultline", version, about = "Error routing for crash reports and chat alerts")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch and print the remote routing flag
    Flag(FlagCommand),
    /// Show where an error would be routed, or route it
    Route(RouteCommand),
    /// Manage saved crash and error reports
    #[command(subcommand)]
    Report(ReportCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Chat webhook commands
    #[command(subcommand)]
    Webhook(WebhookCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Shared state handed to every command
pub struct CliContext {
    pub format: OutputFormat,
    pub config: Config,
    pub config_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_path) = load_config(cli.config.as_deref())?;

    // -v overrides the configured level; RUST_LOG overrides both
    let filter = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = CliContext {
        format: OutputFormat::from_flag(cli.json),
        config,
        config_path,
    };

    match cli.command {
        Commands::Flag(cmd) => cmd.execute(&ctx).await,
        Commands::Route(cmd) => cmd.execute(&ctx).await,
        Commands::Report(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Webhook(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute(&ctx).await,
    }
}

/// An explicit `--config` must load; the default path falls back to defaults.
fn load_config(explicit: Option<&std::path::Path>) -> Result<(Config, PathBuf)> {
    match explicit {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            Ok((config, path.to_path_buf()))
        }
        None => {
            let path = Config::default_path();
            Ok((Config::load_or_default(&path), path))
        }
    }
}
