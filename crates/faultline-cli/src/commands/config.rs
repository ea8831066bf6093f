//! Config command - View and manage Faultline configuration
//!
//! Provides the `faultline config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use faultline_core::config::Config;
use faultline_core::domain::BuildVariant;
use tracing::info;

use crate::output::{get_formatter, OutputFormatter};
use crate::CliContext;

/// Keys accepted by `config set`
const SUPPORTED_KEYS: &[(&str, &str)] = &[
    ("app.name", "Application name"),
    ("app.version", "Application version"),
    ("app.build", "Build number"),
    ("app.variant", "development|staging|release"),
    ("remote_config.url", "Remote flag document URL"),
    ("chat_webhook.url", "Incoming webhook URL (empty to unset)"),
    ("chat_webhook.channel", "Channel override (empty to unset)"),
    ("chat_webhook.anonymize.strip_paths", "true|false"),
    ("chat_webhook.anonymize.strip_usernames", "true|false"),
    ("chat_webhook.anonymize.strip_filenames", "true|false"),
    ("crash_reporting.reports_dir", "Directory for saved reports"),
    ("crash_reporting.component", "Component name in crash reports"),
    ("crash_reporting.max_breadcrumbs", "Breadcrumbs kept per session"),
    ("logging.level", "trace|debug|info|warn|error"),
];

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "chat_webhook.url")
        key: String,
        /// New value
        value: String,
    },
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        match self {
            ConfigCommand::Show => execute_show(formatter.as_ref(), ctx),
            ConfigCommand::Set { key, value } => {
                execute_set(formatter.as_ref(), ctx, key, value)
            }
            ConfigCommand::Validate => execute_validate(formatter.as_ref(), ctx),
        }
    }
}

fn execute_show(formatter: &dyn OutputFormatter, ctx: &CliContext) -> Result<()> {
    info!(config_path = %ctx.config_path.display(), "Showing configuration");

    if ctx.format.is_json() {
        let json = serde_json::to_value(&ctx.config)
            .context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
        return Ok(());
    }

    formatter.success(&format!("Configuration ({})", ctx.config_path.display()));
    if !ctx.config_path.exists() {
        formatter.info("(file not found, showing defaults)");
    }
    formatter.info("");

    let yaml =
        serde_yaml::to_string(&ctx.config).context("Failed to serialize configuration to YAML")?;
    for line in yaml.lines() {
        formatter.info(line);
    }
    Ok(())
}

fn execute_set(
    formatter: &dyn OutputFormatter,
    ctx: &CliContext,
    key: &str,
    value: &str,
) -> Result<()> {
    let mut config = ctx.config.clone();
    info!(key = %key, value = %value, "Setting configuration value");

    if let Err(e) = apply_config_value(&mut config, key, value) {
        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": false,
                "key": key,
                "error": format!("{e:#}"),
            }));
        } else {
            formatter.error(&format!("Failed to set '{}': {:#}", key, e));
            formatter.info("");
            formatter.info("Supported keys:");
            for (name, help) in SUPPORTED_KEYS {
                formatter.info(&format!("  {:<40} {}", name, help));
            }
        }
        return Ok(());
    }

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        if ctx.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": false,
                "key": key,
                "errors": messages,
            }));
        } else {
            formatter.error(&format!("Invalid value for '{}': {}", key, messages.join("; ")));
        }
        return Ok(());
    }

    save_config(&config, &ctx.config_path)?;

    if ctx.format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "key": key,
            "value": value,
            "config_path": ctx.config_path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Set {} = {}", key, value));
        formatter.info(&format!("Saved to {}", ctx.config_path.display()));
    }
    Ok(())
}

fn execute_validate(formatter: &dyn OutputFormatter, ctx: &CliContext) -> Result<()> {
    let config_path = &ctx.config_path;

    // Load the file explicitly: a missing or unparsable file is reported, not defaulted
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            let message = if config_path.exists() {
                format!("Failed to parse configuration: {e:#}")
            } else {
                "Configuration file not found; defaults are in effect".to_string()
            };
            if ctx.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": [message],
                }));
            } else {
                formatter.error(&message);
                formatter.info(&format!("File: {}", config_path.display()));
            }
            return Ok(());
        }
    };

    info!(config_path = %config_path.display(), "Validating configuration");
    let errors = config.validate();

    if ctx.format.is_json() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": messages,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {}", config_path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        formatter.info(&format!("File: {}", config_path.display()));
        for error in &errors {
            formatter.info(&format!("  {} - {}", error.field, error.message));
        }
    }
    Ok(())
}

fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    std::fs::write(path, yaml).context("Failed to write configuration file")?;
    Ok(())
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .with_context(|| format!("Expected true or false for {key}"))
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        // --- app ---
        "app.name" => config.app.name = value.to_string(),
        "app.version" => config.app.version = value.to_string(),
        "app.build" => config.app.build = value.to_string(),
        "app.variant" => {
            config.app.variant = value
                .parse::<BuildVariant>()
                .context("Expected development, staging or release")?;
        }

        // --- remote_config ---
        "remote_config.url" => config.remote_config.url = value.to_string(),

        // --- chat_webhook ---
        "chat_webhook.url" => config.chat_webhook.url = optional(value),
        "chat_webhook.channel" => config.chat_webhook.channel = optional(value),
        "chat_webhook.anonymize.strip_paths" => {
            config.chat_webhook.anonymize.strip_paths = parse_bool(key, value)?;
        }
        "chat_webhook.anonymize.strip_usernames" => {
            config.chat_webhook.anonymize.strip_usernames = parse_bool(key, value)?;
        }
        "chat_webhook.anonymize.strip_filenames" => {
            config.chat_webhook.anonymize.strip_filenames = parse_bool(key, value)?;
        }

        // --- crash_reporting ---
        "crash_reporting.reports_dir" => {
            config.crash_reporting.reports_dir = PathBuf::from(value);
        }
        "crash_reporting.component" => config.crash_reporting.component = value.to_string(),
        "crash_reporting.max_breadcrumbs" => {
            config.crash_reporting.max_breadcrumbs = value
                .parse::<usize>()
                .context("Expected a positive integer for crash_reporting.max_breadcrumbs")?;
        }

        // --- logging ---
        "logging.level" => config.logging.level = value.to_string(),

        _ => anyhow::bail!("Unknown configuration key '{key}'"),
    }
    Ok(())
}
