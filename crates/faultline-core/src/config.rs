//! Configuration module for Faultline.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::BuildVariant;

/// Default location of the remote routing flag document.
pub const DEFAULT_REMOTE_CONFIG_URL: &str =
    "https://gist.githubusercontent.com/faultline-ops/routing-flag/raw/flag.json";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Faultline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub remote_config: RemoteConfigConfig,
    pub chat_webhook: ChatWebhookConfig,
    pub crash_reporting: CrashReportingConfig,
    pub logging: LoggingConfig,
}

/// Host application build metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name used in report file names and chat messages.
    pub name: String,
    /// Semantic version of the host build.
    pub version: String,
    /// Build number of the host build.
    pub build: String,
    /// Build variant: `development`, `staging`, or `release`.
    pub variant: BuildVariant,
}

/// Remote routing flag settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfigConfig {
    /// URL of the JSON document `{"isMoreData": bool}`.
    pub url: String,
}

/// Chat webhook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatWebhookConfig {
    /// Incoming webhook URL. `None` disables chat delivery.
    pub url: Option<String>,
    /// Channel override sent with each message.
    pub channel: Option<String>,
    /// PII stripping applied to messages before they leave the process.
    #[serde(default)]
    pub anonymize: AnonymizeConfig,
}

/// What to strip from outgoing report text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymizeConfig {
    pub strip_paths: bool,
    pub strip_usernames: bool,
    pub strip_filenames: bool,
}

/// Local crash backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashReportingConfig {
    /// Directory where crash and error reports are written.
    pub reports_dir: PathBuf,
    /// Component name recorded in each report.
    pub component: String,
    /// Number of breadcrumb lines kept and attached to each report.
    pub max_breadcrumbs: usize,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/faultline/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("faultline")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "faultline".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            build: "0".to_string(),
            variant: BuildVariant::Development,
        }
    }
}

impl Default for RemoteConfigConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REMOTE_CONFIG_URL.to_string(),
        }
    }
}

impl Default for AnonymizeConfig {
    fn default() -> Self {
        Self {
            strip_paths: true,
            strip_usernames: true,
            strip_filenames: false,
        }
    }
}

impl Default for CrashReportingConfig {
    fn default() -> Self {
        Self {
            reports_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("faultline")
                .join("reports"),
            component: "faultline".to_string(),
            max_breadcrumbs: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"remote_config.url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

fn is_http_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.has_host(),
        Err(_) => false,
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- app ---
        if self.app.name.trim().is_empty() {
            errors.push(ValidationError {
                field: "app.name".into(),
                message: "must not be empty".into(),
            });
        }
        if self.app.version.trim().is_empty() {
            errors.push(ValidationError {
                field: "app.version".into(),
                message: "must not be empty".into(),
            });
        }

        // --- remote_config ---
        if !is_http_url(&self.remote_config.url) {
            errors.push(ValidationError {
                field: "remote_config.url".into(),
                message: format!("must be an http(s) URL: '{}'", self.remote_config.url),
            });
        }

        // --- chat_webhook ---
        if let Some(url) = &self.chat_webhook.url {
            if !is_http_url(url) {
                errors.push(ValidationError {
                    field: "chat_webhook.url".into(),
                    message: format!("must be an http(s) URL: '{url}'"),
                });
            }
        }

        // --- crash_reporting ---
        if self.crash_reporting.component.trim().is_empty() {
            errors.push(ValidationError {
                field: "crash_reporting.component".into(),
                message: "must not be empty".into(),
            });
        }
        if self.crash_reporting.max_breadcrumbs == 0 {
            errors.push(ValidationError {
                field: "crash_reporting.max_breadcrumbs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use faultline_core::config::ConfigBuilder;
/// use faultline_core::domain::BuildVariant;
///
/// let config = ConfigBuilder::new()
///     .app_variant(BuildVariant::Release)
///     .chat_webhook_url("https://hooks.slack.com/services/T000/B000/XXXX")
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- app ---

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config.app.name = name.into();
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.config.app.version = version.into();
        self
    }

    pub fn app_build(mut self, build: impl Into<String>) -> Self {
        self.config.app.build = build.into();
        self
    }

    pub fn app_variant(mut self, variant: BuildVariant) -> Self {
        self.config.app.variant = variant;
        self
    }

    // --- remote_config ---

    pub fn remote_config_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote_config.url = url.into();
        self
    }

    // --- chat_webhook ---

    pub fn chat_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.config.chat_webhook.url = Some(url.into());
        self
    }

    pub fn chat_webhook_channel(mut self, channel: impl Into<String>) -> Self {
        self.config.chat_webhook.channel = Some(channel.into());
        self
    }

    pub fn chat_webhook_anonymize(mut self, anonymize: AnonymizeConfig) -> Self {
        self.config.chat_webhook.anonymize = anonymize;
        self
    }

    // --- crash_reporting ---

    pub fn crash_reports_dir(mut self, dir: PathBuf) -> Self {
        self.config.crash_reporting.reports_dir = dir;
        self
    }

    pub fn crash_component(mut self, component: impl Into<String>) -> Self {
        self.config.crash_reporting.component = component.into();
        self
    }

    pub fn crash_max_breadcrumbs(mut self, n: usize) -> Self {
        self.config.crash_reporting.max_breadcrumbs = n;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
