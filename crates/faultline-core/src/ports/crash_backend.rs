//! Crash-reporting backend port (driven/secondary port)
//!
//! This module defines the interface to a crash-reporting service:
//! session annotations, fatal and non-fatal error records, lightweight
//! breadcrumbs and the collection toggle.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because delivery failures are adapter-specific.
//! - Callers on the reporting path log and swallow these errors.
//! - When collection is disabled, implementations accept records and drop
//!   them without error.

use crate::domain::ErrorEvent;

/// Port trait for the crash-reporting backend
#[async_trait::async_trait]
pub trait ICrashBackend: Send + Sync {
    /// Attaches a labelled key/value pair to the current session
    async fn set_custom_key(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Records an unrecoverable error
    async fn record_fatal(&self, event: &ErrorEvent) -> anyhow::Result<()>;

    /// Records an error with an explicit fatal flag
    ///
    /// The router uses `fatal = false` for the chat webhook fallback even
    /// when the event itself was classified fatal.
    async fn record_error(&self, event: &ErrorEvent, fatal: bool) -> anyhow::Result<()>;

    /// Appends a breadcrumb line to the session log
    async fn log(&self, message: &str) -> anyhow::Result<()>;

    /// Enables or disables collection of reports
    async fn set_collection_enabled(&self, enabled: bool) -> anyhow::Result<()>;

    /// Whether reports are currently being collected
    fn is_collection_enabled(&self) -> bool;
}
