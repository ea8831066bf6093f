//! Chat webhook port
//!
//! Out-of-band delivery of error messages to a chat channel. There is no
//! response contract beyond success or failure; a failure makes the router
//! fall back to the crash backend.

use crate::domain::ReportTag;

/// Port trait for forwarding errors to a chat channel
#[async_trait::async_trait]
pub trait IChatWebhook: Send + Sync {
    /// Sends an error with its optional stack trace
    ///
    /// # Arguments
    /// * `error` - Rendered error value
    /// * `stack_trace` - Stack trace text, if one was captured
    /// * `tag` - `"f"` for fatal or `"nf"` for non-fatal reports
    async fn send(&self, error: &str, stack_trace: Option<&str>, tag: ReportTag)
        -> anyhow::Result<()>;
}
