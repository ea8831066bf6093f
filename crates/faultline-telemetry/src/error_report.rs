//! Non-fatal error report generation
//!
//! Captures recoverable errors (and chat webhook fallbacks) as lighter
//! reports without device information.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use faultline_core::domain::{ErrorEvent, ErrorOrigin};
use serde::{Deserialize, Serialize};

/// A structured error report (non-fatal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub id: String,
    pub timestamp: String,
    pub version: String,
    pub origin: ErrorOrigin,
    pub error_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// The event was classified fatal but recorded as non-fatal
    #[serde(default)]
    pub downgraded: bool,
    #[serde(default)]
    pub custom_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub breadcrumbs: Vec<String>,
}

impl ErrorReport {
    /// Create an error report from an event.
    pub fn from_event(version: &str, event: &ErrorEvent) -> Self {
        Self {
            id: event.id.to_string(),
            timestamp: event.timestamp.to_rfc3339(),
            version: version.to_string(),
            origin: event.origin,
            error_type: event.payload.kind.clone(),
            message: event.payload.to_string(),
            stack_trace: event.stack_trace.clone(),
            downgraded: event.is_fatal(),
            custom_keys: BTreeMap::new(),
            breadcrumbs: Vec::new(),
        }
    }

    /// Attach session keys and breadcrumbs.
    pub fn with_session(
        mut self,
        custom_keys: BTreeMap<String, String>,
        breadcrumbs: Vec<String>,
    ) -> Self {
        self.custom_keys = custom_keys;
        self.breadcrumbs = breadcrumbs;
        self
    }
}

/// Save an error report. File name: `error-{date}-{uuid8}.json`
pub fn save_error_report(reports_dir: &Path, report: &ErrorReport) -> anyhow::Result<PathBuf> {
    crate::store::write_report(reports_dir, "error", &report.id, report)
}
