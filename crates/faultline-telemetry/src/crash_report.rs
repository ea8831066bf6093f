//! Crash report generation and persistence
//!
//! Turns fatal error events into structured JSON reports and saves them to
//! `~/.local/share/faultline/reports/` (or the configured directory).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use faultline_core::domain::{ErrorEvent, ErrorOrigin};
use serde::{Deserialize, Serialize};

use crate::device::DeviceInfo;

/// A structured crash report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashReport {
    pub id: String,
    pub timestamp: String,
    pub version: String,
    pub component: String,
    pub origin: ErrorOrigin,
    pub error_type: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    pub backtrace: String,
    #[serde(default)]
    pub custom_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub breadcrumbs: Vec<String>,
    pub device: DeviceInfo,
}

impl CrashReport {
    /// Create a crash report from a fatal event.
    ///
    /// The report id is the event id, so a report can be traced back to
    /// the routing log lines of the same event.
    pub fn from_event(
        component: &str,
        version: &str,
        device: DeviceInfo,
        event: &ErrorEvent,
    ) -> Self {
        Self {
            id: event.id.to_string(),
            timestamp: event.timestamp.to_rfc3339(),
            version: version.to_string(),
            component: component.to_string(),
            origin: event.origin,
            error_type: event.payload.kind.clone(),
            message: event.payload.message.clone(),
            code: event.payload.code.clone(),
            library: event.payload.library.clone(),
            backtrace: event.stack_trace.clone().unwrap_or_default(),
            custom_keys: BTreeMap::new(),
            breadcrumbs: Vec::new(),
            device,
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

/// Save a crash report to the reports directory.
///
/// Creates the directory if needed. File name: `crash-{date}-{uuid8}.json`
pub fn save_crash_report(reports_dir: &Path, report: &CrashReport) -> anyhow::Result<PathBuf> {
    crate::store::write_report(reports_dir, "crash", &report.id, report)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use faultline_core::domain::ErrorPayload;

    use super::*;

    fn device() -> DeviceInfo {
        DeviceInfo::collect("fieldapp")
    }

    fn fatal_event() -> ErrorEvent {
        ErrorEvent::framework(
            ErrorPayload::new("panic", "index out of bounds").with_library("widgets"),
            Some("0: main\n1: start".into()),
        )
    }

    #[test]
    fn test_crash_report_from_event() {
        let event = fatal_event();
        let report = CrashReport::from_event("scanner", "1.2.3", device(), &event);
        assert_eq!(report.id, event.id.to_string());
        assert_eq!(report.component, "scanner");
        assert_eq!(report.version, "1.2.3");
        assert_eq!(report.device, device());
        assert_eq!(report.origin, ErrorOrigin::Framework);
        assert_eq!(report.error_type, "panic");
        assert_eq!(report.library.as_deref(), Some("widgets"));
        assert!(report.backtrace.contains("1: start"));
    }

    #[test]
    fn test_save_crash_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut keys = BTreeMap::new();
        keys.insert("user_id".to_string(), "u-1".to_string());
        let report = CrashReport::from_event("fieldapp", "1.0.0", device(), &fatal_event())
            .with_session(keys, vec!["opened scanner".into()]);

        let path = save_crash_report(dir.path(), &report).unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("crash-"));
        assert!(name.ends_with(&format!("{}.json", &report.id[..8])));

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: CrashReport = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.message, "index out of bounds");
        assert_eq!(loaded.custom_keys["user_id"], "u-1");
        assert_eq!(loaded.breadcrumbs, vec!["opened scanner".to_string()]);
    }

    #[test]
    fn test_timestamp_taken_from_event() {
        let event = fatal_event();
        let report = CrashReport::from_event("c", "v", device(), &event);
        let parsed = chrono::DateTime::parse_from_rfc3339(&report.timestamp).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), event.timestamp);
    }
}
