//! Local crash backend
//!
//! An [`ICrashBackend`] that keeps session keys and breadcrumbs in memory
//! and writes every record as a JSON report into the reports directory.
//! Fatal records become [`CrashReport`]s, non-fatal ones [`ErrorReport`]s.

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use faultline_core::config::{AppConfig, CrashReportingConfig};
use faultline_core::domain::ErrorEvent;
use faultline_core::ports::ICrashBackend;
use tracing::{debug, info};

use crate::crash_report::{save_crash_report, CrashReport};
use crate::device::DeviceInfo;
use crate::error_report::{save_error_report, ErrorReport};

/// File-backed crash backend
pub struct LocalCrashBackend {
    reports_dir: PathBuf,
    component: String,
    version: String,
    max_breadcrumbs: usize,
    device: DeviceInfo,
    enabled: AtomicBool,
    keys: Mutex<BTreeMap<String, String>>,
    breadcrumbs: Mutex<VecDeque<String>>,
}

impl LocalCrashBackend {
    /// Creates a backend writing to `reports_dir`; collection starts enabled.
    ///
    /// The device id in crash reports is salted with `component` unless
    /// [`with_device`](Self::with_device) replaces it.
    pub fn new(
        reports_dir: PathBuf,
        component: impl Into<String>,
        version: impl Into<String>,
        max_breadcrumbs: usize,
    ) -> Self {
        let component = component.into();
        Self {
            reports_dir,
            device: DeviceInfo::collect(&component),
            component,
            version: version.into(),
            max_breadcrumbs: max_breadcrumbs.max(1),
            enabled: AtomicBool::new(true),
            keys: Mutex::new(BTreeMap::new()),
            breadcrumbs: Mutex::new(VecDeque::new()),
        }
    }

    /// Creates a backend for the configured application.
    ///
    /// Collection starts enabled only for release builds, and the device id
    /// is salted with the application name, matching the session
    /// annotation.
    pub fn from_config(crash: &CrashReportingConfig, app: &AppConfig) -> Self {
        let backend = Self::new(
            crash.reports_dir.clone(),
            crash.component.clone(),
            app.version.clone(),
            crash.max_breadcrumbs,
        )
        .with_device(DeviceInfo::collect(&app.name));
        backend
            .enabled
            .store(app.variant.is_release(), Ordering::SeqCst);
        debug!(
            variant = %app.variant,
            enabled = backend.is_collection_enabled(),
            "Crash backend configured"
        );
        backend
    }

    /// Replaces the device information attached to crash reports
    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Snapshot of the session keys attached so far
    pub fn custom_keys(&self) -> BTreeMap<String, String> {
        self.keys.lock().map(|k| k.clone()).unwrap_or_default()
    }

    /// Snapshot of the breadcrumb log, oldest first
    pub fn breadcrumbs(&self) -> Vec<String> {
        self.breadcrumbs
            .lock()
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn write_crash(&self, event: &ErrorEvent) -> anyhow::Result<()> {
        let report = CrashReport::from_event(&self.component, &self.version, self.device.clone(), event)
            .with_session(self.custom_keys(), self.breadcrumbs());
        let path = save_crash_report(&self.reports_dir, &report)?;
        info!(event_id = %event.id, path = %path.display(), "Crash report saved");
        Ok(())
    }

    fn write_error(&self, event: &ErrorEvent) -> anyhow::Result<()> {
        let report = ErrorReport::from_event(&self.version, event)
            .with_session(self.custom_keys(), self.breadcrumbs());
        let path = save_error_report(&self.reports_dir, &report)?;
        debug!(event_id = %event.id, path = %path.display(), "Error report saved");
        Ok(())
    }

    fn collecting(&self, event: &ErrorEvent) -> bool {
        let enabled = self.is_collection_enabled();
        if !enabled {
            debug!(event_id = %event.id, "Collection disabled, dropping record");
        }
        enabled
    }
}

#[async_trait::async_trait]
impl ICrashBackend for LocalCrashBackend {
    async fn set_custom_key(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| anyhow::anyhow!("session keys lock poisoned"))?;
        keys.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn record_fatal(&self, event: &ErrorEvent) -> anyhow::Result<()> {
        if !self.collecting(event) {
            return Ok(());
        }
        self.write_crash(event)
    }

    async fn record_error(&self, event: &ErrorEvent, fatal: bool) -> anyhow::Result<()> {
        if !self.collecting(event) {
            return Ok(());
        }
        if fatal {
            self.write_crash(event)
        } else {
            self.write_error(event)
        }
    }

    async fn log(&self, message: &str) -> anyhow::Result<()> {
        let mut crumbs = self
            .breadcrumbs
            .lock()
            .map_err(|_| anyhow::anyhow!("breadcrumb lock poisoned"))?;
        while crumbs.len() >= self.max_breadcrumbs {
            crumbs.pop_front();
        }
        crumbs.push_back(message.to_string());
        Ok(())
    }

    async fn set_collection_enabled(&self, enabled: bool) -> anyhow::Result<()> {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "Crash collection toggled");
        Ok(())
    }

    fn is_collection_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}
