//! Faultline Telemetry - Error hooks and local reporting
//!
//! Provides:
//! - `install_error_hooks`: panic, async and worker hooks feeding the router
//! - `LocalCrashBackend`: file-backed crash backend
//! - `CrashReport` / `ErrorReport`: fatal and non-fatal report files
//! - `Anonymizer`: PII stripping for outgoing report text
//! - `DeviceInfo`: non-identifying device annotations
//! - `MetricsRegistry`: Prometheus counters for routing outcomes
//! - `LocalReportStore`: File-based report management

pub mod anonymizer;
pub mod backend;
pub mod crash_report;
pub mod device;
pub mod error_report;
pub mod hooks;
pub mod metrics;
pub mod store;

pub use anonymizer::Anonymizer;
pub use backend::LocalCrashBackend;
pub use crash_report::{save_crash_report, CrashReport};
pub use device::DeviceInfo;
pub use error_report::{save_error_report, ErrorReport};
pub use hooks::{install_error_hooks, ErrorHooks, HookError, WorkerErrorPort};
pub use metrics::MetricsRegistry;
pub use store::{LocalReportStore, ReportEntry, ReportKind};
