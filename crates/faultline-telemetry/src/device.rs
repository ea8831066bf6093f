//! Device information collector
//!
//! Gathers non-identifying system information for crash reports and the
//! session annotations. Never includes hostname or username; the device
//! identifier is an application-specific hash of the machine id, so the
//! raw machine id never leaves the host.

use faultline_core::domain::UserContext;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const MACHINE_ID_PATHS: &[&str] = &["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Non-identifying device information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub os: String,
    pub kernel: String,
    pub arch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl DeviceInfo {
    /// Collect device information from the current system.
    ///
    /// `app_name` salts the device identifier so that two applications on
    /// the same host report different ids.
    pub fn collect(app_name: &str) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            kernel: read_kernel_version(),
            arch: std::env::consts::ARCH.to_string(),
            device_id: read_machine_id().map(|id| app_specific_id(app_name, &id)),
        }
    }

    /// Adds OS labels and the device id to a session context.
    ///
    /// A device id already present on the context is kept.
    pub fn annotate(&self, mut context: UserContext) -> UserContext {
        context = context
            .with_extra("os", self.os.clone())
            .with_extra("arch", self.arch.clone());
        if !self.kernel.is_empty() {
            context = context.with_extra("kernel", self.kernel.clone());
        }
        if context.device_id.is_none() {
            if let Some(id) = &self.device_id {
                context = context.with_device_id(id.clone());
            }
        }
        context
    }
}

fn read_kernel_version() -> String {
    std::fs::read_to_string("/proc/version")
        .ok()
        .and_then(|v| v.split_whitespace().nth(2).map(String::from))
        .unwrap_or_default()
}

fn read_machine_id() -> Option<String> {
    MACHINE_ID_PATHS
        .iter()
        .filter_map(|p| std::fs::read_to_string(p).ok())
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// First 32 hex characters of `sha256(app_name ":" machine_id)`
fn app_specific_id(app_name: &str, machine_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(app_name.as_bytes());
    hasher.update(b":");
    hasher.update(machine_id.as_bytes());
    let digest = hasher.finalize();

    digest
        .iter()
        .take(16)
        .map(|b| format!("{b:02x}"))
        .collect()
}
