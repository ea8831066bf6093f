//! Remote routing flag
//!
//! The single boolean fetched once per process from the remote config
//! document. Its JSON form is `{"isMoreData": bool}`.

use serde::{Deserialize, Serialize};

/// Remotely controlled routing flag
///
/// Defaults to `is_more_data = false`, which is also the value used whenever
/// the remote document cannot be fetched or parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteFlag {
    /// When set, reports are kept away from the crash backend and
    /// isolated-worker errors are forwarded to the chat webhook.
    #[serde(rename = "isMoreData", default)]
    pub is_more_data: bool,
}

impl RemoteFlag {
    /// Creates a flag with the given value
    pub fn new(is_more_data: bool) -> Self {
        Self { is_more_data }
    }
}

impl std::fmt::Display for RemoteFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "isMoreData={}", self.is_more_data)
    }
}
