//! Remote flag source port
//!
//! The router reads the routing flag through this interface instead of
//! touching process-wide state. Implementations must be infallible from
//! the caller's point of view: any failure degrades to
//! [`RemoteFlag::default`].

use crate::domain::RemoteFlag;

/// Port trait for the once-per-process routing flag
#[async_trait::async_trait]
pub trait IFlagSource: Send + Sync {
    /// Returns the cached flag, initializing it on first use
    async fn flag(&self) -> RemoteFlag;
}

/// A flag source that always returns the same value
///
/// Used for offline runs and dry-run routing.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFlagSource(pub RemoteFlag);

impl StaticFlagSource {
    pub fn new(is_more_data: bool) -> Self {
        Self(RemoteFlag::new(is_more_data))
    }
}

#[async_trait::async_trait]
impl IFlagSource for StaticFlagSource {
    async fn flag(&self) -> RemoteFlag {
        self.0
    }
}
