//! Routing policy
//!
//! Pure functions deciding what happens to an [`ErrorEvent`]: whether it is
//! environment noise that no backend should see, and otherwise which of the
//! two backends receive it. Nothing here performs I/O, so the whole policy is
//! testable without a network.
//!
//! ## Routing table
//!
//! | Origin          | Crash backend    | Chat webhook           |
//! |-----------------|------------------|------------------------|
//! | Framework       | `!is_more_data`  | always                 |
//! | AsyncUncaught   | `!is_more_data`  | development builds     |
//! | IsolatedWorker  | `!is_more_data`  | `is_more_data`         |

use serde::{Deserialize, Serialize};

use super::{
    event::{ErrorEvent, ErrorOrigin},
    flag::RemoteFlag,
    variant::BuildVariant,
};

/// Library tag used by the framework's image loading service
pub const IMAGE_RESOURCE_LIBRARY: &str = "image resource service";

/// Error kind raised by platform channels (camera, scanner, ...)
pub const PLATFORM_EXCEPTION_KIND: &str = "PlatformException";

/// Code and message of the camera exception raised on devices without a scanner
pub const NO_SCANNER_CODE: &str = "404";
pub const NO_SCANNER_MESSAGE: &str = "No barcode scanner found";

/// Error kind raised when a network image fails to load
pub const NETWORK_IMAGE_LOAD_KIND: &str = "NetworkImageLoadException";

/// Where a single event should be delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub send_to_crash_backend: bool,
    pub send_to_chat_webhook: bool,
}

impl RoutingDecision {
    /// Returns true when neither backend is selected
    pub fn is_empty(&self) -> bool {
        !self.send_to_crash_backend && !self.send_to_chat_webhook
    }
}

impl std::fmt::Display for RoutingDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "crash_backend={} chat_webhook={}",
            self.send_to_crash_backend, self.send_to_chat_webhook
        )
    }
}

/// Known environment-noise errors that are dropped before routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseFilter {
    /// Framework error reported by the image resource service
    ImageResourceService,
    /// Camera exception on devices without a barcode scanner
    BarcodeScannerMissing,
    /// Network image load failure delivered on the isolated-worker channel
    NetworkImageLoad,
}

impl NoiseFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseFilter::ImageResourceService => "image_resource_service",
            NoiseFilter::BarcodeScannerMissing => "barcode_scanner_missing",
            NoiseFilter::NetworkImageLoad => "network_image_load",
        }
    }
}

impl std::fmt::Display for NoiseFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the noise filter matching `event`, if any
pub fn suppression_for(event: &ErrorEvent) -> Option<NoiseFilter> {
    let payload = &event.payload;

    if payload.kind == PLATFORM_EXCEPTION_KIND
        && payload.code.as_deref() == Some(NO_SCANNER_CODE)
        && payload.message == NO_SCANNER_MESSAGE
    {
        return Some(NoiseFilter::BarcodeScannerMissing);
    }

    match event.origin {
        ErrorOrigin::Framework if payload.library.as_deref() == Some(IMAGE_RESOURCE_LIBRARY) => {
            Some(NoiseFilter::ImageResourceService)
        }
        ErrorOrigin::IsolatedWorker if payload.kind == NETWORK_IMAGE_LOAD_KIND => {
            Some(NoiseFilter::NetworkImageLoad)
        }
        _ => None,
    }
}

/// Computes the routing decision for an event
///
/// The mapping from `is_more_data` to "keep away from the crash backend" is
/// taken as given.
pub fn decide(event: &ErrorEvent, flag: RemoteFlag, variant: BuildVariant) -> RoutingDecision {
    let send_to_chat_webhook = match event.origin {
        ErrorOrigin::Framework => true,
        ErrorOrigin::IsolatedWorker => flag.is_more_data,
        ErrorOrigin::AsyncUncaught => variant.is_development(),
    };

    RoutingDecision {
        send_to_crash_backend: !flag.is_more_data,
        send_to_chat_webhook,
    }
}
