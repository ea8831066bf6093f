//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. The routing use cases depend on these
//! interfaces; implementations live in the remote and telemetry crates.
//!
//! ## Ports Overview
//!
//! - [`IFlagSource`] - The cached remote routing flag
//! - [`ICrashBackend`] - Crash-reporting backend (fatal/non-fatal records, session keys)
//! - [`IChatWebhook`] - Out-of-band chat channel for error messages

pub mod chat_webhook;
pub mod crash_backend;
pub mod flag_source;

pub use chat_webhook::IChatWebhook;
pub use crash_backend::ICrashBackend;
pub use flag_source::{IFlagSource, StaticFlagSource};
