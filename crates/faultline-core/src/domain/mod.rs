//! Domain entities and routing policy
//!
//! This module contains the core domain types for Faultline:
//! - The remotely fetched routing flag
//! - Error events and their classification
//! - Build variants and session user context
//! - The pure routing policy (noise filters and routing decisions)
//! - Domain-specific error types

pub mod context;
pub mod errors;
pub mod event;
pub mod flag;
pub mod policy;
pub mod variant;

// Re-export commonly used types
pub use context::UserContext;
pub use errors::DomainError;
pub use event::{ErrorEvent, ErrorOrigin, ErrorPayload, ReportTag, Severity};
pub use flag::RemoteFlag;
pub use policy::{decide, suppression_for, NoiseFilter, RoutingDecision};
pub use variant::BuildVariant;
