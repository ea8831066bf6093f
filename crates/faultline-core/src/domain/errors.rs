//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mostly parse failures for the textual forms of domain enums.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Unknown build variant name
    #[error("Invalid build variant: {0}")]
    InvalidVariant(String),

    /// Unknown error origin name
    #[error("Invalid error origin: {0}")]
    InvalidOrigin(String),

    /// Unknown report tag (expected "f" or "nf")
    #[error("Invalid report tag: {0}")]
    InvalidReportTag(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
