//! Error events
//!
//! An [`ErrorEvent`] is constructed once per error occurrence by one of the
//! process-wide hooks and consumed immediately by the router. Events are
//! transient: the router never persists them, only the backends it forwards
//! them to may.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Fatal / non-fatal classification of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Unrecoverable for the current unit of work
    Fatal,
    /// Recoverable; the process keeps running normally
    NonFatal,
}

impl Severity {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Severity::Fatal)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Fatal => "fatal",
            Severity::NonFatal => "non_fatal",
        };
        write!(f, "{}", s)
    }
}

/// Which hook observed the error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    /// Reported synchronously by the application framework (a panic)
    Framework,
    /// Escaped an asynchronous task without being handled
    AsyncUncaught,
    /// Delivered out-of-band by an isolated worker
    IsolatedWorker,
}

impl ErrorOrigin {
    /// The severity every event from this origin is classified with
    pub fn default_severity(&self) -> Severity {
        match self {
            ErrorOrigin::Framework | ErrorOrigin::IsolatedWorker => Severity::Fatal,
            ErrorOrigin::AsyncUncaught => Severity::NonFatal,
        }
    }
}

impl std::fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorOrigin::Framework => "framework",
            ErrorOrigin::AsyncUncaught => "async_uncaught",
            ErrorOrigin::IsolatedWorker => "isolated_worker",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ErrorOrigin {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "framework" | "panic" => Ok(ErrorOrigin::Framework),
            "async_uncaught" | "async" => Ok(ErrorOrigin::AsyncUncaught),
            "isolated_worker" | "worker" | "isolate" => Ok(ErrorOrigin::IsolatedWorker),
            other => Err(DomainError::InvalidOrigin(other.to_string())),
        }
    }
}

/// Tag sent alongside chat webhook messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportTag {
    #[serde(rename = "f")]
    Fatal,
    #[serde(rename = "nf")]
    NonFatal,
}

impl ReportTag {
    /// Wire form: `"f"` or `"nf"`
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportTag::Fatal => "f",
            ReportTag::NonFatal => "nf",
        }
    }
}

impl From<Severity> for ReportTag {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Fatal => ReportTag::Fatal,
            Severity::NonFatal => ReportTag::NonFatal,
        }
    }
}

impl std::fmt::Display for ReportTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportTag {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f" => Ok(ReportTag::Fatal),
            "nf" => Ok(ReportTag::NonFatal),
            other => Err(DomainError::InvalidReportTag(other.to_string())),
        }
    }
}

/// The error value carried by an event
///
/// `kind` is the error's type name (e.g. `"PlatformException"`), `code` an
/// optional machine-readable code and `library` the tag of the component
/// that reported it, when the reporter provides one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
}

impl ErrorPayload {
    /// Creates a payload with a kind and message
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            code: None,
            library: None,
        }
    }

    /// Sets the machine-readable error code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Sets the reporting library tag
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    /// Builds a payload from any error, using its source chain as the message
    pub fn from_error(kind: impl Into<String>, err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::new(kind, message)
    }
}

impl std::fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(code) = &self.code {
            write!(f, "({})", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// A single error occurrence observed by one of the hooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub origin: ErrorOrigin,
    pub payload: ErrorPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl ErrorEvent {
    /// Creates an event classified with the origin's default severity
    pub fn new(origin: ErrorOrigin, payload: ErrorPayload, stack_trace: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity: origin.default_severity(),
            origin,
            payload,
            stack_trace,
        }
    }

    /// A framework-reported error; always fatal
    pub fn framework(payload: ErrorPayload, stack_trace: Option<String>) -> Self {
        Self::new(ErrorOrigin::Framework, payload, stack_trace)
    }

    /// An error that escaped an async task; always non-fatal
    pub fn async_uncaught(payload: ErrorPayload, stack_trace: Option<String>) -> Self {
        Self::new(ErrorOrigin::AsyncUncaught, payload, stack_trace)
    }

    /// An error delivered by an isolated worker; always fatal
    pub fn isolated_worker(payload: ErrorPayload, stack_trace: Option<String>) -> Self {
        Self::new(ErrorOrigin::IsolatedWorker, payload, stack_trace)
    }

    pub fn is_fatal(&self) -> bool {
        self.severity.is_fatal()
    }

    /// Tag for the chat webhook derived from the severity
    pub fn tag(&self) -> ReportTag {
        self.severity.into()
    }
}
