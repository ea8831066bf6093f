//! Remote routing flag client
//!
//! Fetches a small JSON document `{"isMoreData": bool}` from a fixed URL
//! with an unauthenticated GET and caches the result for the lifetime of
//! the client. There is no retry, TTL or refresh: the first completed
//! initialization wins, and every failure degrades to
//! [`RemoteFlag::default`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use faultline_remote::flag::RemoteConfigClient;
//!
//! # async fn example() {
//! let client = RemoteConfigClient::new("https://example.com/flag.json");
//! let flag = client.flag().await;
//! println!("isMoreData = {}", flag.is_more_data);
//! # }
//! ```

use faultline_core::{domain::RemoteFlag, ports::IFlagSource};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::FetchError;

/// Where the cached flag value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum FlagSource {
    /// Parsed from a 200 response
    Remote,
    /// Fell back to the default after a failure
    Default { reason: String },
}

impl FlagSource {
    /// Short label: `remote` or `default`
    pub fn label(&self) -> &'static str {
        match self {
            FlagSource::Remote => "remote",
            FlagSource::Default { .. } => "default",
        }
    }
}

/// The cached result of initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagState {
    pub flag: RemoteFlag,
    #[serde(flatten)]
    pub source: FlagSource,
}

impl FlagState {
    pub fn is_default(&self) -> bool {
        matches!(self.source, FlagSource::Default { .. })
    }
}

// ============================================================================
// Pure policy
// ============================================================================

/// Parses a flag document body
///
/// Accepts either the JSON object itself or a JSON string whose content is
/// the JSON object (a body that was encoded twice).
pub fn parse_flag_body(body: &str) -> Result<RemoteFlag, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let value = match value {
        Value::String(inner) => serde_json::from_str::<Value>(&inner)
            .map_err(|e| FetchError::Malformed(format!("embedded document: {e}")))?,
        other => other,
    };

    if !value.is_object() {
        return Err(FetchError::Malformed(format!(
            "expected a JSON object, got {value}"
        )));
    }

    serde_json::from_value(value).map_err(|e| FetchError::Malformed(e.to_string()))
}

/// Converts a fetch result into the state to cache
///
/// Every error becomes the default flag with the error as the reason.
pub fn resolve_flag(result: Result<RemoteFlag, FetchError>) -> FlagState {
    match result {
        Ok(flag) => FlagState {
            flag,
            source: FlagSource::Remote,
        },
        Err(e) => FlagState {
            flag: RemoteFlag::default(),
            source: FlagSource::Default {
                reason: e.to_string(),
            },
        },
    }
}

// ============================================================================
// RemoteConfigClient
// ============================================================================

/// Fetch-once client for the remote routing flag
///
/// Concurrent callers that arrive before initialization await the same
/// in-flight fetch and all observe the same cached value.
pub struct RemoteConfigClient {
    /// The underlying HTTP client
    client: Client,
    /// Location of the flag document
    url: String,
    /// Result of the first completed initialization
    state: OnceCell<FlagState>,
}

impl RemoteConfigClient {
    /// Creates a new client for the flag document at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    /// Creates a client sharing an existing `reqwest::Client`
    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            state: OnceCell::new(),
        }
    }

    /// Returns the URL of the flag document
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether initialization has completed (successfully or not)
    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    /// Returns the cached state without triggering initialization
    pub fn cached(&self) -> Option<&FlagState> {
        self.state.get()
    }

    /// Fetches and caches the flag if that has not happened yet
    ///
    /// Never fails: errors are logged and cached as the default flag.
    pub async fn initialize(&self) -> &FlagState {
        self.state
            .get_or_init(|| async {
                let state = resolve_flag(self.fetch().await);
                match &state.source {
                    FlagSource::Remote => {
                        info!(url = %self.url, flag = %state.flag, "Remote flag loaded")
                    }
                    FlagSource::Default { reason } => warn!(
                        url = %self.url,
                        reason = %reason,
                        "Remote flag unavailable, using default"
                    ),
                }
                state
            })
            .await
    }

    /// Returns the cached flag, initializing on first use
    pub async fn flag(&self) -> RemoteFlag {
        self.initialize().await.flag
    }

    /// Performs the GET request and parses the body
    ///
    /// This is the raw I/O step; it reports an explicit error kind and does
    /// not touch the cache.
    pub async fn fetch(&self) -> Result<RemoteFlag, FetchError> {
        debug!(url = %self.url, "Fetching remote flag");

        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_flag_body(&body)
    }
}

#[async_trait::async_trait]
impl IFlagSource for RemoteConfigClient {
    async fn flag(&self) -> RemoteFlag {
        RemoteConfigClient::flag(self).await
    }
}
