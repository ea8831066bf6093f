//! Error routing use case
//!
//! Takes a classified [`ErrorEvent`], drops known environment noise,
//! reads the remote flag and forwards the event to the crash backend, the
//! chat webhook, both or neither. This is the last-resort error sink of the
//! process, so nothing here returns an error: every backend failure is
//! logged and degraded.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    domain::{decide, suppression_for, BuildVariant, ErrorEvent, NoiseFilter, RoutingDecision},
    ports::{IChatWebhook, ICrashBackend, IFlagSource},
};

/// What happened to a single event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Matched a noise filter; no backend was called
    Suppressed { filter: NoiseFilter },
    /// Went through the routing decision
    Routed {
        decision: RoutingDecision,
        /// The chat webhook accepted the message
        chat_delivered: bool,
        /// The chat webhook was selected but failed
        fallback_used: bool,
        /// The crash backend accepted a record for this event
        crash_recorded: bool,
    },
}

impl RouteOutcome {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, RouteOutcome::Suppressed { .. })
    }
}

/// Use case routing error events to the reporting backends
///
/// Holds its dependencies explicitly; there is no ambient state. The flag
/// source is consulted on every routed event but is expected to cache.
pub struct ErrorRouter {
    flag_source: Arc<dyn IFlagSource>,
    crash_backend: Arc<dyn ICrashBackend>,
    chat_webhook: Option<Arc<dyn IChatWebhook>>,
    variant: BuildVariant,
}

impl ErrorRouter {
    /// Creates a new ErrorRouter
    ///
    /// # Arguments
    ///
    /// * `flag_source` - Provider of the cached remote flag
    /// * `crash_backend` - Crash-reporting backend
    /// * `chat_webhook` - Chat webhook; `None` when no webhook is configured,
    ///   in which case chat-bound events fall back to the crash backend
    /// * `variant` - Build variant of the host application
    pub fn new(
        flag_source: Arc<dyn IFlagSource>,
        crash_backend: Arc<dyn ICrashBackend>,
        chat_webhook: Option<Arc<dyn IChatWebhook>>,
        variant: BuildVariant,
    ) -> Self {
        Self {
            flag_source,
            crash_backend,
            chat_webhook,
            variant,
        }
    }

    pub fn variant(&self) -> BuildVariant {
        self.variant
    }

    /// Returns the crash backend this router records to
    pub fn crash_backend(&self) -> &Arc<dyn ICrashBackend> {
        &self.crash_backend
    }

    /// Computes the decision for `event` without calling any backend
    ///
    /// Returns `Err` with the matching filter when the event is noise.
    pub async fn preview(&self, event: &ErrorEvent) -> Result<RoutingDecision, NoiseFilter> {
        if let Some(filter) = suppression_for(event) {
            return Err(filter);
        }
        let flag = self.flag_source.flag().await;
        Ok(decide(event, flag, self.variant))
    }

    /// Routes a single event to the selected backends
    ///
    /// 1. Drops events matching a noise filter
    /// 2. Reads the remote flag and computes the decision
    /// 3. Sends to the chat webhook when selected
    /// 4. Records to the crash backend when selected, otherwise as non-fatal
    ///    when the chat webhook failed
    ///
    /// The crash backend receives at most one record per event.
    pub async fn route(&self, event: &ErrorEvent) -> RouteOutcome {
        if let Some(filter) = suppression_for(event) {
            info!(
                event_id = %event.id,
                origin = %event.origin,
                filter = %filter,
                "Suppressed noise error"
            );
            return RouteOutcome::Suppressed { filter };
        }

        let flag = self.flag_source.flag().await;
        let decision = decide(event, flag, self.variant);

        info!(
            event_id = %event.id,
            origin = %event.origin,
            severity = %event.severity,
            flag = %flag,
            variant = %self.variant,
            %decision,
            "Routing error"
        );

        let mut chat_delivered = false;
        let mut fallback_used = false;

        if decision.send_to_chat_webhook {
            match self.send_to_chat(event).await {
                Ok(()) => {
                    chat_delivered = true;
                    debug!(event_id = %event.id, tag = %event.tag(), "Chat webhook delivered");
                }
                Err(e) => {
                    warn!(
                        event_id = %event.id,
                        error = %format!("{e:#}"),
                        "Chat webhook failed, falling back to crash backend"
                    );
                    fallback_used = true;
                }
            }
        }

        // A selected crash record already carries the event; the non-fatal
        // fallback only stands in when the crash backend was not selected
        let crash_recorded = if decision.send_to_crash_backend {
            self.record(event, event.is_fatal()).await
        } else if fallback_used {
            self.record(event, false).await
        } else {
            false
        };

        RouteOutcome::Routed {
            decision,
            chat_delivered,
            fallback_used,
            crash_recorded,
        }
    }

    async fn send_to_chat(&self, event: &ErrorEvent) -> anyhow::Result<()> {
        let webhook = self
            .chat_webhook
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no chat webhook configured"))?;

        let error = event.payload.to_string();
        webhook
            .send(&error, event.stack_trace.as_deref(), event.tag())
            .await
    }

    /// Records to the crash backend, logging and swallowing failures
    async fn record(&self, event: &ErrorEvent, fatal: bool) -> bool {
        let result = if fatal {
            self.crash_backend.record_fatal(event).await
        } else {
            self.crash_backend.record_error(event, false).await
        };

        match result {
            Ok(()) => {
                debug!(event_id = %event.id, fatal, "Crash backend recorded error");
                true
            }
            Err(e) => {
                warn!(
                    event_id = %event.id,
                    fatal,
                    error = %format!("{e:#}"),
                    "Crash backend failed to record error"
                );
                false
            }
        }
    }
}
