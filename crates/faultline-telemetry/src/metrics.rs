//! Prometheus metrics registry for Faultline
//!
//! Counts what the error router did with each event and how the remote
//! flag was obtained.

use faultline_core::domain::ErrorEvent;
use faultline_core::usecases::RouteOutcome;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Central metrics registry holding all Prometheus metrics.
pub struct MetricsRegistry {
    registry: Registry,
    /// Counter: events delivered by (origin, destination)
    pub reports_routed_total: IntCounterVec,
    /// Counter: events dropped by noise filter
    pub reports_suppressed_total: IntCounterVec,
    /// Counter: chat webhook failures recorded to the crash backend instead
    pub webhook_fallbacks_total: IntCounterVec,
    /// Counter: remote flag initializations by source (remote, default)
    pub remote_flag_loads_total: IntCounterVec,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with all metrics registered.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new_custom(Some("faultline".to_string()), None)?;

        let reports_routed_total = IntCounterVec::new(
            Opts::new("reports_routed_total", "Error events delivered to a backend"),
            &["origin", "destination"],
        )?;
        registry.register(Box::new(reports_routed_total.clone()))?;

        let reports_suppressed_total = IntCounterVec::new(
            Opts::new("reports_suppressed_total", "Error events dropped as noise"),
            &["filter"],
        )?;
        registry.register(Box::new(reports_suppressed_total.clone()))?;

        let webhook_fallbacks_total = IntCounterVec::new(
            Opts::new(
                "webhook_fallbacks_total",
                "Chat webhook deliveries that failed",
            ),
            &["origin"],
        )?;
        registry.register(Box::new(webhook_fallbacks_total.clone()))?;

        let remote_flag_loads_total = IntCounterVec::new(
            Opts::new("remote_flag_loads_total", "Remote flag initializations"),
            &["source"],
        )?;
        registry.register(Box::new(remote_flag_loads_total.clone()))?;

        Ok(Self {
            registry,
            reports_routed_total,
            reports_suppressed_total,
            webhook_fallbacks_total,
            remote_flag_loads_total,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Record what the router did with one event.
    pub fn record_outcome(&self, event: &ErrorEvent, outcome: &RouteOutcome) {
        let origin = event.origin.to_string();
        match outcome {
            RouteOutcome::Suppressed { filter } => {
                self.reports_suppressed_total
                    .with_label_values(&[filter.as_str()])
                    .inc();
            }
            RouteOutcome::Routed {
                chat_delivered,
                fallback_used,
                crash_recorded,
                ..
            } => {
                if *chat_delivered {
                    self.record_routed(&origin, "chat_webhook");
                }
                if *crash_recorded {
                    self.record_routed(&origin, "crash_backend");
                }
                if *fallback_used {
                    self.webhook_fallbacks_total
                        .with_label_values(&[origin.as_str()])
                        .inc();
                }
            }
        }
    }

    /// Record how the remote flag was initialized (`remote` or `default`).
    pub fn record_flag_load(&self, source: &str) {
        self.remote_flag_loads_total
            .with_label_values(&[source])
            .inc();
    }

    fn record_routed(&self, origin: &str, destination: &str) {
        self.reports_routed_total
            .with_label_values(&[origin, destination])
            .inc();
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use faultline_core::domain::{ErrorPayload, NoiseFilter, RoutingDecision};

    use super::*;

    fn event() -> ErrorEvent {
        ErrorEvent::isolated_worker(ErrorPayload::new("E", "m"), None)
    }

    #[test]
    fn test_metrics_registry_creation() {
        let registry = MetricsRegistry::new().expect("create registry");
        let output = registry.encode().expect("encode");
        assert!(output.is_empty() || output.contains("faultline"));
    }

    #[test]
    fn test_record_suppressed() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_outcome(
            &event(),
            &RouteOutcome::Suppressed {
                filter: NoiseFilter::NetworkImageLoad,
            },
        );

        let output = registry.encode().unwrap();
        assert!(output.contains("faultline_reports_suppressed_total"));
        assert!(output.contains("network_image_load"));
    }

    #[test]
    fn test_record_fallback() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_outcome(
            &event(),
            &RouteOutcome::Routed {
                decision: RoutingDecision {
                    send_to_crash_backend: false,
                    send_to_chat_webhook: true,
                },
                chat_delivered: false,
                fallback_used: true,
                crash_recorded: true,
            },
        );

        assert_eq!(
            registry
                .webhook_fallbacks_total
                .with_label_values(&["isolated_worker"])
                .get(),
            1
        );
        assert_eq!(
            registry
                .reports_routed_total
                .with_label_values(&["isolated_worker", "crash_backend"])
                .get(),
            1
        );
        assert_eq!(
            registry
                .reports_routed_total
                .with_label_values(&["isolated_worker", "chat_webhook"])
                .get(),
            0
        );
    }

    #[test]
    fn test_record_flag_load() {
        let registry = MetricsRegistry::new().unwrap();
        registry.record_flag_load("default");

        let output = registry.encode().unwrap();
        assert!(output.contains("faultline_remote_flag_loads_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}
