//! Route command - Show or perform the routing of a single error
//!
//! By default this is a dry run: the noise filters and the routing decision
//! are evaluated and printed, no backend is called. With `--send` the error
//! goes through the full router using the configured chat webhook and the
//! local crash backend.

use std::sync::Arc;

use anyhow::{Context, Result};
use faultline_core::domain::{
    BuildVariant, ErrorEvent, ErrorOrigin, ErrorPayload, RoutingDecision, UserContext,
};
use faultline_core::ports::{IChatWebhook, ICrashBackend, IFlagSource, StaticFlagSource};
use faultline_core::usecases::{ErrorRouter, RouteOutcome, UserContextAnnotator};
use faultline_remote::{RemoteConfigClient, SlackWebhook};
use faultline_telemetry::{DeviceInfo, LocalCrashBackend, MetricsRegistry};
use tracing::info;

use crate::output::{get_formatter, OutputFormatter};
use crate::CliContext;

#[derive(Debug, clap::Args)]
pub struct RouteCommand {
    /// Hook that observed the error: framework, async or worker
    #[arg(long, default_value = "framework")]
    pub origin: ErrorOrigin,

    /// Error type name (e.g. PlatformException)
    #[arg(long, default_value = "Error")]
    pub kind: String,

    /// Error message
    pub message: String,

    /// Machine-readable error code
    #[arg(long)]
    pub code: Option<String>,

    /// Library tag of the reporting component
    #[arg(long)]
    pub library: Option<String>,

    /// Stack trace text
    #[arg(long)]
    pub stack: Option<String>,

    /// Use this isMoreData value instead of fetching the remote flag
    #[arg(long)]
    pub more_data: Option<bool>,

    /// Override the configured build variant
    #[arg(long)]
    pub variant: Option<BuildVariant>,

    /// Actually deliver the error instead of printing the decision
    #[arg(long)]
    pub send: bool,

    /// Annotate the crash session with this user id before sending
    #[arg(long, requires = "send")]
    pub user: Option<String>,

    /// Print Prometheus counters after sending
    #[arg(long, requires = "send")]
    pub metrics: bool,
}

impl RouteCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let variant = self.variant.unwrap_or(ctx.config.app.variant);
        let event = ErrorEvent::new(self.origin, self.payload(), self.stack.clone());

        let remote = self
            .more_data
            .is_none()
            .then(|| Arc::new(RemoteConfigClient::new(ctx.config.remote_config.url.clone())));
        let flag_source: Arc<dyn IFlagSource> = match &remote {
            Some(client) => client.clone() as Arc<dyn IFlagSource>,
            None => Arc::new(StaticFlagSource::new(self.more_data.unwrap_or_default())),
        };

        let backend = Arc::new(LocalCrashBackend::from_config(
            &ctx.config.crash_reporting,
            &ctx.config.app,
        ));

        if !self.send {
            let router = ErrorRouter::new(flag_source, backend, None, variant);
            let preview = router.preview(&event).await;
            return print_preview(formatter.as_ref(), ctx, &event, variant, preview);
        }

        // Collection is only enabled for release builds
        backend
            .set_collection_enabled(variant.is_release())
            .await
            .context("Failed to configure crash collection")?;
        if !variant.is_release() {
            formatter.warn(&format!(
                "Crash collection is disabled for {} builds; crash records are dropped",
                variant
            ));
        }

        let webhook = SlackWebhook::from_config(&ctx.config.chat_webhook, &ctx.config.app)
            .map(|w| Arc::new(w) as Arc<dyn IChatWebhook>);
        if webhook.is_none() {
            formatter.warn("No chat webhook configured; chat-bound errors fall back to the crash backend");
        }

        if let Some(user) = &self.user {
            let context = UserContext::new(
                ctx.config.app.version.clone(),
                ctx.config.app.build.clone(),
                variant,
                user.clone(),
            );
            let context = DeviceInfo::collect(&ctx.config.app.name).annotate(context);
            let attached = UserContextAnnotator::new(backend.clone())
                .annotate(&context)
                .await;
            info!(attached, "Session annotated");
        }
        backend
            .log(&format!("faultline route --origin {}", self.origin))
            .await?;

        let router = ErrorRouter::new(flag_source, backend.clone(), webhook, variant);
        let outcome = router.route(&event).await;

        let metrics = MetricsRegistry::new()?;
        metrics.record_outcome(&event, &outcome);
        if let Some(state) = remote.as_ref().and_then(|c| c.cached()) {
            metrics.record_flag_load(state.source.label());
        }

        print_outcome(formatter.as_ref(), ctx, &event, &outcome)?;

        if self.metrics {
            print!("{}", metrics.encode()?);
        }
        Ok(())
    }

    fn payload(&self) -> ErrorPayload {
        let mut payload = ErrorPayload::new(self.kind.clone(), self.message.clone());
        if let Some(code) = &self.code {
            payload = payload.with_code(code.clone());
        }
        if let Some(library) = &self.library {
            payload = payload.with_library(library.clone());
        }
        payload
    }
}

fn print_preview(
    formatter: &dyn OutputFormatter,
    ctx: &CliContext,
    event: &ErrorEvent,
    variant: BuildVariant,
    preview: Result<RoutingDecision, faultline_core::domain::NoiseFilter>,
) -> Result<()> {
    if ctx.format.is_json() {
        let json = match preview {
            Ok(decision) => serde_json::json!({
                "event_id": event.id.to_string(),
                "origin": event.origin,
                "severity": event.severity,
                "variant": variant,
                "suppressed": false,
                "decision": decision,
            }),
            Err(filter) => serde_json::json!({
                "event_id": event.id.to_string(),
                "origin": event.origin,
                "severity": event.severity,
                "variant": variant,
                "suppressed": true,
                "filter": filter,
            }),
        };
        formatter.print_json(&json);
        return Ok(());
    }

    formatter.info(&format!(
        "{} {} error: {}",
        event.severity, event.origin, event.payload
    ));
    match preview {
        Ok(decision) if decision.is_empty() => {
            formatter.success("Not delivered to any backend");
        }
        Ok(decision) => {
            formatter.success("Routing decision");
            formatter.info(&format!(
                "Crash backend: {}",
                yes_no(decision.send_to_crash_backend)
            ));
            formatter.info(&format!(
                "Chat webhook:  {} (tag \"{}\")",
                yes_no(decision.send_to_chat_webhook),
                event.tag()
            ));
        }
        Err(filter) => {
            formatter.success(&format!("Suppressed as noise ({})", filter));
        }
    }
    Ok(())
}

fn print_outcome(
    formatter: &dyn OutputFormatter,
    ctx: &CliContext,
    event: &ErrorEvent,
    outcome: &RouteOutcome,
) -> Result<()> {
    if ctx.format.is_json() {
        let mut json = serde_json::to_value(outcome).context("Failed to serialize outcome")?;
        json["event_id"] = serde_json::Value::String(event.id.to_string());
        formatter.print_json(&json);
        return Ok(());
    }

    match outcome {
        RouteOutcome::Suppressed { filter } => {
            formatter.success(&format!("Suppressed as noise ({})", filter));
        }
        RouteOutcome::Routed {
            decision,
            chat_delivered,
            fallback_used,
            crash_recorded,
        } => {
            formatter.success(&format!("Routed event {}", event.id));
            formatter.info(&format!("Decision: {}", decision));
            formatter.info(&format!("Chat delivered: {}", yes_no(*chat_delivered)));
            if *fallback_used {
                formatter.warn("Chat webhook failed; the crash backend kept the report");
            }
            formatter.info(&format!("Crash recorded: {}", yes_no(*crash_recorded)));
        }
    }
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
