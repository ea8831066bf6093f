//! Process-wide error hooks
//!
//! Captures errors from three places and feeds them to a single dispatcher
//! task that awaits [`ErrorRouter::route`]:
//!
//! - the `std::panic` hook (chained to the previously installed hook)
//! - [`ErrorHooks::on_uncaught_error`] and tasks started with
//!   [`ErrorHooks::spawn_monitored`]
//! - [`WorkerErrorPort`], handed to out-of-band worker threads
//!
//! A panic is classified by where it happens: inside a monitored task it is
//! an `AsyncUncaught` event, on a worker thread an `IsolatedWorker` event,
//! anywhere else a `Framework` event.

use std::backtrace::Backtrace;
use std::cell::Cell;
use std::future::Future;
use std::panic::PanicHookInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use faultline_core::domain::{ErrorEvent, ErrorOrigin, ErrorPayload};
use faultline_core::usecases::ErrorRouter;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::metrics::MetricsRegistry;

type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static;

/// Error kind used for panics captured by the hook
pub const PANIC_KIND: &str = "panic";

/// Error kind used when a pair carries no recognizable kind prefix
pub const GENERIC_ERROR_KIND: &str = "Error";

static INSTALLED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static IN_WORKER: Cell<bool> = const { Cell::new(false) };
}

tokio::task_local! {
    static MONITORED: ();
}

/// Errors raised while installing the hooks
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("error hooks are already installed in this process")]
    AlreadyInstalled,

    #[error("error hooks must be installed from within a tokio runtime")]
    NoRuntime,
}

/// Returns true while an [`ErrorHooks`] handle is registered.
pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}

/// Installs the panic hook and starts the dispatcher task.
///
/// Must be called from within a tokio runtime. Only one set of hooks may be
/// registered at a time; drop or [`ErrorHooks::shutdown`] the handle before
/// installing again.
pub fn install_error_hooks(
    router: Arc<ErrorRouter>,
    metrics: Option<Arc<MetricsRegistry>>,
) -> Result<ErrorHooks, HookError> {
    let handle = Handle::try_current().map_err(|_| HookError::NoRuntime)?;

    if INSTALLED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(HookError::AlreadyInstalled);
    }

    let (sender, receiver) = mpsc::unbounded_channel();
    let token = CancellationToken::new();
    let dispatcher = handle.spawn(dispatch(router, metrics, receiver, token.clone()));

    let previous: Arc<PanicHook> = Arc::from(std::panic::take_hook());
    let chained = Arc::clone(&previous);
    let panic_sender = sender.clone();
    std::panic::set_hook(Box::new(move |info| {
        let event = panic_event(info);
        debug!(event_id = %event.id, origin = %event.origin, "Captured panic");
        let _ = panic_sender.send(event);

        (*chained)(info);
    }));

    info!("Error hooks installed");

    Ok(ErrorHooks {
        sender,
        token,
        dispatcher: Some(dispatcher),
        previous_hook: Some(previous),
    })
}

/// Handle to the installed hooks
///
/// Dropping the handle restores the previous panic hook and stops the
/// dispatcher without waiting for it; use [`ErrorHooks::shutdown`] to also
/// wait until queued events have been routed.
pub struct ErrorHooks {
    sender: mpsc::UnboundedSender<ErrorEvent>,
    token: CancellationToken,
    dispatcher: Option<JoinHandle<()>>,
    previous_hook: Option<Arc<PanicHook>>,
}

impl ErrorHooks {
    /// Reports an error observed by the application framework (fatal).
    pub fn on_framework_error(&self, payload: ErrorPayload, stack_trace: Option<String>) -> bool {
        submit(
            &self.sender,
            ErrorEvent::framework(payload, stack_trace),
        )
    }

    /// Reports an error that escaped an async task (non-fatal).
    ///
    /// Returns true when the error is handled: queued for routing or
    /// recognized as noise. Returns false only once the dispatcher stopped.
    pub fn on_uncaught_error(&self, payload: ErrorPayload, stack_trace: Option<String>) -> bool {
        submit(
            &self.sender,
            ErrorEvent::async_uncaught(payload, stack_trace),
        )
    }

    /// Spawns a task whose error result or panic is reported as uncaught.
    ///
    /// A panic is reported by the panic hook while the task unwinds, so the
    /// join error is not reported a second time.
    pub fn spawn_monitored<F, T>(&self, future: F) -> JoinHandle<()>
    where
        F: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.sender.clone();
        let inner = tokio::spawn(MONITORED.scope((), future));

        tokio::spawn(async move {
            match inner.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    let payload = ErrorPayload::new(GENERIC_ERROR_KIND, format!("{e:#}"));
                    submit(&sender, ErrorEvent::async_uncaught(payload, None));
                }
                Err(e) if e.is_panic() => {
                    debug!("Monitored task panicked");
                }
                Err(_) => {
                    debug!("Monitored task cancelled");
                }
            }
        })
    }

    /// Returns a sender for isolated workers.
    pub fn worker_port(&self) -> WorkerErrorPort {
        WorkerErrorPort {
            sender: self.sender.clone(),
        }
    }

    /// Restores the previous panic hook and routes every queued event
    /// before returning.
    pub async fn shutdown(mut self) {
        self.teardown();
        if let Some(dispatcher) = self.dispatcher.take() {
            if let Err(e) = dispatcher.await {
                warn!(error = %e, "Error dispatcher did not stop cleanly");
            }
        }
        info!("Error hooks shut down");
    }

    fn teardown(&mut self) {
        if let Some(previous) = self.previous_hook.take() {
            // set_hook panics when called from a panicking thread
            if !std::thread::panicking() {
                std::panic::set_hook(Box::new(move |info| (*previous)(info)));
            }
            INSTALLED.store(false, Ordering::SeqCst);
        }
        self.token.cancel();
    }
}

impl Drop for ErrorHooks {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Out-of-band error channel for isolated workers
///
/// Each delivered `(error, stack)` pair becomes a fatal `IsolatedWorker`
/// event.
#[derive(Clone)]
pub struct WorkerErrorPort {
    sender: mpsc::UnboundedSender<ErrorEvent>,
}

impl WorkerErrorPort {
    /// Delivers a structured worker error.
    pub fn report(&self, payload: ErrorPayload, stack_trace: Option<String>) -> bool {
        submit(
            &self.sender,
            ErrorEvent::isolated_worker(payload, stack_trace),
        )
    }

    /// Delivers a raw `(error, stack)` pair.
    ///
    /// An error of the form `Kind: message` keeps `Kind` as the error kind.
    pub fn report_pair(&self, error: &str, stack_trace: Option<&str>) -> bool {
        self.report(payload_from_text(error), stack_trace.map(str::to_string))
    }

    /// Runs `work` on a named worker thread.
    ///
    /// A returned error is delivered through this port; a panic is
    /// classified as an isolated-worker error by the panic hook.
    pub fn spawn_worker<F>(
        &self,
        name: impl Into<String>,
        work: F,
    ) -> std::io::Result<std::thread::JoinHandle<()>>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let port = self.clone();
        std::thread::Builder::new().name(name.into()).spawn(move || {
            IN_WORKER.with(|flag| flag.set(true));
            if let Err(e) = work() {
                port.report_pair(&format!("{e:#}"), None);
            }
        })
    }
}

fn submit(sender: &mpsc::UnboundedSender<ErrorEvent>, event: ErrorEvent) -> bool {
    let id = event.id;
    match sender.send(event) {
        Ok(()) => true,
        Err(_) => {
            warn!(event_id = %id, "Error dispatcher stopped, dropping event");
            false
        }
    }
}

async fn dispatch(
    router: Arc<ErrorRouter>,
    metrics: Option<Arc<MetricsRegistry>>,
    mut receiver: mpsc::UnboundedReceiver<ErrorEvent>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            Some(event) = receiver.recv() => route_one(&router, metrics.as_deref(), &event).await,
            _ = token.cancelled() => break,
        }
    }

    receiver.close();
    let mut drained = 0usize;
    while let Ok(event) = receiver.try_recv() {
        route_one(&router, metrics.as_deref(), &event).await;
        drained += 1;
    }
    debug!(drained, "Error dispatcher stopped");
}

async fn route_one(router: &ErrorRouter, metrics: Option<&MetricsRegistry>, event: &ErrorEvent) {
    let outcome = router.route(event).await;
    if let Some(metrics) = metrics {
        metrics.record_outcome(event, &outcome);
    }
}

fn panic_origin() -> ErrorOrigin {
    if MONITORED.try_with(|_| ()).is_ok() {
        ErrorOrigin::AsyncUncaught
    } else if IN_WORKER.with(Cell::get) {
        ErrorOrigin::IsolatedWorker
    } else {
        ErrorOrigin::Framework
    }
}

fn panic_event(info: &PanicHookInfo<'_>) -> ErrorEvent {
    let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    };

    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "unknown".to_string());

    let backtrace = Backtrace::force_capture();
    let stack = format!("at {location}\n{backtrace}");

    ErrorEvent::new(
        panic_origin(),
        ErrorPayload::new(PANIC_KIND, message),
        Some(stack),
    )
}

fn payload_from_text(error: &str) -> ErrorPayload {
    match error.split_once(": ") {
        Some((kind, message))
            if !kind.is_empty() && !kind.contains(char::is_whitespace) =>
        {
            ErrorPayload::new(kind, message)
        }
        _ => ErrorPayload::new(GENERIC_ERROR_KIND, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_from_text_with_kind() {
        let payload = payload_from_text("NetworkImageLoadException: HTTP 404");
        assert_eq!(payload.kind, "NetworkImageLoadException");
        assert_eq!(payload.message, "HTTP 404");
    }

    #[test]
    fn test_payload_from_text_without_kind() {
        let payload = payload_from_text("connection reset by peer: retry later");
        assert_eq!(payload.kind, GENERIC_ERROR_KIND);
        assert_eq!(payload.message, "connection reset by peer: retry later");
    }

    #[test]
    fn test_panic_origin_outside_hooks_is_framework() {
        assert_eq!(panic_origin(), ErrorOrigin::Framework);
    }

    #[test]
    fn test_panic_origin_on_worker_thread() {
        let origin = std::thread::spawn(|| {
            IN_WORKER.with(|flag| flag.set(true));
            panic_origin()
        })
        .join()
        .unwrap();
        assert_eq!(origin, ErrorOrigin::IsolatedWorker);
    }

    #[tokio::test]
    async fn test_panic_origin_in_monitored_scope() {
        let origin = MONITORED.scope((), async { panic_origin() }).await;
        assert_eq!(origin, ErrorOrigin::AsyncUncaught);
    }

    #[test]
    fn test_install_without_runtime_fails() {
        let router = Arc::new(ErrorRouter::new(
            Arc::new(faultline_core::ports::StaticFlagSource::default()),
            Arc::new(crate::backend::LocalCrashBackend::new(
                std::env::temp_dir(),
                "test",
                "0",
                1,
            )),
            None,
            faultline_core::domain::BuildVariant::Development,
        ));
        assert!(matches!(
            install_error_hooks(router, None),
            Err(HookError::NoRuntime)
        ));
    }
}
