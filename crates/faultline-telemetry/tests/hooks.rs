//! End-to-end tests for the process-wide error hooks
//!
//! The panic hook is global, so every test holds `HOOK_LOCK` for its whole
//! duration.

use std::sync::{Arc, Mutex, OnceLock};

use faultline_core::domain::{BuildVariant, ErrorEvent, ErrorOrigin, ErrorPayload, ReportTag};
use faultline_core::ports::{IChatWebhook, ICrashBackend, StaticFlagSource};
use faultline_core::usecases::ErrorRouter;
use faultline_telemetry::hooks::{install_error_hooks, is_installed, HookError};
use faultline_telemetry::MetricsRegistry;

fn hook_lock() -> &'static tokio::sync::Mutex<()> {
    static HOOK_LOCK: OnceLock<tokio::sync::Mutex<()>> = OnceLock::new();
    HOOK_LOCK.get_or_init(|| tokio::sync::Mutex::new(()))
}

#[derive(Default)]
struct RecordingCrash {
    records: Mutex<Vec<(ErrorOrigin, String, bool)>>,
}

impl RecordingCrash {
    fn records(&self) -> Vec<(ErrorOrigin, String, bool)> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ICrashBackend for RecordingCrash {
    async fn set_custom_key(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        Ok(())
    }
    async fn record_fatal(&self, event: &ErrorEvent) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap()
            .push((event.origin, event.payload.message.clone(), true));
        Ok(())
    }
    async fn record_error(&self, event: &ErrorEvent, fatal: bool) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap()
            .push((event.origin, event.payload.message.clone(), fatal));
        Ok(())
    }
    async fn log(&self, _message: &str) -> anyhow::Result<()> {
        Ok(())
    }
    async fn set_collection_enabled(&self, _enabled: bool) -> anyhow::Result<()> {
        Ok(())
    }
    fn is_collection_enabled(&self) -> bool {
        true
    }
}

#[derive(Default)]
struct RecordingChat {
    messages: Mutex<Vec<(String, ReportTag)>>,
}

#[async_trait::async_trait]
impl IChatWebhook for RecordingChat {
    async fn send(
        &self,
        error: &str,
        _stack_trace: Option<&str>,
        tag: ReportTag,
    ) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push((error.to_string(), tag));
        Ok(())
    }
}

struct Harness {
    crash: Arc<RecordingCrash>,
    chat: Arc<RecordingChat>,
    router: Arc<ErrorRouter>,
}

fn harness(is_more_data: bool, variant: BuildVariant) -> Harness {
    let crash = Arc::new(RecordingCrash::default());
    let chat = Arc::new(RecordingChat::default());
    let router = Arc::new(ErrorRouter::new(
        Arc::new(StaticFlagSource::new(is_more_data)),
        crash.clone(),
        Some(chat.clone()),
        variant,
    ));
    Harness {
        crash,
        chat,
        router,
    }
}

#[tokio::test]
async fn test_panic_becomes_framework_event() {
    let _guard = hook_lock().lock().await;
    let h = harness(false, BuildVariant::Release);
    let hooks = install_error_hooks(h.router.clone(), None).unwrap();

    let joined = std::thread::spawn(|| panic!("render overflow")).join();
    assert!(joined.is_err());

    hooks.shutdown().await;

    let records = h.crash.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0], (ErrorOrigin::Framework, "render overflow".to_string(), true));

    let messages = h.chat.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].1, ReportTag::Fatal);
    assert!(messages[0].0.starts_with("panic: render overflow"));
}

#[tokio::test]
async fn test_uncaught_errors_follow_variant() {
    let _guard = hook_lock().lock().await;
    let h = harness(false, BuildVariant::Development);
    let hooks = install_error_hooks(h.router.clone(), None).unwrap();

    assert!(hooks.on_uncaught_error(ErrorPayload::new("TimeoutError", "slow"), None));
    hooks.shutdown().await;

    assert_eq!(
        h.crash.records(),
        vec![(ErrorOrigin::AsyncUncaught, "slow".to_string(), false)]
    );
    let messages = h.chat.messages.lock().unwrap().clone();
    assert_eq!(messages, vec![("TimeoutError: slow".to_string(), ReportTag::NonFatal)]);
}

#[tokio::test]
async fn test_missing_scanner_is_handled_silently() {
    let _guard = hook_lock().lock().await;
    let h = harness(false, BuildVariant::Development);
    let metrics = Arc::new(MetricsRegistry::new().unwrap());
    let hooks = install_error_hooks(h.router.clone(), Some(metrics.clone())).unwrap();

    let handled = hooks.on_uncaught_error(
        ErrorPayload::new("PlatformException", "No barcode scanner found").with_code("404"),
        None,
    );
    assert!(handled);
    hooks.shutdown().await;

    assert!(h.crash.records().is_empty());
    assert!(h.chat.messages.lock().unwrap().is_empty());
    assert_eq!(
        metrics
            .reports_suppressed_total
            .with_label_values(&["barcode_scanner_missing"])
            .get(),
        1
    );
}

async fn explode() -> anyhow::Result<()> {
    panic!("task exploded")
}

#[tokio::test]
async fn test_monitored_task_error_and_panic() {
    let _guard = hook_lock().lock().await;
    let h = harness(false, BuildVariant::Release);
    let hooks = install_error_hooks(h.router.clone(), None).unwrap();

    hooks
        .spawn_monitored(async { Err::<(), _>(anyhow::anyhow!("upload rejected")) })
        .await
        .unwrap();
    hooks.spawn_monitored(explode()).await.unwrap();
    hooks.spawn_monitored(async { Ok(42) }).await.unwrap();

    hooks.shutdown().await;

    let mut records = h.crash.records();
    records.sort_by(|a, b| a.1.cmp(&b.1));
    assert_eq!(
        records,
        vec![
            (ErrorOrigin::AsyncUncaught, "task exploded".to_string(), false),
            (ErrorOrigin::AsyncUncaught, "upload rejected".to_string(), false),
        ]
    );
}

#[tokio::test]
async fn test_worker_port_routes_by_flag() {
    let _guard = hook_lock().lock().await;
    let h = harness(true, BuildVariant::Release);
    let hooks = install_error_hooks(h.router.clone(), None).unwrap();
    let port = hooks.worker_port();

    assert!(port.report_pair("StateError: queue corrupted", Some("#0 worker")));
    assert!(port.report_pair("NetworkImageLoadException: HTTP 404", None));
    port.spawn_worker("sync-worker", || anyhow::bail!("disk full"))
        .unwrap()
        .join()
        .unwrap();

    hooks.shutdown().await;

    // isMoreData=true: worker errors go to chat only; the image error is noise
    assert!(h.crash.records().is_empty());
    let messages = h.chat.messages.lock().unwrap().clone();
    assert_eq!(
        messages,
        vec![
            ("StateError: queue corrupted".to_string(), ReportTag::Fatal),
            ("Error: disk full".to_string(), ReportTag::Fatal),
        ]
    );
}

#[tokio::test]
async fn test_worker_panic_is_isolated_worker_event() {
    let _guard = hook_lock().lock().await;
    let h = harness(false, BuildVariant::Release);
    let hooks = install_error_hooks(h.router.clone(), None).unwrap();

    let worker = hooks
        .worker_port()
        .spawn_worker("decoder", || panic!("bad frame"))
        .unwrap();
    assert!(worker.join().is_err());

    hooks.shutdown().await;

    assert_eq!(
        h.crash.records(),
        vec![(ErrorOrigin::IsolatedWorker, "bad frame".to_string(), true)]
    );
}

#[tokio::test]
async fn test_install_twice_is_rejected_until_shutdown() {
    let _guard = hook_lock().lock().await;
    let h = harness(false, BuildVariant::Release);

    let hooks = install_error_hooks(h.router.clone(), None).unwrap();
    assert!(is_installed());
    assert!(matches!(
        install_error_hooks(h.router.clone(), None),
        Err(HookError::AlreadyInstalled)
    ));

    hooks.shutdown().await;
    assert!(!is_installed());

    let again = install_error_hooks(h.router.clone(), None).unwrap();
    drop(again);
    assert!(!is_installed());
}

#[tokio::test]
async fn test_shutdown_restores_previous_hook() {
    let _guard = hook_lock().lock().await;
    let h = harness(false, BuildVariant::Release);

    let hooks = install_error_hooks(h.router.clone(), None).unwrap();
    hooks.shutdown().await;

    let joined = std::thread::spawn(|| panic!("after shutdown")).join();
    assert!(joined.is_err());
    tokio::task::yield_now().await;

    assert!(h.crash.records().is_empty());
}
