//! Session annotation use case
//!
//! Attaches user, device and build metadata to the crash backend once the
//! user has authenticated. Best effort: a failed attachment is logged and
//! the remaining keys are still attempted.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{domain::UserContext, ports::ICrashBackend};

/// Use case annotating the crash backend session with [`UserContext`]
pub struct UserContextAnnotator {
    crash_backend: Arc<dyn ICrashBackend>,
}

impl UserContextAnnotator {
    pub fn new(crash_backend: Arc<dyn ICrashBackend>) -> Self {
        Self { crash_backend }
    }

    /// Attaches every annotation of `context` to the session
    ///
    /// # Returns
    ///
    /// The number of keys the backend accepted
    pub async fn annotate(&self, context: &UserContext) -> usize {
        let mut attached = 0;

        for (key, value) in context.annotations() {
            match self.crash_backend.set_custom_key(&key, &value).await {
                Ok(()) => attached += 1,
                Err(e) => warn!(key = %key, error = %format!("{e:#}"), "Failed to attach session key"),
            }
        }

        info!(
            user_id = %context.user_id,
            version = %context.version,
            attached,
            "Annotated crash session"
        );
        attached
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{BuildVariant, ErrorEvent};

    #[derive(Default)]
    struct KeyRecorder {
        keys: Mutex<Vec<(String, String)>>,
        reject: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl ICrashBackend for KeyRecorder {
        async fn set_custom_key(&self, key: &str, value: &str) -> anyhow::Result<()> {
            if self.reject == Some(key) {
                anyhow::bail!("rejected {key}");
            }
            self.keys
                .lock()
                .unwrap()
                .push((key.to_string(), value.to_string()));
            Ok(())
        }
        async fn record_fatal(&self, _event: &ErrorEvent) -> anyhow::Result<()> {
            Ok(())
        }
        async fn record_error(&self, _event: &ErrorEvent, _fatal: bool) -> anyhow::Result<()> {
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

    fn context() -> UserContext {
        UserContext::new("2.1.0", "301", BuildVariant::Release, "user-42")
            .with_user_name("jdoe")
            .with_tenant("tenant-7")
            .with_device_id("device-abc")
    }

    #[tokio::test]
    async fn test_annotate_attaches_all_keys() {
        let backend = Arc::new(KeyRecorder::default());
        let annotator = UserContextAnnotator::new(backend.clone());

        let attached = annotator.annotate(&context()).await;

        assert_eq!(attached, 7);
        let keys = backend.keys.lock().unwrap();
        assert!(keys.contains(&("tenant_id".to_string(), "tenant-7".to_string())));
        assert!(keys.contains(&("device_id".to_string(), "device-abc".to_string())));
    }

    #[tokio::test]
    async fn test_annotate_continues_after_failure() {
        let backend = Arc::new(KeyRecorder {
            reject: Some("user_id"),
            ..Default::default()
        });
        let annotator = UserContextAnnotator::new(backend.clone());

        let attached = annotator.annotate(&context()).await;

        assert_eq!(attached, 6);
        let keys = backend.keys.lock().unwrap();
        assert!(keys.iter().all(|(k, _)| k != "user_id"));
        assert!(keys.iter().any(|(k, _)| k == "device_id"));
    }
}
