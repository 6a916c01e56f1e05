//! Submission of conflict-checked transfer tasks

use crate::conflict;
use crate::error::TransferError;
use crate::object::{ObjectStore, ObjectUrl};

/// Submits `transfer` to the manager, gated by the conflict policy.
///
/// The policy runs inside the task, so its metadata lookups count against the
/// manager's concurrency bound like any other work. A skip decision
/// short-circuits `transfer` entirely and is reported through the waiter's
/// error sequence as an acceptable error, so the batch can account for it
/// without failing; a lookup failure surfaces as a fatal error the same way.
pub async fn submit<S, F, Fut>(
    manager: &parallel::Manager,
    waiter: &parallel::Waiter,
    store: S,
    src: ObjectUrl,
    dst: ObjectUrl,
    settings: conflict::Settings,
    transfer: F,
) where
    S: ObjectStore + Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let task = async move {
        match conflict::check_conditions(&store, &src, &dst, &settings).await? {
            conflict::Decision::Proceed => transfer().await,
            conflict::Decision::Skip(reason) => {
                tracing::debug!("skipping {} -> {}: {}", src, dst, reason);
                Err(TransferError::from(reason).into())
            }
        }
    };
    manager.run(task, waiter).await;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::{SkipReason, TransferError, is_acceptable_error};
    use crate::object::ObjectMetadata;

    use super::*;

    #[derive(Debug, Default, Clone)]
    struct MemoryStore {
        objects: HashMap<ObjectUrl, ObjectMetadata>,
        fail: bool,
    }

    impl MemoryStore {
        fn with(mut self, url: &str, size: u64, mod_secs: i64) -> Self {
            let url = ObjectUrl::from(url);
            self.objects.insert(
                url.clone(),
                ObjectMetadata {
                    url,
                    size,
                    mod_time: chrono::DateTime::from_timestamp(mod_secs, 0).unwrap(),
                },
            );
            self
        }
    }

    impl ObjectStore for MemoryStore {
        async fn stat(&self, url: &ObjectUrl) -> anyhow::Result<Option<ObjectMetadata>> {
            if self.fail {
                anyhow::bail!("lookup failed: timeout");
            }
            Ok(self.objects.get(url).cloned())
        }
    }

    async fn drain(waiter: &parallel::Waiter) -> Vec<anyhow::Error> {
        waiter.wait().await;
        let mut errors = waiter.errors();
        let mut drained = Vec::new();
        while let Some(error) = errors.recv().await {
            drained.push(error);
        }
        drained
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unconditional_transfer_runs() {
        let manager = parallel::Manager::new(2);
        let waiter = parallel::Waiter::new();
        let transfers = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&transfers);
        submit(
            &manager,
            &waiter,
            MemoryStore::default(),
            ObjectUrl::from("s3://bucket/src"),
            ObjectUrl::from("s3://bucket/dst"),
            conflict::Settings::default(),
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;
        let errors = drain(&waiter).await;
        assert!(errors.is_empty());
        assert_eq!(transfers.load(Ordering::SeqCst), 1);
        manager.close().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn skip_short_circuits_and_stays_acceptable() {
        let manager = parallel::Manager::new(2);
        let waiter = parallel::Waiter::new();
        let store = MemoryStore::default()
            .with("s3://bucket/src", 10, 100)
            .with("s3://bucket/dst", 10, 100);
        let transfers = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&transfers);
        submit(
            &manager,
            &waiter,
            store,
            ObjectUrl::from("s3://bucket/src"),
            ObjectUrl::from("s3://bucket/dst"),
            conflict::Settings {
                no_clobber: true,
                ..Default::default()
            },
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
        .await;
        let errors = drain(&waiter).await;
        // the transfer body never ran, but the skip is visible to the batch
        assert_eq!(transfers.load(Ordering::SeqCst), 0);
        assert_eq!(errors.len(), 1);
        assert!(is_acceptable_error(&errors[0]));
        assert_eq!(
            errors[0]
                .downcast_ref::<TransferError>()
                .and_then(TransferError::skip_reason),
            Some(SkipReason::ObjectExists)
        );
        manager.close().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lookup_failure_surfaces_as_fatal() {
        let manager = parallel::Manager::new(2);
        let waiter = parallel::Waiter::new();
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        submit(
            &manager,
            &waiter,
            store,
            ObjectUrl::from("s3://bucket/src"),
            ObjectUrl::from("s3://bucket/dst"),
            conflict::Settings {
                if_source_newer: true,
                ..Default::default()
            },
            || async { Ok(()) },
        )
        .await;
        let errors = drain(&waiter).await;
        assert_eq!(errors.len(), 1);
        assert!(!is_acceptable_error(&errors[0]));
        manager.close().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn transfer_failure_passes_through() {
        let manager = parallel::Manager::new(2);
        let waiter = parallel::Waiter::new();
        submit(
            &manager,
            &waiter,
            MemoryStore::default(),
            ObjectUrl::from("s3://bucket/src"),
            ObjectUrl::from("s3://bucket/dst"),
            conflict::Settings::default(),
            || async { anyhow::bail!("write failed: no space left on device") },
        )
        .await;
        let errors = drain(&waiter).await;
        assert_eq!(errors.len(), 1);
        assert!(!is_acceptable_error(&errors[0]));
        assert_eq!(
            format!("{:#}", errors[0]),
            "write failed: no space left on device"
        );
        manager.close().await;
    }
}
