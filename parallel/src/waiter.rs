use std::sync::atomic::{AtomicUsize, Ordering};

/// Counter that can be awaited until it drops back to zero.
#[derive(Debug, Default)]
pub(crate) struct WaitGroup {
    count: AtomicUsize,
    zero: tokio::sync::Notify,
}

impl WaitGroup {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn done(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.zero.notify_waiters();
        }
    }

    pub(crate) async fn wait(&self) {
        loop {
            // register interest before checking, so a concurrent done() cannot be missed
            let zero = self.zero.notified();
            if self.count.load(Ordering::Acquire) == 0 {
                return;
            }
            zero.await;
        }
    }
}

/// Marks one task complete (in its wait group) when dropped, so completion is
/// recorded on every exit path, including panics.
#[derive(Debug)]
pub(crate) struct CompletionGuard {
    group: std::sync::Arc<WaitGroup>,
}

impl CompletionGuard {
    pub(crate) fn new(group: std::sync::Arc<WaitGroup>) -> Self {
        group.add();
        Self { group }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.group.done();
    }
}

/// Per-batch completion tracker and error fan-in.
///
/// One waiter tracks exactly one batch of tasks, typically one command
/// invocation. The intended lifecycle is: submit tasks through
/// [`Manager::run`](crate::Manager::run), then [`Waiter::wait`], then drain
/// [`Waiter::errors`]. Error delivery is unbounded, so a task can always
/// report its outcome even when the consumer drains only after the batch is
/// done; draining concurrently works too.
#[derive(Debug)]
pub struct Waiter {
    pending: std::sync::Arc<WaitGroup>,
    error_tx: std::sync::Mutex<Option<tokio::sync::mpsc::UnboundedSender<anyhow::Error>>>,
    error_rx: std::sync::Mutex<Option<tokio::sync::mpsc::UnboundedReceiver<anyhow::Error>>>,
}

impl Waiter {
    #[must_use]
    pub fn new() -> Self {
        let (error_tx, error_rx) = tokio::sync::mpsc::unbounded_channel();
        Self {
            pending: std::sync::Arc::new(WaitGroup::default()),
            error_tx: std::sync::Mutex::new(Some(error_tx)),
            error_rx: std::sync::Mutex::new(Some(error_rx)),
        }
    }

    /// Registers one task with this batch; called by the manager before the
    /// task is scheduled, so `wait` can never return while the task runs.
    pub(crate) fn register(
        &self,
    ) -> (
        CompletionGuard,
        tokio::sync::mpsc::UnboundedSender<anyhow::Error>,
    ) {
        let error_tx = self
            .error_tx
            .lock()
            .unwrap()
            .clone()
            .expect("task submitted after wait() completed");
        (
            CompletionGuard::new(std::sync::Arc::clone(&self.pending)),
            error_tx,
        )
    }

    /// Blocks until every task registered with this batch has returned,
    /// success or failure, then closes the error channel so that draining
    /// [`Waiter::errors`] terminates.
    pub async fn wait(&self) {
        self.pending.wait().await;
        self.error_tx.lock().unwrap().take();
    }

    /// Takes the receiving half of the batch's error sequence: one error per
    /// failed task, in completion order. The sequence ends once [`Waiter::wait`]
    /// has run and all in-flight tasks have reported.
    ///
    /// # Panics
    ///
    /// Panics when called more than once; the receiver has a single owner.
    #[must_use]
    pub fn errors(&self) -> tokio::sync::mpsc::UnboundedReceiver<anyhow::Error> {
        self.error_rx
            .lock()
            .unwrap()
            .take()
            .expect("errors() may only be taken once per waiter")
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new()
    }
}
