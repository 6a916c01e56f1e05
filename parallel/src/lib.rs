//! Bounded parallel task execution for object-transfer operations
//!
//! This crate provides the concurrency engine shared by all ocp tools. A single
//! [`Manager`] bounds how many tasks may execute at once across the whole
//! process, while each logical batch of work (typically one command invocation)
//! tracks its own completion and failures through a [`Waiter`].
//!
//! # Overview
//!
//! - [`Manager`] - a counting semaphore over task execution. Constructed once at
//!   process start with a resolved worker count and closed once at shutdown,
//!   after every submitted task has finished.
//! - [`Waiter`] - a per-batch completion tracker and error fan-in channel. Many
//!   independent call sites share one manager while tracking their own batch.
//!
//! # Usage
//!
//! ```rust,no_run
//! use parallel::{Manager, Waiter};
//!
//! # async fn example() {
//! let manager = Manager::new(256);
//! let waiter = Waiter::new();
//!
//! for object in ["a", "b", "c"] {
//!     manager
//!         .run(
//!             async move {
//!                 // actual transfer of `object` goes here
//!                 tracing::debug!("transferring {}", object);
//!                 Ok(())
//!             },
//!             &waiter,
//!         )
//!         .await;
//! }
//!
//! waiter.wait().await;
//! let mut errors = waiter.errors();
//! while let Some(error) = errors.recv().await {
//!     eprintln!("transfer failed: {error:#}");
//! }
//!
//! manager.close().await;
//! # }
//! ```
//!
//! # Worker count resolution
//!
//! The configured worker count may be negative, in which case it is interpreted
//! as a multiplier against the number of CPU cores (e.g. `-4` on an 8-core
//! machine resolves to 32 workers). The resolved count is never below
//! [`MIN_WORKERS`].
//!
//! # Guarantees
//!
//! - At no instant do more than the resolved worker count of tasks execute
//!   concurrently under one manager.
//! - Every acquired slot is released exactly once, on every exit path of the
//!   task, including panics. Slot release and batch accounting are tied to
//!   guard lifetimes, never to explicit calls inside task bodies.
//! - No ordering exists among concurrently running tasks; errors surface in
//!   completion order, not submission order.
//!
//! Cancellation, timeouts and retries are intentionally not provided here; a
//! dispatched task always runs to completion.

mod waiter;

use std::sync::atomic::{AtomicBool, Ordering};

pub use waiter::Waiter;
use waiter::{CompletionGuard, WaitGroup};

/// Lower bound on the resolved worker count, regardless of configuration.
pub const MIN_WORKERS: usize = 2;

fn resolve_worker_count(workers: isize) -> usize {
    let resolved = if workers < 0 {
        num_cpus::get().saturating_mul(workers.unsigned_abs())
    } else {
        workers.unsigned_abs()
    };
    std::cmp::max(MIN_WORKERS, resolved)
}

/// Process-wide bounded-parallelism dispatcher.
///
/// The manager is the sole concurrency-bounding primitive; its slot pool is
/// shared by every batch submitted to it, so one batch's slow tasks can
/// throttle another's throughput. Construct one explicitly and pass it by
/// reference into whatever dispatches tasks; tests can then use small
/// deterministic capacities.
#[derive(Debug)]
pub struct Manager {
    semaphore: std::sync::Arc<tokio::sync::Semaphore>,
    outstanding: std::sync::Arc<WaitGroup>,
    closed: AtomicBool,
    worker_count: usize,
}

impl Manager {
    /// Creates a manager with the given configured worker count.
    ///
    /// A negative count is a multiplier against the number of CPU cores; the
    /// resolved count is floored at [`MIN_WORKERS`].
    #[must_use]
    pub fn new(workers: isize) -> Self {
        let worker_count = resolve_worker_count(workers);
        tracing::debug!("starting task manager with {} slots", worker_count);
        Self {
            semaphore: std::sync::Arc::new(tokio::sync::Semaphore::new(worker_count)),
            outstanding: std::sync::Arc::new(WaitGroup::default()),
            closed: AtomicBool::new(false),
            worker_count,
        }
    }

    /// Resolved worker count this manager was constructed with.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Registers `task` with `waiter`, waits for a free slot, then executes
    /// the task concurrently with the caller.
    ///
    /// The await blocks only while all slots are taken. On task failure the
    /// error is forwarded, unmodified, into the waiter's error channel. The
    /// slot and both completion counters are released exactly once whatever
    /// the task does, including panicking.
    ///
    /// # Panics
    ///
    /// Panics if called after [`Manager::close`]; submitting to a closed
    /// manager is a programmer error and must not silently deadlock.
    pub async fn run<F>(&self, task: F, waiter: &Waiter)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        assert!(
            !self.closed.load(Ordering::Acquire),
            "run() called on a closed manager"
        );
        let (batch_guard, error_tx) = waiter.register();
        let permit = std::sync::Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .expect("manager closed while tasks were still being submitted");
        let outstanding_guard = CompletionGuard::new(std::sync::Arc::clone(&self.outstanding));
        tokio::spawn(async move {
            let _permit = permit;
            let _outstanding_guard = outstanding_guard;
            let _batch_guard = batch_guard;
            if let Err(error) = task.await {
                // the receiver half may already be gone if the batch was abandoned
                let _ = error_tx.send(error);
            }
        });
    }

    /// Waits for every slot ever acquired, across all batches, to be
    /// released, then disables the manager.
    ///
    /// # Panics
    ///
    /// Panics when called more than once; the manager is torn down exactly
    /// once, at process shutdown.
    pub async fn close(&self) {
        let was_closed = self.closed.swap(true, Ordering::AcqRel);
        assert!(!was_closed, "close() called twice on the same manager");
        self.outstanding.wait().await;
        self.semaphore.close();
        tracing::debug!("task manager closed");
    }
}
