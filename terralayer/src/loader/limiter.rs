//! Bounded-concurrency scheduler for loader work.
//!
//! Unlike a plain semaphore, work is *submitted* to the limiter and queued
//! FIFO until a slot frees up. A caller that loses interest drops its
//! [`Submission`]; the queued entry then completes as a no-op when it reaches
//! the front of the queue. Work that has already started runs to completion.
//!
//! # Admission
//!
//! ```text
//!   submit ──► SegQueue ──► try_schedule ──CAS active+1──► tokio::spawn
//!                 ▲                                              │
//!                 └────────── ActiveSlot::drop (active-1) ◄──────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let limiter = Arc::new(ConcurrencyLimiter::new(16, "http"));
//! let loader = http_loader.limited(Arc::clone(&limiter));
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use crossbeam_queue::SegQueue;
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::oneshot;
use tracing::{trace, warn};

use super::{LoadFuture, Loader};

/// Queued work. Yields `None` when its submitter has gone away.
type Job = Box<dyn FnOnce() -> Option<BoxFuture<'static, ()>> + Send + 'static>;

/// Runs at most `max_concurrent` submitted operations at a time.
pub struct ConcurrencyLimiter {
    /// Label for this limiter (e.g., "http")
    label: String,

    max_concurrent: usize,

    /// Operations currently holding a slot
    active: AtomicUsize,

    /// Peak concurrent operations observed (for tuning)
    peak_active: AtomicUsize,

    queue: SegQueue<Job>,
}

impl ConcurrencyLimiter {
    /// Creates a new limiter with the specified maximum concurrent operations.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent` is 0.
    pub fn new(max_concurrent: usize, label: impl Into<String>) -> Self {
        assert!(max_concurrent > 0, "max_concurrent must be > 0");

        Self {
            label: label.into(),
            max_concurrent,
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
            queue: SegQueue::new(),
        }
    }

    /// Queues `task` and returns a handle resolving to its output.
    ///
    /// The task is started once a slot is free. Dropping the returned
    /// [`Submission`] before that point cancels it.
    ///
    /// Work is spawned on the current Tokio runtime. Outside of one, the task
    /// is discarded and the submission resolves to `None` immediately.
    pub fn submit<F, Fut, T>(self: &Arc<Self>, task: F) -> Submission<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        if tokio::runtime::Handle::try_current().is_err() {
            warn!(limiter = %self.label, "submitted outside of a tokio runtime, dropping");
            drop(tx);
            return Submission { receiver: rx };
        }
        let job: Job = Box::new(move || {
            if tx.is_closed() {
                return None;
            }
            let fut = task();
            Some(
                async move {
                    let _ = tx.send(fut.await);
                }
                .boxed(),
            )
        });

        self.queue.push(job);
        self.try_schedule();

        Submission { receiver: rx }
    }

    /// Wraps `loader` so that every load is submitted to `limiter`.
    pub fn wrap<L>(limiter: &Arc<Self>, loader: L) -> LimitedLoader<L> {
        LimitedLoader {
            loader: Arc::new(loader),
            limiter: Arc::clone(limiter),
        }
    }

    /// Starts queued jobs while slots are available.
    fn try_schedule(self: &Arc<Self>) {
        // Submissions and completions both happen inside a runtime
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        loop {
            let active = self.active.load(Ordering::Acquire);
            if active >= self.max_concurrent {
                return;
            }
            if self
                .active
                .compare_exchange_weak(active, active + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                continue;
            }

            let Some(job) = self.queue.pop() else {
                self.active.fetch_sub(1, Ordering::AcqRel);
                // A job pushed between the pop and the release would otherwise
                // wait for the next completion.
                if self.queue.is_empty() {
                    return;
                }
                continue;
            };

            match job() {
                Some(fut) => {
                    self.update_peak(active + 1);
                    let slot = ActiveSlot {
                        limiter: Arc::clone(self),
                    };
                    runtime.spawn(async move {
                        let _slot = slot;
                        fut.await;
                    });
                }
                None => {
                    trace!(limiter = %self.label, "skipping cancelled submission");
                    self.active.fetch_sub(1, Ordering::AcqRel);
                }
            }
        }
    }

    /// Updates the peak counter if current exceeds it.
    fn update_peak(&self, current: usize) {
        let mut peak = self.peak_active.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_active.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }

    /// Returns the label for this limiter.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the maximum number of concurrent operations allowed.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Returns the current number of running operations.
    pub fn in_flight(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Returns the peak number of concurrent operations observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_active.load(Ordering::Relaxed)
    }

    /// Returns the number of operations waiting for a slot.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for ConcurrencyLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyLimiter")
            .field("label", &self.label)
            .field("max_concurrent", &self.max_concurrent)
            .field("active", &self.in_flight())
            .field("queued", &self.queued())
            .finish()
    }
}

/// Slot held by a running job, released on drop.
struct ActiveSlot {
    limiter: Arc<ConcurrencyLimiter>,
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.limiter.active.fetch_sub(1, Ordering::AcqRel);
        self.limiter.try_schedule();
    }
}

/// Handle to a submitted operation.
///
/// Resolves to `None` if the operation was dropped without producing a value.
#[must_use = "dropping a submission cancels it"]
pub struct Submission<T> {
    receiver: oneshot::Receiver<T>,
}

impl<T> Submission<T> {
    /// Cancels the operation if it has not started yet.
    pub fn cancel(self) {}
}

impl<T> Future for Submission<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(Result::ok)
    }
}

/// Loader produced by [`ConcurrencyLimiter::wrap`].
pub struct LimitedLoader<L> {
    loader: Arc<L>,
    limiter: Arc<ConcurrencyLimiter>,
}

impl<K, V, L> Loader<K, V> for LimitedLoader<L>
where
    L: Loader<K, V>,
    K: Send + 'static,
    V: Send + 'static,
{
    fn load(&self, key: K) -> LoadFuture<V> {
        let loader = Arc::clone(&self.loader);
        let submission = self.limiter.submit(move || loader.load(key));
        async move { submission.await.flatten() }.boxed()
    }
}
