//! Executor abstraction for CPU-bound work.
//!
//! Decoding, compositing and resampling are pure CPU work and must not stall
//! the async runtime's worker threads. Components depend on
//! [`BlockingExecutor`] rather than on Tokio directly so tests can run the
//! same work inline.
//!
//! # Design
//!
//! ```text
//! ┌──────────────────────┐
//! │  Samplers / Readers  │  (decode, composite, resample)
//! └──────────┬───────────┘
//!            │ depends on
//!            ▼
//! ┌──────────────────────┐
//! │  BlockingExecutor    │  (object-safe abstraction)
//! └──────────┬───────────┘
//!            │ implemented by
//!            ▼
//! ┌──────────────────────┐
//! │  TokioExecutor       │  spawn_blocking
//! │  InlineExecutor      │  current thread
//! └──────────────────────┘
//! ```

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use thiserror::Error;
use tokio::sync::oneshot;

/// A unit of blocking work handed to an executor.
pub type BlockingTask = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to an executor.
pub type SharedExecutor = Arc<dyn BlockingExecutor>;

/// Errors that can occur while running blocking work.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    /// The task panicked before producing a result
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// The executor dropped the task without running it
    #[error("executor shut down")]
    Shutdown,
}

/// Runs blocking (CPU-bound) closures off the async worker threads.
pub trait BlockingExecutor: Send + Sync + 'static {
    /// Spawns a task, resolving once it has finished running.
    fn spawn(&self, task: BlockingTask) -> BoxFuture<'static, Result<(), ExecutorError>>;
}

/// Typed convenience layer over [`BlockingExecutor::spawn`].
pub trait BlockingExecutorExt: BlockingExecutor {
    /// Executes `f` on the executor and returns its result.
    fn execute<F, R>(&self, f: F) -> BoxFuture<'static, Result<R, ExecutorError>>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let spawned = self.spawn(Box::new(move || {
            let _ = tx.send(f());
        }));
        async move {
            spawned.await?;
            rx.await.map_err(|_| ExecutorError::Shutdown)
        }
        .boxed()
    }
}

impl<T: BlockingExecutor + ?Sized> BlockingExecutorExt for T {}

/// Tokio-based executor delegating to `spawn_blocking`.
#[derive(Debug, Clone, Default)]
pub struct TokioExecutor;

impl TokioExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Convenience constructor for the shared handle.
    pub fn shared() -> SharedExecutor {
        Arc::new(Self)
    }
}

impl BlockingExecutor for TokioExecutor {
    fn spawn(&self, task: BlockingTask) -> BoxFuture<'static, Result<(), ExecutorError>> {
        async move {
            tokio::task::spawn_blocking(task).await.map_err(|e| {
                if e.is_cancelled() {
                    ExecutorError::Shutdown
                } else {
                    ExecutorError::TaskPanicked(e.to_string())
                }
            })
        }
        .boxed()
    }
}

/// Executes "blocking" work immediately on the calling thread.
///
/// Useful in tests and in contexts where the caller is already off the
/// async worker threads.
#[derive(Debug, Clone, Default)]
pub struct InlineExecutor;

impl InlineExecutor {
    pub fn shared() -> SharedExecutor {
        Arc::new(Self)
    }
}

impl BlockingExecutor for InlineExecutor {
    fn spawn(&self, task: BlockingTask) -> BoxFuture<'static, Result<(), ExecutorError>> {
        task();
        futures::future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_error_display() {
        let err = ExecutorError::TaskPanicked("oops".to_string());
        assert_eq!(format!("{}", err), "task panicked: oops");

        let err = ExecutorError::Shutdown;
        assert_eq!(format!("{}", err), "executor shut down");
    }

    #[tokio::test]
    async fn test_tokio_executor_returns_result() {
        let executor = TokioExecutor::new();

        let result = executor.execute(|| 6 * 7).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_tokio_executor_reports_panic() {
        let executor = TokioExecutor::new();

        let result: Result<(), _> = executor.execute(|| panic!("boom")).await;

        assert!(
            matches!(result, Err(ExecutorError::TaskPanicked(_))),
            "panicking task should surface as TaskPanicked"
        );
    }

    #[tokio::test]
    async fn test_inline_executor_runs_immediately() {
        let executor = InlineExecutor::shared();

        let result = executor.execute(|| "done").await;

        assert_eq!(result.unwrap(), "done");
    }
}
