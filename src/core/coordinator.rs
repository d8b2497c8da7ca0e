//! # Shutdown coordinator: owns in-flight click tasks and the shutdown broadcast.
//!
//! A counting join over [`TaskTracker`]: every delayed click task is spawned through (or
//! registered with) the coordinator, which can then wait until the count drops to zero.
//!
//! ## Architecture
//! ```text
//! Generator ──spawn(click task)──► TaskTracker (count += 1)
//!                                       │ task completes (either branch) → count -= 1
//! shutdown():        token.cancel() ──► every waiting click task observes it at once
//! drain_and_wait():  tracker.close() ─► tracker.wait() returns when count == 0
//! ```
//!
//! ## Rules
//! - Completion is signalled exactly once per task, by the tracker, when the task's future
//!   finishes; a task cannot be dropped from the count silently.
//! - Tasks spawned after drain began are still tracked and still awaited.
//! - The coordinator never retries or buffers anything.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::{TaskTracker, task_tracker::TaskTrackerToken};

use crate::error::RuntimeError;

/// Manual in-flight registration. Completion is signalled when the guard is dropped.
#[derive(Debug)]
pub struct InFlight {
    _token: TaskTrackerToken,
}

/// Tracks outstanding click tasks and broadcasts shutdown to them.
#[derive(Clone, Debug)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tracker: TaskTracker,
}

impl ShutdownCoordinator {
    /// Creates a coordinator broadcasting shutdown through `token`.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            tracker: TaskTracker::new(),
        }
    }

    /// The shared shutdown signal.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Broadcasts shutdown to every waiting party.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// True once shutdown has been broadcast.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once a drain has begun.
    pub fn is_draining(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Registers one unit of in-flight work without spawning it.
    pub fn register(&self) -> InFlight {
        InFlight {
            _token: self.tracker.token(),
        }
    }

    /// Spawns `task` and counts it until it finishes.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Tasks currently registered.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every registered task has completed.
    pub async fn drain_and_wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Like [`drain_and_wait`](Self::drain_and_wait), bounded by `grace` when given.
    pub async fn drain_with_grace(&self, grace: Option<Duration>) -> Result<(), RuntimeError> {
        let Some(grace) = grace else {
            self.drain_and_wait().await;
            return Ok(());
        };
        match tokio::time::timeout(grace, self.drain_and_wait()).await {
            Ok(()) => Ok(()),
            Err(_elapsed) => Err(RuntimeError::GraceExceeded {
                grace,
                outstanding: self.in_flight(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn drain_blocks_until_every_task_completes() {
        const K: usize = 5;
        let coord = ShutdownCoordinator::new(CancellationToken::new());
        let release = CancellationToken::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..K {
            let release = release.clone();
            let done = done.clone();
            coord.spawn(async move {
                release.cancelled().await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::task::yield_now().await;
        assert_eq!(coord.in_flight(), K);

        let blocked = tokio::time::timeout(Duration::from_secs(60), coord.drain_and_wait()).await;
        assert!(blocked.is_err(), "drain returned with {K} tasks outstanding");
        assert_eq!(done.load(Ordering::SeqCst), 0);

        release.cancel();
        coord.drain_and_wait().await;
        assert_eq!(done.load(Ordering::SeqCst), K);
        assert_eq!(coord.in_flight(), 0);
    }

    #[tokio::test]
    async fn manual_registration_counts_until_dropped() {
        let coord = ShutdownCoordinator::new(CancellationToken::new());
        let guard = coord.register();
        assert_eq!(coord.in_flight(), 1);

        let waiter = {
            let coord = coord.clone();
            tokio::spawn(async move { coord.drain_and_wait().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(coord.is_draining());
    }

    #[tokio::test]
    async fn shutdown_reaches_every_task_at_once() {
        let coord = ShutdownCoordinator::new(CancellationToken::new());
        let observed = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let token = coord.token().clone();
            let observed = observed.clone();
            coord.spawn(async move {
                token.cancelled().await;
                observed.fetch_add(1, Ordering::SeqCst);
            });
        }

        coord.shutdown();
        coord.drain_and_wait().await;
        assert!(coord.is_shutting_down());
        assert_eq!(observed.load(Ordering::SeqCst), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn grace_bounds_the_wait() {
        let coord = ShutdownCoordinator::new(CancellationToken::new());
        let _stuck = coord.register();

        let err = coord
            .drain_with_grace(Some(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::GraceExceeded { outstanding: 1, .. }
        ));
    }

    #[tokio::test]
    async fn empty_drain_returns_immediately() {
        let coord = ShutdownCoordinator::new(CancellationToken::new());
        coord.drain_with_grace(None).await.unwrap();
    }
}
