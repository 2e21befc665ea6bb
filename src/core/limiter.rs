//! Bounded admission of concurrent acquisitions

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Runs at most `max_concurrent` tasks at a time.
///
/// Each spawned task owns its permit, so a slot is released as soon as the
/// task finishes, fails or panics.
pub struct ConcurrencyLimiter<T> {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    tasks: JoinSet<T>,
}

impl<T: Send + 'static> ConcurrencyLimiter<T> {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            tasks: JoinSet::new(),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Number of admitted tasks that have not settled yet.
    pub fn in_flight(&self) -> usize {
        self.max_concurrent - self.semaphore.available_permits()
    }

    /// Waits for a free slot, then starts `task`.
    ///
    /// Only the caller waits here; tasks already admitted keep running.
    pub async fn submit<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                // The semaphore is never closed while the limiter is alive.
                warn!("Limiter semaphore closed, dropping task: {}", e);
                return;
            }
        };

        self.tasks.spawn(async move {
            let _permit = permit;
            task.await
        });
    }

    /// Collects results of tasks that already settled without waiting.
    pub fn take_settled(&mut self) -> Vec<T> {
        let mut settled = Vec::new();
        while let Some(joined) = self.tasks.try_join_next() {
            if let Some(value) = Self::unwrap_joined(joined) {
                settled.push(value);
            }
        }
        settled
    }

    /// Waits until every submitted task has settled.
    pub async fn join_all(mut self) -> Vec<T> {
        let mut settled = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            if let Some(value) = Self::unwrap_joined(joined) {
                settled.push(value);
            }
        }
        settled
    }

    fn unwrap_joined(joined: Result<T, tokio::task::JoinError>) -> Option<T> {
        match joined {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Acquisition task did not complete: {}", e);
                None
            }
        }
    }
}
