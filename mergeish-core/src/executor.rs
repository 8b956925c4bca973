//! Fan-out execution of one operation over every repository
//!
//! [`FanOut::run_all`] always returns one [`Outcome`] per handle, in handle
//! order, and only after every unit of work has finished. In parallel mode
//! each repository gets its own task; an optional semaphore caps how many run
//! at once and an optional deadline turns a stuck unit into
//! [`Error::Timeout`] instead of stalling the batch.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::handle::RepoHandle;
use crate::outcome::Outcome;
use crate::{Error, Result};

/// Fan-out executor configuration
#[derive(Debug, Clone, Default)]
pub struct FanOut {
    /// Run repositories concurrently
    pub parallel: bool,
    /// Maximum concurrent units (unbounded when `None`)
    pub max_concurrency: Option<usize>,
    /// Deadline per unit of work
    pub timeout: Option<Duration>,
}

impl FanOut {
    /// Sequential executor with no deadline
    pub fn sequential() -> Self {
        Self::default()
    }

    /// Unbounded parallel executor with no deadline
    pub fn parallel() -> Self {
        Self {
            parallel: true,
            ..Self::default()
        }
    }

    /// Build an executor from workspace settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            parallel: settings.parallel,
            max_concurrency: settings.max_concurrency,
            timeout: settings.timeout,
        }
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run `op` against every handle and collect the outcomes in handle order
    pub async fn run_all<T, F, Fut>(&self, handles: &[Arc<RepoHandle>], op: F) -> Vec<Outcome<T>>
    where
        T: Send + 'static,
        F: Fn(Arc<RepoHandle>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        debug!(
            repos = handles.len(),
            parallel = self.parallel,
            max_concurrency = ?self.max_concurrency,
            timeout = ?self.timeout,
            "Dispatching fan-out"
        );

        if self.parallel {
            self.run_parallel(handles, op).await
        } else {
            self.run_sequential(handles, op).await
        }
    }

    async fn run_sequential<T, F, Fut>(
        &self,
        handles: &[Arc<RepoHandle>],
        op: F,
    ) -> Vec<Outcome<T>>
    where
        F: Fn(Arc<RepoHandle>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = with_deadline(self.timeout, op(Arc::clone(handle))).await;
            outcomes.push(Outcome::new(Arc::clone(handle), result));
        }
        outcomes
    }

    async fn run_parallel<T, F, Fut>(&self, handles: &[Arc<RepoHandle>], op: F) -> Vec<Outcome<T>>
    where
        T: Send + 'static,
        F: Fn(Arc<RepoHandle>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let op = Arc::new(op);
        let semaphore = self.max_concurrency.map(|max| Arc::new(Semaphore::new(max)));
        let timeout = self.timeout;

        // One task per repository; the join handle at index i is slot i
        let tasks: Vec<_> = handles
            .iter()
            .map(|handle| {
                let op = Arc::clone(&op);
                let handle = Arc::clone(handle);
                let semaphore = semaphore.clone();

                tokio::spawn(async move {
                    let _permit = match semaphore {
                        Some(semaphore) => Some(semaphore.acquire_owned().await.map_err(|e| {
                            Error::Other(format!("concurrency limiter closed: {}", e))
                        })?),
                        None => None,
                    };
                    with_deadline(timeout, op(handle)).await
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (handle, task) in handles.iter().zip(tasks) {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(repo = handle.name(), error = %e, "Fan-out task did not complete");
                    Err(Error::Other(format!("task failed: {}", e)))
                }
            };
            outcomes.push(Outcome::new(Arc::clone(handle), result));
        }
        outcomes
    }
}

async fn with_deadline<T, Fut>(timeout: Option<Duration>, fut: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .unwrap_or(Err(Error::Timeout(limit))),
        None => fut.await,
    }
}
