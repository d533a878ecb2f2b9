//! Fetch task queue and discovery coordinator
//!
//! A scan is a fixed set of fetch tasks, one per (resource kind, locality) pair
//! plus a few account-wide ones. The coordinator pushes them all into a
//! bounded queue and lets `num_workers` workers drain it. Workers send every
//! fetched resource on the output channel, drop ignorable failures, put
//! rate-limited tasks back on the queue and abort the whole scan on anything
//! else.

use crate::classify::{Classify, ErrorClass};
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, error, info, warn};

/// Produces every discoverable resource of an account.
#[async_trait]
pub trait Discoverer<R>: Send + Sync {
    /// Sends resources on `out` until done. Returns `Ok(())` once every fetch
    /// completed, the first fatal error otherwise, or
    /// [`Error::Cancelled`] when `cancel` fired first.
    async fn discover(&self, cancel: CancellationToken, out: mpsc::Sender<R>) -> Result<()>;
}

/// Worker pool tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub num_workers: usize,

    /// How many retryable failures one task may hit before the scan gives up.
    pub max_retries: u32,

    /// Base delay before a requeue, multiplied by the attempt number. Zero
    /// requeues immediately.
    pub retry_delay_ms: u64,

    /// Capacity of the output channel.
    pub output_buffer: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            num_workers: 10,
            max_retries: 3,
            retry_delay_ms: 500,
            output_buffer: 100,
        }
    }
}

impl DiscoveryConfig {
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(u64::from(attempt)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(Error::InvalidConfig("num_workers must be at least 1".into()));
        }
        if self.output_buffer == 0 {
            return Err(Error::InvalidConfig("output_buffer must be at least 1".into()));
        }
        Ok(())
    }
}

type FetchFn<R, E> = Box<dyn Fn() -> BoxFuture<'static, std::result::Result<Vec<R>, E>> + Send + Sync>;

/// One unit of discovery work: "list resources of kind K in locality L".
///
/// The retry counter travels with the task.
pub struct FetchTask<R, E> {
    label: String,
    fetch: FetchFn<R, E>,
    retries: u32,
}

impl<R, E> FetchTask<R, E> {
    pub fn new<F, Fut>(label: impl Into<String>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Vec<R>, E>> + Send + 'static,
    {
        Self {
            label: label.into(),
            fetch: Box::new(move || Box::pin(fetch())),
            retries: 0,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }
}

impl<R, E> fmt::Debug for FetchTask<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTask")
            .field("label", &self.label)
            .field("retries", &self.retries)
            .finish()
    }
}

/// Bounded, requeueable queue of fetch tasks.
///
/// Capacity equals the initial task count. A task is only put back after it was
/// taken out, so a requeue never waits for room. `pending` counts tasks that are
/// queued or in flight; the queue is drained when it reaches zero.
pub struct TaskQueue<R, E> {
    tx: mpsc::Sender<FetchTask<R, E>>,
    rx: Mutex<mpsc::Receiver<FetchTask<R, E>>>,
    pending: AtomicUsize,
    drained: CancellationToken,
}

impl<R, E> TaskQueue<R, E> {
    pub fn new(tasks: Vec<FetchTask<R, E>>) -> Result<Self> {
        let (tx, rx) = mpsc::channel(tasks.len().max(1));
        let pending = tasks.len();

        for task in tasks {
            tx.try_send(task)
                .map_err(|_| Error::Internal("task queue overflow while seeding".into()))?;
        }

        let drained = CancellationToken::new();
        if pending == 0 {
            drained.cancel();
        }

        Ok(Self {
            tx,
            rx: Mutex::new(rx),
            pending: AtomicUsize::new(pending),
            drained,
        })
    }

    /// Next task, waiting while the queue is empty.
    pub async fn dequeue(&self) -> Option<FetchTask<R, E>> {
        self.rx.lock().await.recv().await
    }

    pub fn requeue(&self, task: FetchTask<R, E>) -> Result<()> {
        self.tx
            .try_send(task)
            .map_err(|e| Error::Internal(format!("failed to requeue task: {}", e)))
    }

    /// Marks one dequeued task as finished for good.
    pub fn complete(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.drained.cancel();
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Resolves once every task has completed.
    pub fn drained(&self) -> WaitForCancellationFuture<'_> {
        self.drained.cancelled()
    }
}

/// Runs fetch tasks on a fixed-size worker pool.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
    config: DiscoveryConfig,
}

impl Coordinator {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Drain `tasks` into `out`.
    ///
    /// Returns the first fatal error, [`Error::Cancelled`] if `cancel` fired,
    /// or `Ok(())` once every task completed. A fatal error cancels the other
    /// workers but not `cancel` itself.
    pub async fn run<R, E>(
        &self,
        tasks: Vec<FetchTask<R, E>>,
        cancel: CancellationToken,
        out: mpsc::Sender<R>,
    ) -> Result<()>
    where
        R: Send + 'static,
        E: Classify + fmt::Display + Send + 'static,
    {
        self.config.validate()?;

        let num_tasks = tasks.len();
        let queue = Arc::new(TaskQueue::new(tasks)?);
        let scan = cancel.child_token();

        info!(
            num_tasks,
            num_workers = self.config.num_workers,
            "starting discovery"
        );

        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.num_workers {
            workers.spawn(work(
                worker_id,
                Arc::clone(&queue),
                scan.clone(),
                out.clone(),
                self.config.clone(),
            ));
        }
        drop(out);

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            let result = joined
                .map_err(|e| Error::Internal(format!("discovery worker panicked: {}", e)))
                .and_then(|r| r);

            if let Err(e) = result {
                scan.cancel();
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        if let Some(e) = first_error {
            error!(error = %e, "discovery failed");
            return Err(e);
        }
        if cancel.is_cancelled() {
            info!(pending = queue.pending(), "discovery cancelled");
            return Err(Error::Cancelled);
        }

        info!(num_tasks, "discovery finished");
        Ok(())
    }
}

/// Worker loop. `Ok(())` means the queue drained or the scan was cancelled.
async fn work<R, E>(
    worker_id: usize,
    queue: Arc<TaskQueue<R, E>>,
    scan: CancellationToken,
    out: mpsc::Sender<R>,
    config: DiscoveryConfig,
) -> Result<()>
where
    R: Send + 'static,
    E: Classify + fmt::Display + Send + 'static,
{
    loop {
        let mut task = tokio::select! {
            biased;
            _ = scan.cancelled() => return Ok(()),
            _ = queue.drained() => return Ok(()),
            task = queue.dequeue() => match task {
                Some(task) => task,
                None => return Ok(()),
            },
        };

        let fetched = tokio::select! {
            biased;
            _ = scan.cancelled() => return Ok(()),
            fetched = (task.fetch)() => fetched,
        };

        match fetched {
            Ok(resources) => {
                debug!(
                    worker_id,
                    task = %task.label,
                    num_resources = resources.len(),
                    "fetch task done"
                );
                for resource in resources {
                    tokio::select! {
                        biased;
                        _ = scan.cancelled() => return Ok(()),
                        sent = out.send(resource) => {
                            if sent.is_err() {
                                scan.cancel();
                                return Err(Error::StreamClosed);
                            }
                        }
                    }
                }
                queue.complete();
            }
            Err(e) => match e.classify() {
                ErrorClass::Ignorable => {
                    debug!(worker_id, task = %task.label, error = %e, "dropping vanished resource");
                    queue.complete();
                }
                ErrorClass::Retryable => {
                    task.retries += 1;
                    if task.retries >= config.max_retries {
                        scan.cancel();
                        return Err(Error::Provider(format!(
                            "{}: giving up after {} attempts: {}",
                            task.label, task.retries, e
                        )));
                    }

                    warn!(
                        worker_id,
                        task = %task.label,
                        attempt = task.retries,
                        error = %e,
                        "rate limited, requeueing"
                    );

                    let delay = config.retry_delay(task.retries);
                    if !delay.is_zero() {
                        tokio::select! {
                            biased;
                            _ = scan.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    queue.requeue(task)?;
                }
                ErrorClass::Fatal => {
                    scan.cancel();
                    return Err(Error::Provider(format!("{}: {}", task.label, e)));
                }
            },
        }
    }
}
