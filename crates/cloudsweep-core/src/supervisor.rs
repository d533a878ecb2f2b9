//! Job run supervision
//!
//! Starting or retrying a job returns a run in whatever state the provider
//! reports (usually queued). A supervisor then polls the run on a fixed
//! interval, pushes each snapshot through the indexer and stops at the first
//! terminal state. Supervisors are tracked by run id so they can be listed,
//! awaited or cancelled on shutdown.

use crate::indexer::Indexer;
use crate::resource::Resource;
use crate::status::Status;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Seconds between two polls of the same run.
    pub poll_interval_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
        }
    }
}

impl SupervisorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// How a supervisor ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run reached succeeded, failed or canceled.
    Terminal(Status),
    /// The supervisor was cancelled before that.
    Cancelled,
    /// Polling failed. The run keeps its last indexed snapshot.
    Aborted(String),
}

struct Supervised {
    cancel: CancellationToken,
    outcome: watch::Receiver<Option<RunOutcome>>,
}

/// Supervisors keyed by run id.
pub struct SupervisorRegistry<R> {
    interval: Duration,
    shutdown: CancellationToken,
    runs: Arc<Mutex<HashMap<String, Supervised>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> SupervisorRegistry<R> {
    pub fn new(config: SupervisorConfig) -> Self {
        Self::with_interval(config.poll_interval())
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            shutdown: CancellationToken::new(),
            runs: Arc::new(Mutex::new(HashMap::new())),
            handles: Mutex::new(Vec::new()),
            _resource: PhantomData,
        }
    }

    /// Start supervising `initial` until it reaches a terminal state.
    ///
    /// `fetch` re-reads the run by id. Returns false, and starts nothing, when
    /// the run is already supervised.
    pub fn spawn<F, Fut>(&self, initial: R, indexer: Arc<dyn Indexer<R>>, fetch: F) -> bool
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::Result<R>> + Send + 'static,
    {
        let run_id = initial.id();
        let mut runs = self.runs.lock();
        if runs.contains_key(&run_id) {
            debug!(run_id = %run_id, "job run already supervised");
            return false;
        }

        let cancel = self.shutdown.child_token();
        let (outcome_tx, outcome_rx) = watch::channel(None);
        runs.insert(
            run_id.clone(),
            Supervised {
                cancel: cancel.clone(),
                outcome: outcome_rx,
            },
        );

        let registry = Arc::clone(&self.runs);
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            let outcome = supervise(initial, indexer, fetch, interval, cancel).await;
            info!(run_id = %run_id, outcome = ?outcome, "job run supervision finished");
            outcome_tx.send_replace(Some(outcome));
            registry.lock().remove(&run_id);
        });
        drop(runs);

        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
        true
    }

    /// Ids of the runs currently supervised, sorted.
    pub fn active(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.runs.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_supervising(&self, run_id: &str) -> bool {
        self.runs.lock().contains_key(run_id)
    }

    /// Returns false when no such run is supervised.
    pub fn cancel(&self, run_id: &str) -> bool {
        match self.runs.lock().get(run_id) {
            Some(supervised) => {
                supervised.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Waits for the supervisor of `run_id`. `None` if it is not supervised.
    pub async fn wait(&self, run_id: &str) -> Option<RunOutcome> {
        let mut outcome = self.runs.lock().get(run_id)?.outcome.clone();
        let finished = outcome.wait_for(Option::is_some).await.ok()?;
        (*finished).clone()
    }

    /// Waits for every supervisor, without cancelling them.
    pub async fn wait_all(&self) {
        let handles: Vec<_> = self.handles.lock().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "job run supervisor panicked");
            }
        }
    }

    /// Cancels every supervisor and waits for them to stop.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.wait_all().await;
    }
}

fn terminal_status<R: Resource>(run: &R) -> Option<Status> {
    run.metadata().status.filter(Status::is_terminal)
}

async fn supervise<R, F, Fut>(
    initial: R,
    indexer: Arc<dyn Indexer<R>>,
    fetch: F,
    interval: Duration,
    cancel: CancellationToken,
) -> RunOutcome
where
    R: Resource,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = crate::Result<R>> + Send + 'static,
{
    let run_id = initial.id();
    let mut current = initial;

    loop {
        if let Some(status) = terminal_status(&current) {
            return RunOutcome::Terminal(status);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return RunOutcome::Cancelled,
            _ = tokio::time::sleep(interval) => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RunOutcome::Cancelled,
            fetched = fetch(run_id.clone()) => fetched,
        };

        match fetched {
            Ok(run) => {
                debug!(
                    run_id = %run_id,
                    status = ?run.metadata().status,
                    "polled job run"
                );
                if let Err(e) = indexer.index(&run).await {
                    warn!(run_id = %run_id, error = %e, "failed to index job run snapshot");
                }
                current = run;
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "stopped polling job run");
                return RunOutcome::Aborted(e.to_string());
            }
        }
    }
}
