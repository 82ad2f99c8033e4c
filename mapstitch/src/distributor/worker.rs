//! Worker abstraction for partition fetches.
//!
//! A [`Worker`] accepts a [`FetchJob`] and immediately returns a
//! [`FetchHandle`]; the results arrive later through a oneshot channel. This
//! lets the distributor submit every partition before awaiting any of them.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

use crate::fetch::FetchExecutor;
use crate::grid::{GridPlan, TileRequest, TileResult};
use crate::provider::TileProvider;

/// One partition of a region's requests, with the plan needed to fetch them.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub requests: Vec<TileRequest>,
    pub plan: GridPlan,
}

/// Failure of a worker call as a whole, not of any single tile.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker went away without answering.
    #[error("worker '{worker}' disconnected before returning results")]
    Disconnected { worker: String },

    /// The worker reported that it could not run the job.
    #[error("worker '{worker}' failed: {message}")]
    Failed { worker: String, message: String },
}

/// Result slot for one submitted job. Awaiting consumes the handle.
#[derive(Debug)]
pub struct FetchHandle {
    worker: String,
    rx: oneshot::Receiver<Result<Vec<TileResult>, WorkerError>>,
}

/// Sending half paired with a [`FetchHandle`].
#[derive(Debug)]
pub struct FetchResponder {
    tx: oneshot::Sender<Result<Vec<TileResult>, WorkerError>>,
}

impl FetchHandle {
    /// Creates a connected responder/handle pair for `worker`.
    pub fn channel(worker: impl Into<String>) -> (FetchResponder, FetchHandle) {
        let (tx, rx) = oneshot::channel();
        (
            FetchResponder { tx },
            FetchHandle {
                worker: worker.into(),
                rx,
            },
        )
    }

    /// A handle that is already resolved, for synchronous workers.
    pub fn ready(
        worker: impl Into<String>,
        result: Result<Vec<TileResult>, WorkerError>,
    ) -> FetchHandle {
        let (responder, handle) = Self::channel(worker);
        responder.send(result);
        handle
    }

    pub fn worker(&self) -> &str {
        &self.worker
    }

    /// Waits for the worker's answer.
    ///
    /// A responder dropped without sending (for example because the task
    /// running the job panicked) reads as [`WorkerError::Disconnected`].
    pub async fn wait(self) -> Result<Vec<TileResult>, WorkerError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(WorkerError::Disconnected {
                worker: self.worker,
            }),
        }
    }
}

impl FetchResponder {
    /// Delivers the job's outcome. A handle that was dropped is ignored.
    pub fn send(self, result: Result<Vec<TileResult>, WorkerError>) {
        let _ = self.tx.send(result);
    }
}

/// Something that can run a [`FetchJob`] somewhere.
pub trait Worker: Send + Sync {
    /// Name used in logs and statistics.
    fn name(&self) -> &str;

    /// Starts `job` and returns without waiting for it.
    fn submit_fetch(&self, job: FetchJob) -> FetchHandle;
}

/// Runs jobs in-process on tokio's blocking thread pool.
///
/// Must be submitted to from inside a tokio runtime.
pub struct LocalWorker<P: TileProvider + 'static> {
    name: String,
    executor: Arc<FetchExecutor<P>>,
}

impl<P: TileProvider + 'static> LocalWorker<P> {
    pub fn new(name: impl Into<String>, executor: Arc<FetchExecutor<P>>) -> Self {
        Self {
            name: name.into(),
            executor,
        }
    }
}

impl<P: TileProvider + 'static> Worker for LocalWorker<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit_fetch(&self, job: FetchJob) -> FetchHandle {
        let (responder, handle) = FetchHandle::channel(self.name.clone());
        let executor = Arc::clone(&self.executor);
        let name = self.name.clone();

        debug!(worker = %name, tiles = job.requests.len(), "Submitting fetch job");

        tokio::task::spawn_blocking(move || {
            let results = executor.fetch(&job.requests, &job.plan);
            debug!(worker = %name, results = results.len(), "Fetch job finished");
            responder.send(Ok(results));
        });

        handle
    }
}
