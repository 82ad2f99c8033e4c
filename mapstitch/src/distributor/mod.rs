//! Spreading a region's tile requests over workers.
//!
//! With no workers, requests are fetched locally in fixed-size sequential
//! batches so only one batch of encoded tiles is in flight at a time. With
//! `N` workers, request `i` goes to worker `i % N`. Tile difficulty is
//! spatially correlated (throttled areas, missing imagery), and round-robin
//! spreads a slow area across every worker instead of handing it to one.
//!
//! All partitions are submitted before any is awaited. A worker that fails
//! as a whole costs only its own tiles, which come back as missing results.

mod worker;

pub use worker::{FetchHandle, FetchJob, FetchResponder, LocalWorker, Worker, WorkerError};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::DistributeConfig;
use crate::grid::{GridPlan, TileRequest, TileResult};

/// Per-worker bookkeeping for one distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStats {
    pub worker: String,
    /// Requests in this worker's partition
    pub assigned: usize,
    /// Results that carried image data
    pub present: usize,
    /// Whether the worker call itself failed
    pub transport_failed: bool,
}

/// Results of a distribution plus how each worker fared.
#[derive(Debug, Clone, Default)]
pub struct DistributionOutcome {
    /// One result per request, grouped by partition
    pub results: Vec<TileResult>,
    pub workers: Vec<WorkerStats>,
}

impl DistributionOutcome {
    pub fn present_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_present()).count()
    }

    pub fn missing_count(&self) -> usize {
        self.results.len() - self.present_count()
    }

    pub fn transport_failures(&self) -> usize {
        self.workers.iter().filter(|w| w.transport_failed).count()
    }
}

/// Fans tile requests out to workers and gathers the results.
pub struct WorkDistributor {
    workers: Vec<Arc<dyn Worker>>,
    local: Arc<dyn Worker>,
    local_batch_size: usize,
}

impl WorkDistributor {
    /// Creates a distributor.
    ///
    /// `local` runs the sequential batches used when `workers` is empty.
    pub fn new(
        workers: Vec<Arc<dyn Worker>>,
        local: Arc<dyn Worker>,
        config: &DistributeConfig,
    ) -> Self {
        Self {
            workers,
            local,
            local_batch_size: config.local_batch_size().max(1),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Fetches every request, returning exactly one result per request.
    pub async fn distribute(
        &self,
        requests: &[TileRequest],
        plan: &GridPlan,
    ) -> DistributionOutcome {
        if requests.is_empty() {
            return DistributionOutcome::default();
        }

        if self.workers.is_empty() {
            self.run_local(requests, plan).await
        } else {
            self.run_partitioned(requests, plan).await
        }
    }

    async fn run_local(&self, requests: &[TileRequest], plan: &GridPlan) -> DistributionOutcome {
        let batches = requests.len().div_ceil(self.local_batch_size);
        info!(
            tiles = requests.len(),
            batches,
            batch_size = self.local_batch_size,
            "Fetching locally"
        );

        let mut results = Vec::with_capacity(requests.len());
        let mut transport_failed = false;

        for (index, batch) in requests.chunks(self.local_batch_size).enumerate() {
            let handle = self.local.submit_fetch(FetchJob {
                requests: batch.to_vec(),
                plan: *plan,
            });

            match handle.wait().await {
                Ok(batch_results) => results.extend(reconcile(batch, batch_results)),
                Err(e) => {
                    error!(
                        batch = index + 1,
                        tiles = batch.len(),
                        error = %e,
                        "Local batch failed"
                    );
                    transport_failed = true;
                    results.extend(batch.iter().map(TileResult::missing_for));
                }
            }

            if batches > 1 {
                info!(batch = index + 1, batches, "Local batch complete");
            }
        }

        let present = results.iter().filter(|r| r.is_present()).count();
        DistributionOutcome {
            results,
            workers: vec![WorkerStats {
                worker: self.local.name().to_string(),
                assigned: requests.len(),
                present,
                transport_failed,
            }],
        }
    }

    async fn run_partitioned(
        &self,
        requests: &[TileRequest],
        plan: &GridPlan,
    ) -> DistributionOutcome {
        let partitions = round_robin(requests, self.workers.len());

        // Submit everything first so no worker waits on another's result.
        let mut pending = Vec::with_capacity(partitions.len());
        for (worker, partition) in self.workers.iter().zip(partitions) {
            if partition.is_empty() {
                continue;
            }
            info!(worker = worker.name(), tiles = partition.len(), "Dispatching partition");
            let handle = worker.submit_fetch(FetchJob {
                requests: partition.clone(),
                plan: *plan,
            });
            pending.push((worker.name().to_string(), partition, handle));
        }

        let mut outcome = DistributionOutcome {
            results: Vec::with_capacity(requests.len()),
            workers: Vec::with_capacity(pending.len()),
        };

        for (worker, partition, handle) in pending {
            let (results, transport_failed) = match handle.wait().await {
                Ok(results) => (reconcile(&partition, results), false),
                Err(e) => {
                    error!(
                        worker = %worker,
                        tiles = partition.len(),
                        error = %e,
                        "Worker failed, its tiles will be blank"
                    );
                    (partition.iter().map(TileResult::missing_for).collect(), true)
                }
            };

            let present = results.iter().filter(|r| r.is_present()).count();
            info!(worker = %worker, present, assigned = partition.len(), "Partition collected");

            outcome.workers.push(WorkerStats {
                worker,
                assigned: partition.len(),
                present,
                transport_failed,
            });
            outcome.results.extend(results);
        }

        outcome
    }
}

/// Splits `items` into `n` round-robin partitions: `items[i]`, `items[i+n]`, ...
/// go to partition `i`. Partition sizes differ by at most one.
pub fn round_robin<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    let n = n.max(1);
    let mut partitions: Vec<Vec<T>> = (0..n)
        .map(|i| Vec::with_capacity(items.len() / n + usize::from(i < items.len() % n)))
        .collect();
    for (index, item) in items.iter().enumerate() {
        partitions[index % n].push(item.clone());
    }
    partitions
}

/// Aligns a worker's answer with the partition it was given.
///
/// Results are returned in request order. Requests the worker did not answer
/// become missing tiles; results for cells outside the partition are dropped.
fn reconcile(partition: &[TileRequest], results: Vec<TileResult>) -> Vec<TileResult> {
    if results.len() == partition.len()
        && results
            .iter()
            .zip(partition)
            .all(|(res, req)| res.row == req.row && res.col == req.col)
    {
        return results;
    }

    warn!(
        expected = partition.len(),
        returned = results.len(),
        "Worker results do not match its partition, realigning"
    );

    let mut by_cell: HashMap<(u32, u32), TileResult> =
        results.into_iter().map(|r| ((r.row, r.col), r)).collect();
    partition
        .iter()
        .map(|req| {
            by_cell
                .remove(&(req.row, req.col))
                .unwrap_or_else(|| TileResult::missing_for(req))
        })
        .collect()
}
