//! Work distribution configuration.

use super::defaults::{DEFAULT_LOCAL_BATCH_SIZE, DEFAULT_WORKERS};

/// Worker count and local batching for [`crate::distributor::WorkDistributor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributeConfig {
    workers: usize,
    local_batch_size: usize,
}

impl DistributeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// In-process workers to spread partitions across. Zero runs locally.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Tiles per sequential local batch. Clamped to at least 1.
    pub fn with_local_batch_size(mut self, size: usize) -> Self {
        self.local_batch_size = size.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn local_batch_size(&self) -> usize {
        self.local_batch_size
    }
}

impl Default for DistributeConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            local_batch_size: DEFAULT_LOCAL_BATCH_SIZE,
        }
    }
}
