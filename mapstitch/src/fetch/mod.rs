//! Per-partition tile fetching.
//!
//! [`FetchExecutor`] walks a list of tile requests, sequentially by default
//! or with a bounded number of scoped worker threads. Each tile
//! gets up to `max_attempts` tries with a fixed pre-request delay and
//! exponential backoff between retries. A successful image has its
//! watermark band cropped off and is re-encoded as JPEG.
//!
//! A tile that cannot be fetched becomes a [`TileResult`] with no bytes;
//! nothing a single tile does can fail the batch.

mod error;

pub use error::FetchError;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use image::imageops;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::codec::{decode_rgb, encode_jpeg};
use crate::config::{FetchConfig, PROGRESS_LOG_INTERVAL};
use crate::grid::{GridPlan, TileRequest, TileResult};
use crate::provider::{ProviderError, TileProvider};

/// Fetches, crops and re-encodes tiles from a [`TileProvider`].
pub struct FetchExecutor<P: TileProvider> {
    provider: P,
    config: FetchConfig,
}

impl<P: TileProvider> FetchExecutor<P> {
    pub fn new(provider: P, config: FetchConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches every request, returning one result per request in order.
    ///
    /// Up to `concurrency` tiles are in flight at once on scoped threads.
    /// Blocks the calling thread for the network round trips and retry
    /// sleeps; run it on a blocking pool from async code.
    pub fn fetch(&self, requests: &[TileRequest], plan: &GridPlan) -> Vec<TileResult> {
        let total = requests.len();
        let quality = self.config.tile_quality_for(total);
        let workers = self.config.concurrency().min(total.max(1));
        let progress = Progress::new(total);

        info!(
            provider = self.provider.name(),
            tiles = total,
            quality,
            concurrency = workers,
            "Fetching tiles"
        );

        let results = if workers <= 1 {
            requests
                .iter()
                .map(|request| self.fetch_one(request, plan, quality, &progress))
                .collect()
        } else {
            self.fetch_parallel(requests, plan, quality, workers, &progress)
        };

        let succeeded = progress.succeeded.load(Ordering::Relaxed);
        info!(
            provider = self.provider.name(),
            succeeded,
            failed = total - succeeded,
            total,
            "Fetch complete"
        );

        results
    }

    /// Workers pull request indices from a shared cursor; results are
    /// slotted back by index so output order matches `requests`.
    fn fetch_parallel(
        &self,
        requests: &[TileRequest],
        plan: &GridPlan,
        quality: u8,
        workers: usize,
        progress: &Progress,
    ) -> Vec<TileResult> {
        let cursor = AtomicUsize::new(0);
        let mut slots: Vec<Option<TileResult>> = vec![None; requests.len()];

        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(|| {
                        let mut fetched = Vec::new();
                        loop {
                            let index = cursor.fetch_add(1, Ordering::Relaxed);
                            let Some(request) = requests.get(index) else {
                                break;
                            };
                            let result = self.fetch_one(request, plan, quality, progress);
                            fetched.push((index, result));
                        }
                        fetched
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(fetched) => {
                        for (index, result) in fetched {
                            slots[index] = Some(result);
                        }
                    }
                    Err(_) => warn!("Fetch worker panicked, its tiles stay blank"),
                }
            }
        });

        slots
            .into_iter()
            .zip(requests)
            .map(|(slot, request)| slot.unwrap_or_else(|| TileResult::missing_for(request)))
            .collect()
    }

    fn fetch_one(
        &self,
        request: &TileRequest,
        plan: &GridPlan,
        quality: u8,
        progress: &Progress,
    ) -> TileResult {
        let result = match self.fetch_tile(request, plan, quality) {
            Ok(bytes) => {
                progress.succeeded.fetch_add(1, Ordering::Relaxed);
                TileResult::present(request.row, request.col, bytes)
            }
            Err(e) => {
                warn!(
                    row = request.row,
                    col = request.col,
                    attempts = e.attempts(),
                    error = %e,
                    "Tile fetch failed, leaving cell blank"
                );
                TileResult::missing_for(request)
            }
        };
        progress.tick();
        result
    }

    /// Fetches one tile with retries, returning the cropped JPEG.
    pub fn fetch_tile(
        &self,
        request: &TileRequest,
        plan: &GridPlan,
        quality: u8,
    ) -> Result<Vec<u8>, FetchError> {
        let max_attempts = self.config.max_attempts();
        let mut attempt = 1;

        let image = loop {
            pause(self.config.request_delay());

            debug!(
                provider = self.provider.name(),
                row = request.row,
                col = request.col,
                attempt,
                "Tile fetch attempt"
            );

            let err = match self.attempt(request, plan) {
                Ok(image) => break image,
                Err(e) => e,
            };

            let retryable = err.is_retryable();
            warn!(
                row = request.row,
                col = request.col,
                attempt,
                retryable,
                error = %err,
                "Tile fetch error"
            );

            if !retryable {
                return Err(FetchError::Permanent {
                    row: request.row,
                    col: request.col,
                    attempts: attempt,
                    source: err,
                });
            }
            if attempt >= max_attempts {
                return Err(FetchError::Exhausted {
                    row: request.row,
                    col: request.col,
                    attempts: attempt,
                    source: err,
                });
            }

            let backoff = self.config.backoff_for_attempt(attempt);
            debug!(backoff_ms = backoff.as_millis() as u64, "Backoff before retry");
            pause(backoff);
            attempt += 1;
        };

        let cropped = crop_bottom(&image, plan.crop_bottom_px());
        encode_jpeg(&cropped, quality).map_err(|source| FetchError::Encode {
            row: request.row,
            col: request.col,
            source,
        })
    }

    /// One provider round trip plus decode. Undecodable bodies are retryable.
    fn attempt(&self, request: &TileRequest, plan: &GridPlan) -> Result<RgbImage, ProviderError> {
        let bytes = self.provider.fetch_tile(&request.query(plan))?;
        decode_rgb(&bytes).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

/// Removes `rows` pixel rows from the bottom edge, keeping at least one.
pub fn crop_bottom(image: &RgbImage, rows: u32) -> RgbImage {
    let height = image.height().saturating_sub(rows).max(1);
    if height == image.height() {
        return image.clone();
    }
    imageops::crop_imm(image, 0, 0, image.width(), height).to_image()
}

/// Shared counters for progress logging across fetch workers.
struct Progress {
    total: usize,
    done: AtomicUsize,
    succeeded: AtomicUsize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            total,
            done: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
        }
    }

    fn tick(&self) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_LOG_INTERVAL == 0 && done < self.total {
            let succeeded = self.succeeded.load(Ordering::Relaxed);
            info!(done, total = self.total, succeeded, "Fetch progress");
        }
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
