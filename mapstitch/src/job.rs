//! One region, end to end: plan, fetch, assemble, write.
//!
//! [`RegionJob`] wires the pipeline stages together from a [`ConfigFile`].
//! The artifact helpers at the bottom of this module turn a job's output
//! into files, including the error artifact written when a job fails.

use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::codec::{EncodedImage, ImageFormat};
use crate::config::{
    resolve_credential, ConfigFile, ConfigFileError, GridConfig, DEFAULT_MERGE_QUALITY,
};
use crate::coord::{CoordError, Region};
use crate::distributor::{LocalWorker, WorkDistributor, Worker};
use crate::fetch::FetchExecutor;
use crate::grid::{GridPlan, GridPlanner};
use crate::input::InputError;
use crate::mosaic::{merge_dumps, Assembly, Encoding, MosaicAssembler, MosaicError};
use crate::output::{
    decode_envelope, encode_envelope, EnvelopeError, TileDataError, TileDump,
};
use crate::provider::{
    DryRunProvider, ProviderError, ReqwestClient, StaticMapsProvider, TileProvider,
};

/// Anything that stops a job from producing output.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigFileError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("invalid region: {0}")]
    Coord(#[from] CoordError),

    #[error("provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("mosaic assembly failed: {0}")]
    Mosaic(#[from] MosaicError),

    #[error("invalid envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("invalid tile data in {path}: {source}")]
    TileData {
        path: String,
        #[source]
        source: TileDataError,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Task(String),
}

impl JobError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        JobError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Per-run switches that are not part of the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOptions {
    /// Stop after fetching and emit a tile-data dump instead of a mosaic
    pub download_only: bool,
    /// First request index to process
    pub tile_start: usize,
    /// One past the last request index; `None` means all
    pub tile_end: Option<usize>,
}

/// What a job produced.
#[derive(Debug, Clone)]
pub enum JobOutput {
    Mosaic(Assembly),
    TileData(TileDump),
}

/// Summary of a finished job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub plan: GridPlan,
    /// Requests handled by this run (after range selection)
    pub tiles_requested: usize,
    pub tiles_present: usize,
    pub output: JobOutput,
}

/// Builds the provider for a run.
///
/// Resolves the credential first, so a missing key fails before any
/// request is made. Creates a blocking HTTP client: call it outside the
/// async runtime.
pub fn build_provider(
    config: &ConfigFile,
    dry_run: bool,
) -> Result<Arc<dyn TileProvider>, JobError> {
    if dry_run {
        info!("Dry run: tiles are synthesised locally");
        return Ok(Arc::new(DryRunProvider::new()));
    }

    let credential = resolve_credential(&config.provider)?;
    let client = ReqwestClient::with_timeout(config.fetch.request_timeout())?;
    Ok(Arc::new(StaticMapsProvider::with_base_url(
        client,
        credential,
        &config.provider.base_url,
    )))
}

/// The plan → fetch → assemble pipeline for a region.
pub struct RegionJob {
    planner: GridPlanner,
    distributor: WorkDistributor,
    assembler: MosaicAssembler,
}

impl RegionJob {
    pub fn new(
        planner: GridPlanner,
        distributor: WorkDistributor,
        assembler: MosaicAssembler,
    ) -> Self {
        Self {
            planner,
            distributor,
            assembler,
        }
    }

    /// Wires every stage from `config` around `provider`.
    ///
    /// `[distribute] workers` in-process workers share one fetch executor;
    /// with zero workers the distributor fetches in local batches.
    pub fn from_config(config: &ConfigFile, provider: Arc<dyn TileProvider>) -> Self {
        let executor = Arc::new(FetchExecutor::new(provider, config.fetch));

        let workers: Vec<Arc<dyn Worker>> = (0..config.distribute.workers())
            .map(|i| {
                Arc::new(LocalWorker::new(format!("worker-{}", i), Arc::clone(&executor)))
                    as Arc<dyn Worker>
            })
            .collect();
        let local: Arc<dyn Worker> = Arc::new(LocalWorker::new("local", executor));

        Self::new(
            GridPlanner::new(config.grid),
            WorkDistributor::new(workers, local, &config.distribute),
            MosaicAssembler::new(config.mosaic, config.compression.clone()),
        )
    }

    pub fn grid_config(&self) -> &GridConfig {
        self.planner.config()
    }

    /// Runs the pipeline for one region.
    ///
    /// Tile failures never fail the job; they show up as blank cells and in
    /// [`JobReport::tiles_present`].
    pub async fn run(&self, region: &Region, options: &JobOptions) -> Result<JobReport, JobError> {
        let (plan, requests) = self.planner.plan(region)?;
        let selected = GridPlan::select_range(&requests, options.tile_start, options.tile_end);

        info!(
            lat = region.center_lat(),
            lon = region.center_lon(),
            rows = plan.num_rows(),
            cols = plan.num_cols(),
            selected = selected.len(),
            total = requests.len(),
            workers = self.distributor.worker_count(),
            "Starting region"
        );

        let outcome = self.distributor.distribute(selected, &plan).await;
        let tiles_present = outcome.present_count();

        info!(
            present = tiles_present,
            missing = outcome.missing_count(),
            worker_failures = outcome.transport_failures(),
            "Fetch finished"
        );

        let output = if options.download_only {
            JobOutput::TileData(TileDump::from_results(&plan, outcome.results))
        } else {
            let assembler = self.assembler.clone();
            let results = outcome.results;
            let compress = region.compress();
            let assembly = tokio::task::spawn_blocking(move || {
                assembler.assemble(results, &plan, compress)
            })
            .await
            .map_err(|e| JobError::Task(e.to_string()))??;
            JobOutput::Mosaic(assembly)
        };

        Ok(JobReport {
            plan,
            tiles_requested: selected.len(),
            tiles_present,
            output,
        })
    }
}

/// Writes a job's output to `path`.
///
/// Mosaics are written as raw image bytes, or as the base64 envelope when
/// `envelope` is set. Tile data is always text.
pub fn write_output(path: &Path, output: &JobOutput, envelope: bool) -> Result<(), JobError> {
    match output {
        JobOutput::Mosaic(assembly) => write_image(path, &assembly.image, envelope),
        JobOutput::TileData(dump) => write_file(path, dump.render().as_bytes()),
    }
}

/// Writes an encoded image raw or enveloped.
pub fn write_image(path: &Path, image: &EncodedImage, envelope: bool) -> Result<(), JobError> {
    if envelope {
        write_file(path, encode_envelope(&image.bytes, image.format).as_bytes())
    } else {
        write_file(path, &image.bytes)
    }
}

/// Writes the full diagnostic of `err`, including its source chain.
///
/// Returns the path written to.
pub fn write_error_artifact(path: &Path, err: &JobError) -> Result<PathBuf, JobError> {
    let mut text = format!("ERROR: {}\n", err);
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(&format!("  caused by: {}\n", cause));
        source = cause.source();
    }
    error!(path = %path.display(), "Writing error artifact");
    write_file(path, text.as_bytes())?;
    Ok(path.to_path_buf())
}

/// Decodes an envelope file back to the raw image bytes.
pub fn decode_envelope_file(input: &Path, output: &Path) -> Result<Option<ImageFormat>, JobError> {
    let text = std::fs::read_to_string(input).map_err(|e| JobError::io(input, e))?;
    let envelope = decode_envelope(&text)?;
    write_file(output, &envelope.bytes)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        bytes = envelope.bytes.len(),
        "Envelope decoded"
    );
    Ok(envelope.format)
}

/// Reads tile-data dumps from `inputs` and merges them into a JPEG mosaic.
pub fn merge_tile_files(inputs: &[PathBuf], output: &Path) -> Result<EncodedImage, JobError> {
    let mut dumps = Vec::with_capacity(inputs.len());
    for path in inputs {
        let text = std::fs::read_to_string(path).map_err(|e| JobError::io(path, e))?;
        let dump = TileDump::parse(&text).map_err(|source| JobError::TileData {
            path: path.display().to_string(),
            source,
        })?;
        dumps.push(dump);
    }

    let image = merge_dumps(&dumps)?.finish(&Encoding::Jpeg(DEFAULT_MERGE_QUALITY))?;
    write_file(output, &image.bytes)?;
    info!(
        files = inputs.len(),
        width = image.width,
        height = image.height,
        output = %output.display(),
        "Merged tile data"
    );
    Ok(image)
}

/// Output path for region `index` of `count`: `path` itself for a single
/// region, `stem_<index>.ext` otherwise.
pub fn region_output_path(path: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mosaic".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{}", stem, index),
    };
    path.with_file_name(name)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), JobError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| JobError::io(parent, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| JobError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_output_path() {
        let base = Path::new("/tmp/out/mosaic.png");
        assert_eq!(region_output_path(base, 0, 1), PathBuf::from("/tmp/out/mosaic.png"));
        assert_eq!(region_output_path(base, 2, 3), PathBuf::from("/tmp/out/mosaic_2.png"));
        assert_eq!(
            region_output_path(Path::new("result"), 1, 2),
            PathBuf::from("result_1")
        );
    }

    #[test]
    fn test_error_artifact_includes_causes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("error.txt");
        let err = JobError::Config(ConfigFileError::MissingCredential {
            checked: "GMAPS_KEY".into(),
        });

        write_error_artifact(&path, &err).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("ERROR: configuration error"));
        assert!(text.contains("GMAPS_KEY"));
    }

    #[test]
    fn test_build_provider_dry_run_needs_no_key() {
        let provider = build_provider(&ConfigFile::default(), true).unwrap();
        assert_eq!(provider.name(), "Dry Run");
    }
}
