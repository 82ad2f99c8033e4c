//! Run command - build a mosaic for each region in an input file.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use mapstitch::config::format_mib;
use mapstitch::input::read_regions;
use mapstitch::job::{
    build_provider, region_output_path, write_error_artifact, write_output, JobError,
    JobOptions, JobOutput, JobReport, RegionJob,
};
use mapstitch::output::encode_envelope;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Output path that selects stdout.
const STDOUT_PATH: &str = "-";

/// Error artifact name used when output goes to stdout.
const ERROR_ARTIFACT: &str = "error.txt";

/// Arguments for the run command.
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub input: PathBuf,
    pub output: PathBuf,
    pub workers: Option<usize>,
    pub dry_run: bool,
    pub download_only: bool,
    pub tile_start: usize,
    pub tile_end: Option<usize>,
    pub envelope: bool,
}

impl RunArgs {
    fn to_stdout(&self) -> bool {
        self.output.as_os_str() == STDOUT_PATH
    }

    fn options(&self) -> Result<JobOptions, CliError> {
        if let Some(end) = self.tile_end {
            if end < self.tile_start {
                return Err(CliError::Usage(format!(
                    "--tile-end ({}) must not be less than --tile-start ({})",
                    end, self.tile_start
                )));
            }
        }
        Ok(JobOptions {
            download_only: self.download_only,
            tile_start: self.tile_start,
            tile_end: self.tile_end,
        })
    }

    fn error_artifact_path(&self) -> PathBuf {
        if self.to_stdout() {
            PathBuf::from(ERROR_ARTIFACT)
        } else {
            self.output.clone()
        }
    }
}

/// Run the run command.
///
/// A failing job leaves its diagnostic at the output path (or `error.txt`
/// when writing to stdout) before the process exits non-zero.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("run");

    if let Some(workers) = args.workers {
        let config = runner.config_mut();
        config.distribute = config.distribute.with_workers(workers);
    }

    match run_regions(&runner, &args) {
        Err(CliError::Job(e)) => {
            let path = args.error_artifact_path();
            if let Err(write_err) = write_error_artifact(&path, &e) {
                warn!(error = %write_err, "Could not write error artifact");
            }
            Err(CliError::Job(e))
        }
        other => other,
    }
}

fn run_regions(runner: &CliRunner, args: &RunArgs) -> Result<(), CliError> {
    let options = args.options()?;
    let config = runner.config();

    let regions = read_regions(&args.input).map_err(JobError::from)?;
    info!(input = %args.input.display(), regions = regions.len(), "Loaded regions");

    // Built before the runtime: the provider owns a blocking HTTP client.
    let provider = build_provider(config, args.dry_run)?;
    let job = RegionJob::from_config(config, provider);
    let runtime = runner.runtime()?;

    for (index, region) in regions.iter().enumerate() {
        let report = runtime.block_on(job.run(region, &options))?;

        if args.to_stdout() {
            print_output(&report.output)?;
        } else {
            let path = region_output_path(&args.output, index, regions.len());
            write_output(&path, &report.output, args.envelope)?;
            print_summary(&path, &report);
        }
    }

    Ok(())
}

fn print_output(output: &JobOutput) -> Result<(), JobError> {
    let text = match output {
        JobOutput::Mosaic(assembly) => {
            encode_envelope(&assembly.image.bytes, assembly.image.format)
        }
        JobOutput::TileData(dump) => dump.render(),
    };
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(|source| JobError::Io {
            path: STDOUT_PATH.to_string(),
            source,
        })
}

fn print_summary(path: &Path, report: &JobReport) {
    println!(
        "Region {}x{} tiles: {}/{} fetched",
        report.plan.num_rows(),
        report.plan.num_cols(),
        report.tiles_present,
        report.tiles_requested
    );
    match &report.output {
        JobOutput::Mosaic(assembly) => println!(
            "  Mosaic: {} ({}x{} {}, {}, {:?})",
            path.display(),
            assembly.image.width,
            assembly.image.height,
            assembly.image.format,
            format_mib(assembly.image.bytes.len() as u64),
            assembly.strategy
        ),
        JobOutput::TileData(dump) => println!(
            "  Tile data: {} ({} tiles)",
            path.display(),
            dump.tiles.len()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(output: &str) -> RunArgs {
        RunArgs {
            config: None,
            debug: false,
            input: PathBuf::from("regions.txt"),
            output: PathBuf::from(output),
            workers: None,
            dry_run: true,
            download_only: false,
            tile_start: 0,
            tile_end: None,
            envelope: false,
        }
    }

    #[test]
    fn test_stdout_output_writes_error_txt() {
        let args = args("-");
        assert!(args.to_stdout());
        assert_eq!(args.error_artifact_path(), PathBuf::from("error.txt"));
    }

    #[test]
    fn test_file_output_doubles_as_error_artifact() {
        let args = args("out/mosaic.png");
        assert!(!args.to_stdout());
        assert_eq!(args.error_artifact_path(), PathBuf::from("out/mosaic.png"));
    }

    #[test]
    fn test_inverted_tile_range_rejected() {
        let mut args = args("mosaic.png");
        args.tile_start = 10;
        args.tile_end = Some(4);
        assert!(matches!(args.options(), Err(CliError::Usage(_))));

        args.tile_end = Some(10);
        let options = args.options().unwrap();
        assert_eq!(options.tile_start, 10);
        assert_eq!(options.tile_end, Some(10));
    }
}
