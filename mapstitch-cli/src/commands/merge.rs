//! Merge command - stitch tile-data dumps into one mosaic.

use std::path::PathBuf;

use mapstitch::config::format_mib;
use mapstitch::job::merge_tile_files;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the merge command.
pub struct MergeArgs {
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
}

/// Run the merge command.
pub fn run(args: MergeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("merge");

    let image = merge_tile_files(&args.inputs, &args.output)?;

    println!(
        "Merged {} file(s) into {} ({}x{}, {})",
        args.inputs.len(),
        args.output.display(),
        image.width,
        image.height,
        format_mib(image.bytes.len() as u64)
    );
    Ok(())
}
