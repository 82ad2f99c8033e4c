//! Decode command - base64 envelope to image file.

use std::path::PathBuf;

use mapstitch::job::decode_envelope_file;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the decode command.
pub struct DecodeArgs {
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Run the decode command.
pub fn run(args: DecodeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(args.config.as_deref(), args.debug)?;
    runner.log_startup("decode");

    let format = decode_envelope_file(&args.input, &args.output)?;

    match format {
        Some(format) => println!("Decoded {} image to {}", format, args.output.display()),
        None => println!("Decoded image to {}", args.output.display()),
    }
    Ok(())
}
