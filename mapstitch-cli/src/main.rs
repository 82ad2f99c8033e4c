//! mapstitch CLI - Command-line interface
//!
//! This binary builds satellite mosaics from region files using the
//! mapstitch library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::decode::DecodeArgs;
use commands::merge::MergeArgs;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "mapstitch")]
#[command(version = mapstitch::VERSION)]
#[command(about = "Stitch satellite map tiles into a single mosaic", long_about = None)]
struct Cli {
    /// Config file path (default: ~/.mapstitch/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug-level logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a mosaic for every region in an input file
    Run {
        /// Region file: a count line, then lat, lon, height_m, width_m, compress per region
        #[arg(long, short)]
        input: PathBuf,

        /// Output path; use '-' to print the base64 envelope to stdout
        #[arg(long, short)]
        output: PathBuf,

        /// Number of workers to spread tile fetches over (overrides config)
        #[arg(long)]
        workers: Option<usize>,

        /// Synthesise tiles locally instead of calling the provider
        #[arg(long)]
        dry_run: bool,

        /// Fetch tiles only and write a tile-data dump for a later merge
        #[arg(long)]
        download_only: bool,

        /// First tile index to process (for federated runs)
        #[arg(long, default_value = "0")]
        tile_start: usize,

        /// One past the last tile index to process
        #[arg(long)]
        tile_end: Option<usize>,

        /// Write the mosaic as a base64 text envelope instead of raw bytes
        #[arg(long)]
        envelope: bool,
    },

    /// Decode a base64 envelope file back into an image
    Decode {
        /// Envelope text file
        #[arg(long, short)]
        input: PathBuf,

        /// Image file to write
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Merge tile-data dumps from federated runs into one JPEG mosaic
    Merge {
        /// Tile-data files, in region order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Image file to write
        #[arg(long, short)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            workers,
            dry_run,
            download_only,
            tile_start,
            tile_end,
            envelope,
        } => commands::run::run(RunArgs {
            config: cli.config,
            debug: cli.debug,
            input,
            output,
            workers,
            dry_run,
            download_only,
            tile_start,
            tile_end,
            envelope,
        }),
        Commands::Decode { input, output } => commands::decode::run(DecodeArgs {
            config: cli.config,
            debug: cli.debug,
            input,
            output,
        }),
        Commands::Merge { inputs, output } => commands::merge::run(MergeArgs {
            config: cli.config,
            debug: cli.debug,
            inputs,
            output,
        }),
    };

    if let Err(e) = result {
        e.exit();
    }
}
