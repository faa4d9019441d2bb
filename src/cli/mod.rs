//! Command-line interface implementation
//!
//! A bare `thumbslice` invocation runs the default pipeline from the current
//! directory. Every flag is an optional override of `thumbslice.toml`.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{apply_overrides, load_config_from_cwd, CliOverrides, LoadedConfig};
use crate::region::Strategy;
use crate::slice::{ConsoleProgress, SliceContext, SlicePipeline};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// thumbslice - Cut per-mission result thumbnails out of a sprite sheet
#[derive(Parser, Debug)]
#[command(name = "thumbslice")]
#[command(about = "Cut per-mission result thumbnails (fail/bronze/silver/gold) out of a sprite sheet")]
#[command(version)]
pub struct Cli {
    /// Config file (default: nearest thumbslice.toml above the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Region strategy: atlas metadata or an even 15x4 grid
    #[arg(short, long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Output directory for thumbnails
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Worker threads (1 = sequential)
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=256))]
    pub jobs: Option<u16>,

    /// Print every written file
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings, errors and the summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            strategy: self.strategy,
            out: self.out.clone(),
            jobs: self.jobs.map(usize::from),
        }
    }
}

/// Parse arguments and run.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    run_with(&cli)
}

/// Run with already parsed arguments.
pub fn run_with(cli: &Cli) -> ExitCode {
    let loaded: LoadedConfig = match load_config_from_cwd(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let config = match apply_overrides(loaded.config, &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let context = SliceContext::new(config, loaded.root);
    let reporter = ConsoleProgress::new().with_verbose(cli.verbose).with_quiet(cli.quiet);
    let mut pipeline = SlicePipeline::new(context, &reporter);

    // The pipeline reports its own fatal errors
    match pipeline.run() {
        Ok(_) => ExitCode::from(EXIT_SUCCESS),
        Err(_) => ExitCode::from(EXIT_ERROR),
    }
}
