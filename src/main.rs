//! thumbslice - Command-line tool for cutting mission result thumbnails from a sprite sheet

use std::process::ExitCode;

use thumbslice::cli;

fn main() -> ExitCode {
    cli::run()
}
