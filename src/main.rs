//! Stitch - Build and release orchestrator for script modules

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = stitch_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
