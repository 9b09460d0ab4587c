use std::process::ExitCode;

use claz::cli::{output::print_error, run_cli};
use tracing::error;

fn main() -> ExitCode {
    run_cli().unwrap_or_else(|e| {
        error!("Error running cli {e:?}");
        print_error(format!("{e:#}"));
        ExitCode::FAILURE
    })
}
