//! Throughput / congestion-window series of a JSON test report, printed
//! for an external chart renderer.

use netmeasure::{cli, logging, ToolConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = ToolConfig::load_or_default();
    logging::init(&config.logging);

    let args: Vec<String> = std::env::args().collect();
    let code = cli::run_report_series(
        &args,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    );
    ExitCode::from(code)
}
