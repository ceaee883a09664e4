//! Per-interval throughput summary of an iperf3 text log.
//!
//! Usage: `throughput-per-interval <iperf3_log_file> [block_duration_seconds]`

use netmeasure::{cli, logging, ToolConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = ToolConfig::load_or_default();
    logging::init(&config.logging);

    let args: Vec<String> = std::env::args().collect();
    let code = cli::run_per_interval(
        &args,
        &config,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    );
    ExitCode::from(code)
}
