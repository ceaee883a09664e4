//! Instantaneous and accumulated throughput of an iperf3 text log.
//!
//! Usage: `throughput-trace [iperf3_log_file]` (defaults to `main.log`)

use netmeasure::{cli, logging, ToolConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = ToolConfig::load_or_default();
    logging::init(&config.logging);

    let args: Vec<String> = std::env::args().collect();
    let code = cli::run_throughput_trace(
        &args,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    );
    ExitCode::from(code)
}
