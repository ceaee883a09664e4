//! Packet loss and throughput of a Wireshark packet-list CSV export.

use netmeasure::{cli, logging, ToolConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = ToolConfig::load_or_default();
    logging::init(&config.logging);

    let args: Vec<String> = std::env::args().collect();
    let code = cli::run_capture_summary(
        &args,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    );
    ExitCode::from(code)
}
