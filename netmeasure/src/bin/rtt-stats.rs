//! RTT statistics of hping output piped on stdin.
//!
//! Usage: `hping3 -S -p 80 host | rtt-stats`

use netmeasure::{cli, logging, ToolConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = ToolConfig::load_or_default();
    logging::init(&config.logging);

    let args: Vec<String> = std::env::args().collect();
    let stdin = std::io::stdin();
    let code = cli::run_rtt_stats(
        &args,
        stdin.lock(),
        &config,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    );
    ExitCode::from(code)
}
