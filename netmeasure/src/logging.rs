//! Subscriber setup for the command-line tools.

use crate::config::LoggingConfig;
use tracing::Level;

/// Map a configured level name to a tracing level; unknown names fall back to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Install the global fmt subscriber. Logs go to stderr so stdout only carries the report.
pub fn init(config: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(parse_level(&config.level))
        .with_writer(std::io::stderr)
        .try_init();
}
