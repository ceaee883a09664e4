//! # netmeasure
//!
//! Post-processing for network measurement artifacts: iperf3 text logs and
//! JSON reports, hping round-trip-time output, and Wireshark CSV exports.
//!
//! The core of the crate is the [`aggregator`], which groups timestamped
//! throughput records into fixed-duration interval summaries. The remaining
//! modules parse the individual input formats and feed small text reports.
//!
//! ## Example
//!
//! ```
//! use netmeasure::aggregator::{aggregate, AggregatorConfig};
//! use netmeasure::record::MeasurementRecord;
//!
//! let records = vec![
//!     MeasurementRecord::new(0.0, 1.0, 1_000_000.0, Some(8.0)).unwrap(),
//!     MeasurementRecord::new(150.0, 151.0, 500_000.0, Some(4.0)).unwrap(),
//! ];
//!
//! let summaries: Vec<_> = aggregate(AggregatorConfig::per_interval(150.0), records)
//!     .unwrap()
//!     .collect();
//! assert_eq!(summaries.len(), 1);
//! ```

pub mod aggregator;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod measurement;
pub mod record;
pub mod report;
pub mod rtt;
pub mod series;
pub mod trace;
pub mod units;

pub use crate::aggregator::{AggregatorConfig, IntervalAggregator, IntervalSummary};
pub use crate::config::ToolConfig;
pub use crate::error::{MeasureError, Result};
pub use crate::record::MeasurementRecord;
