//! JSON test reports.
//!
//! The report carries one entry per reporting interval with per-stream
//! values, a summary block, and optionally a `diags` string in which the
//! receiving side's own iperf3 JSON result is embedded as text.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputReport {
    #[serde(default)]
    pub intervals: Vec<ReportInterval>,

    pub summary: SummaryBlock,

    /// Free-form diagnostics; may embed a JSON object
    #[serde(default)]
    pub diags: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInterval {
    #[serde(default)]
    pub streams: Vec<StreamSample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSample {
    /// Interval end in seconds
    pub end: f64,

    #[serde(rename = "throughput-bytes")]
    pub throughput_bytes: f64,

    #[serde(rename = "tcp-window-size")]
    pub tcp_window_size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryBlock {
    pub summary: TestSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSummary {
    #[serde(rename = "throughput-bytes")]
    pub throughput_bytes: f64,

    #[serde(default)]
    pub retransmits: u64,
}

/// The part of the embedded receiver result that is reported
#[derive(Debug, Clone, Deserialize)]
struct ReceiverDiags {
    end: ReceiverEnd,
}

#[derive(Debug, Clone, Deserialize)]
struct ReceiverEnd {
    streams: Vec<ReceiverStream>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReceiverStream {
    receiver: ReceiverTotals,
}

#[derive(Debug, Clone, Deserialize)]
struct ReceiverTotals {
    bytes: f64,
}

/// One point of the throughput / congestion-window series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Interval end, whole seconds
    pub time_secs: i64,
    pub throughput_bytes: f64,
    pub window_bytes: f64,
}

impl ThroughputReport {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// First stream of each interval; intervals without streams are skipped
    pub fn series(&self) -> Vec<SeriesPoint> {
        self.intervals
            .iter()
            .filter_map(|interval| interval.streams.first())
            .map(|stream| SeriesPoint {
                time_secs: stream.end.trunc() as i64,
                throughput_bytes: stream.throughput_bytes,
                window_bytes: stream.tcp_window_size,
            })
            .collect()
    }

    /// Bytes counted by the receiver, taken from the embedded diagnostics
    pub fn receiver_bytes(&self) -> Option<f64> {
        let diags = self.diags.as_deref()?;
        let start = diags.find('{');
        let end = diags.rfind('}');
        let embedded = match (start, end) {
            (Some(start), Some(end)) if start < end => &diags[start..=end],
            _ => {
                tracing::warn!("no JSON object found in diags");
                return None;
            }
        };

        match serde_json::from_str::<ReceiverDiags>(embedded) {
            Ok(parsed) => parsed.end.streams.first().map(|s| s.receiver.bytes),
            Err(e) => {
                tracing::warn!("error parsing diag JSON: {}", e);
                None
            }
        }
    }
}
