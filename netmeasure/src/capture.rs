//! Packet-loss and throughput summary of a Wireshark CSV export.

use crate::error::{MeasureError, Result};
use crate::units::average_mbit;
use serde::Deserialize;
use std::fmt;
use std::io::Read;

const RETRANSMISSION_MARKER: &str = "Retransmission";
const ACK_LOST_MARKER: &str = "TCP Previous segment not captured";

/// The columns of a packet-list export that the summary needs
#[derive(Debug, Clone, Deserialize)]
pub struct PacketRow {
    /// Seconds since the first captured packet
    #[serde(rename = "Time")]
    pub time: f64,

    /// Frame length in bytes
    #[serde(rename = "Length")]
    pub length: u64,

    #[serde(rename = "Info", default)]
    pub info: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSummary {
    pub total_packets: usize,
    pub retransmissions: usize,
    pub ack_lost_segments: usize,
    pub total_bytes: u64,
    pub duration_secs: f64,
}

impl CaptureSummary {
    pub fn from_rows(rows: &[PacketRow]) -> Result<Self> {
        let (first, last) = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(MeasureError::EmptyCapture),
        };

        let count = |marker: &str| rows.iter().filter(|r| r.info.contains(marker)).count();

        Ok(Self {
            total_packets: rows.len(),
            retransmissions: count(RETRANSMISSION_MARKER),
            ack_lost_segments: count(ACK_LOST_MARKER),
            total_bytes: rows.iter().map(|r| r.length).sum(),
            duration_secs: last.time - first.time,
        })
    }

    /// Parse a CSV export with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::Reader::from_reader(reader);
        let rows = csv
            .deserialize::<PacketRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        tracing::debug!("read {} packet rows", rows.len());
        Self::from_rows(&rows)
    }

    pub fn total_lost(&self) -> usize {
        self.retransmissions + self.ack_lost_segments
    }

    pub fn loss_percentage(&self) -> f64 {
        self.total_lost() as f64 / self.total_packets as f64 * 100.0
    }

    /// `None` when the capture spans no time
    pub fn throughput_mbps(&self) -> Option<f64> {
        (self.duration_secs > 0.0)
            .then(|| average_mbit(self.total_bytes as f64, self.duration_secs))
    }
}

impl fmt::Display for CaptureSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total packets: {}", self.total_packets)?;
        writeln!(f, "Retransmissions: {}", self.retransmissions)?;
        writeln!(f, "ACKed Lost Segments: {}", self.ack_lost_segments)?;
        writeln!(f, "Total lost packets: {}", self.total_lost())?;
        writeln!(f, "Packet loss percentage: {:.2}%", self.loss_percentage())?;
        writeln!(f, "Total data transferred: {} Bytes", self.total_bytes)?;
        writeln!(f, "Duration: {:.2} seconds", self.duration_secs)?;
        match self.throughput_mbps() {
            Some(mbps) => write!(f, "Throughput: {:.2} Mbps", mbps),
            None => write!(f, "Throughput: n/a"),
        }
    }
}
