//! Byte and bitrate unit normalization.
//!
//! iperf3 prints transfer sizes with 1024-based units and bitrates with
//! 1000-based units. Inputs are normalized to bytes and Mbit/s respectively.

use crate::error::{MeasureError, Result};

pub const KIB: f64 = 1024.0;
pub const MIB: f64 = 1024.0 * 1024.0;
pub const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Transfer size unit as printed in the iperf3 `Transfer` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteUnit {
    Bytes,
    KBytes,
    MBytes,
    GBytes,
}

impl ByteUnit {
    /// Recognize a unit label by case-insensitive substring match.
    ///
    /// Larger units are tested first so that `MBytes` is not read as `Bytes`.
    pub fn from_label(label: &str) -> Result<Self> {
        let upper = label.to_uppercase();
        if upper.contains("GBYTES") {
            Ok(ByteUnit::GBytes)
        } else if upper.contains("MBYTES") {
            Ok(ByteUnit::MBytes)
        } else if upper.contains("KBYTES") {
            Ok(ByteUnit::KBytes)
        } else if upper.contains("BYTES") {
            Ok(ByteUnit::Bytes)
        } else {
            Err(MeasureError::UnknownUnit(label.to_string()))
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            ByteUnit::Bytes => 1.0,
            ByteUnit::KBytes => KIB,
            ByteUnit::MBytes => MIB,
            ByteUnit::GBytes => GIB,
        }
    }

    pub fn to_bytes(self, value: f64) -> f64 {
        value * self.multiplier()
    }
}

/// Bitrate unit as printed in the iperf3 `Bitrate` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitrateUnit {
    BitsPerSec,
    MbitsPerSec,
    GbitsPerSec,
}

impl BitrateUnit {
    pub fn from_label(label: &str) -> Result<Self> {
        match label.to_lowercase().as_str() {
            "bits/sec" => Ok(BitrateUnit::BitsPerSec),
            "mbits/sec" => Ok(BitrateUnit::MbitsPerSec),
            "gbits/sec" => Ok(BitrateUnit::GbitsPerSec),
            _ => Err(MeasureError::UnknownUnit(label.to_string())),
        }
    }

    /// Factor converting a value in this unit to Mbit/s
    pub fn multiplier(self) -> f64 {
        match self {
            BitrateUnit::BitsPerSec => 1e-6,
            BitrateUnit::MbitsPerSec => 1.0,
            BitrateUnit::GbitsPerSec => 1000.0,
        }
    }

    pub fn to_mbit(self, value: f64) -> f64 {
        value * self.multiplier()
    }
}

/// Bytes expressed in (1024-based) MBytes
pub fn bytes_to_mbytes(bytes: f64) -> f64 {
    bytes / MIB
}

/// Average bitrate in Mbit/s of `bytes` spread over `seconds`
pub fn average_mbit(bytes: f64, seconds: f64) -> f64 {
    bytes * 8.0 / (seconds * 1e6)
}
