//! Round-trip-time samples from hping output.
//!
//! hping prints one reply per line, e.g.
//! `len=46 ip=10.0.0.1 ttl=64 DF id=0 sport=80 flags=SA seq=0 win=64240 rtt=0.9 ms`.

use crate::record::TextLines;
use std::fmt;
use std::io::BufRead;

/// Whitespace required between the RTT value and `ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    /// `rtt=1.2 ms` only
    Required,
    /// `rtt=1.2 ms` or `rtt=1.2ms`
    Optional,
}

/// Extract the RTT value in milliseconds from a line, if any.
///
/// The first `rtt=<value> ms` occurrence whose value converts is used.
pub fn extract_rtt(line: &str, spacing: Spacing) -> Option<f64> {
    line.match_indices("rtt=").find_map(|(pos, key)| {
        let rest = &line[pos + key.len()..];
        let value_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if value_len == 0 {
            return None;
        }
        let (value, tail) = rest.split_at(value_len);
        let trimmed = tail.trim_start();
        if spacing == Spacing::Required && trimmed.len() == tail.len() {
            return None;
        }
        if !trimmed.starts_with("ms") {
            return None;
        }
        value.parse().ok()
    })
}

/// Collect all RTT samples from a reader, in input order
pub fn collect_samples<R: BufRead>(reader: R, spacing: Spacing) -> crate::Result<Vec<f64>> {
    let mut samples = Vec::new();
    for line in TextLines::new(reader) {
        let line = line?;
        match extract_rtt(&line, spacing) {
            Some(rtt) => samples.push(rtt),
            None => tracing::trace!("no rtt in line: {}", line),
        }
    }
    Ok(samples)
}

/// Nearest-rank percentile of an ascending slice, `p` in 0..=100.
///
/// The rank is `p/100 * (len - 1)` rounded half to even; there is no
/// interpolation between neighbours.
pub fn nearest_rank_percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p / 100.0 * (sorted.len() - 1) as f64).round_ties_even();
    let idx = (rank.max(0.0) as usize).min(sorted.len() - 1);
    Some(sorted[idx])
}

/// Summary statistics over a set of RTT samples
#[derive(Debug, Clone, PartialEq)]
pub struct RttStats {
    pub count: usize,
    pub mean_ms: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev_ms: f64,
    pub percentiles: Vec<(u8, f64)>,
}

impl RttStats {
    /// Returns `None` for an empty sample set
    pub fn from_samples(samples: &[f64], percentiles: &[u8]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let count = samples.len();
        let mean_ms = samples.iter().sum::<f64>() / count as f64;
        let std_dev_ms = if count > 1 {
            let squares: f64 = samples.iter().map(|x| (x - mean_ms).powi(2)).sum();
            let var = squares / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let percentiles = percentiles
            .iter()
            .filter_map(|&p| nearest_rank_percentile(&sorted, f64::from(p)).map(|v| (p, v)))
            .collect();

        Some(Self {
            count,
            mean_ms,
            std_dev_ms,
            percentiles,
        })
    }
}

impl fmt::Display for RttStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Count: {}", self.count)?;
        writeln!(f, "Mean RTT: {:.2} ms", self.mean_ms)?;
        writeln!(f, "StdDev: {:.2} ms", self.std_dev_ms)?;
        write!(f, "Percentiles:")?;
        for (p, value) in &self.percentiles {
            write!(f, "\n  {}th: {:.2} ms", p, value)?;
        }
        Ok(())
    }
}

/// An input line together with its RTT
#[derive(Debug, Clone, PartialEq)]
pub struct RttLine {
    pub rtt_ms: f64,
    pub line: String,
}

/// Keep the lines carrying an RTT, slowest first. Ties keep input order.
pub fn sort_lines_by_rtt<R: BufRead>(reader: R) -> crate::Result<Vec<RttLine>> {
    let mut lines = Vec::new();
    for line in TextLines::new(reader) {
        let line = line?;
        if let Some(rtt_ms) = extract_rtt(&line, Spacing::Optional) {
            lines.push(RttLine { rtt_ms, line });
        }
    }
    lines.sort_by(|a, b| b.rtt_ms.total_cmp(&a.rtt_ms));
    Ok(lines)
}
