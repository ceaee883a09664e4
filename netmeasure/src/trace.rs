//! Instantaneous and accumulated throughput over time.
//!
//! Each report line contributes one point at its end time. The accumulated
//! series integrates the rate with the trapezoid rule over consecutive
//! points, in Mbit.

use crate::error::Result;
use crate::record::MeasurementRecord;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracePoint {
    pub time_secs: f64,
    pub rate_mbit: f64,
    /// Mbit transferred from the first point up to this one
    pub accumulated_mbit: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThroughputTrace {
    pub points: Vec<TracePoint>,
}

impl ThroughputTrace {
    /// Points in input order; records without a rate are ignored
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = MeasurementRecord>,
    {
        let mut points: Vec<TracePoint> = Vec::new();
        for record in records {
            let Some(rate_mbit) = record.instantaneous_rate_mbit else {
                continue;
            };
            let accumulated_mbit = match points.last() {
                Some(prev) => {
                    let dt = record.end_time - prev.time_secs;
                    prev.accumulated_mbit + 0.5 * (rate_mbit + prev.rate_mbit) * dt
                }
                None => 0.0,
            };
            points.push(TracePoint {
                time_secs: record.end_time,
                rate_mbit,
                accumulated_mbit,
            });
        }
        Self { points }
    }

    /// Points with a positive rate, as drawn in the instantaneous chart
    pub fn nonzero(&self) -> impl Iterator<Item = &TracePoint> + '_ {
        self.points.iter().filter(|p| p.rate_mbit > 0.0)
    }

    pub fn total_mbit(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.accumulated_mbit)
    }
}

/// First `YYYYMMDD_HHMMSS` stamp in a log file name
pub fn find_timestamp(name: &str) -> Option<&str> {
    const LEN: usize = 15;
    let bytes = name.as_bytes();
    (0..bytes.len().saturating_sub(LEN - 1)).find_map(|start| {
        let candidate = &bytes[start..start + LEN];
        let shape_ok = candidate.iter().enumerate().all(|(i, b)| {
            if i == 8 {
                *b == b'_'
            } else {
                b.is_ascii_digit()
            }
        });
        shape_ok.then(|| &name[start..start + LEN])
    })
}

/// Consumer of throughput traces
pub trait TraceSink {
    fn render(&mut self, trace: &ThroughputTrace, stamp: &str) -> Result<()>;
}

/// Tab-separated console rendering
pub struct TextTrace<W> {
    out: W,
}

impl<W: Write> TextTrace<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceSink for TextTrace<W> {
    fn render(&mut self, trace: &ThroughputTrace, stamp: &str) -> Result<()> {
        writeln!(self.out, "time_s\tmbit_s\taccumulated_mbit")?;
        for point in &trace.points {
            writeln!(
                self.out,
                "{:.2}\t{:.2}\t{:.2}",
                point.time_secs, point.rate_mbit, point.accumulated_mbit
            )?;
        }
        writeln!(
            self.out,
            "Non-zero samples: {} of {}",
            trace.nonzero().count(),
            trace.points.len()
        )?;
        writeln!(self.out, "Accumulated throughput: {:.2} Mbit", trace.total_mbit())?;
        writeln!(self.out, "Plot file: throughput_plot_{}.png", stamp)?;
        Ok(())
    }
}
