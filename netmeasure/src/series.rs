//! Output of report series to a renderer.

use crate::error::Result;
use crate::measurement::MeasurementName;
use crate::report::{SeriesPoint, ThroughputReport};
use std::io::Write;

/// Series values are shown in (1000-based) KBytes
pub const SERIES_UNIT_FACTOR: f64 = 1e3;
/// Totals are shown in (1000-based) MBytes
pub const TOTAL_UNIT_FACTOR: f64 = 1e6;

/// Everything a renderer needs for one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSeries {
    pub name: MeasurementName,
    pub points: Vec<SeriesPoint>,
    pub throughput_total_bytes: f64,
    pub retransmits: u64,
    pub receiver_bytes: Option<f64>,
}

impl ReportSeries {
    pub fn new(name: MeasurementName, report: &ThroughputReport) -> Self {
        Self {
            name,
            points: report.series(),
            throughput_total_bytes: report.summary.summary.throughput_bytes,
            retransmits: report.summary.summary.retransmits,
            receiver_bytes: report.receiver_bytes(),
        }
    }
}

/// Consumer of report series (chart library, console)
pub trait SeriesSink {
    fn render(&mut self, series: &ReportSeries) -> Result<()>;
}

/// Tab-separated console rendering
pub struct TextSeries<W> {
    out: W,
}

impl<W: Write> TextSeries<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SeriesSink for TextSeries<W> {
    fn render(&mut self, series: &ReportSeries) -> Result<()> {
        writeln!(self.out, "{}", series.name.title())?;
        writeln!(self.out, "{}", series.name.subtitle())?;
        writeln!(self.out, "time_s\tthroughput_kbytes\tcwnd_kbytes")?;
        for point in &series.points {
            writeln!(
                self.out,
                "{}\t{}\t{}",
                point.time_secs,
                (point.throughput_bytes / SERIES_UNIT_FACTOR).round_ties_even(),
                (point.window_bytes / SERIES_UNIT_FACTOR).round_ties_even()
            )?;
        }
        writeln!(
            self.out,
            "Throughput overall: {} MBytes",
            (series.throughput_total_bytes / TOTAL_UNIT_FACTOR).round_ties_even()
        )?;
        writeln!(self.out, "Retransmissions overall: {}", series.retransmits)?;
        if let Some(bytes) = series.receiver_bytes {
            writeln!(
                self.out,
                "Receiver throughput: {} MBytes",
                (bytes / TOTAL_UNIT_FACTOR).round_ties_even()
            )?;
        }
        writeln!(self.out, "Plot file: {}", series.name.plot_file_name())?;
        Ok(())
    }
}
