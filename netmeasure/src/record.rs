//! iperf3 text-log records.
//!
//! A report line looks like
//!
//! ```text
//! [  5]   0.00-1.00   sec  11.2 MBytes  94.1 Mbits/sec
//! ```
//!
//! Only per-stream lines (numeric id) are recognized; `[SUM]` and header
//! lines are skipped along with anything else that does not fit the shape.

use crate::error::{MeasureError, Result};
use crate::units::{BitrateUnit, ByteUnit};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Allowed deviation from a one-second span for unit-span records
pub const UNIT_SPAN_TOLERANCE: f64 = 0.1;

/// One parsed line of a throughput log
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRecord {
    pub start_time: f64,
    pub end_time: f64,
    pub transferred_bytes: f64,
    pub instantaneous_rate_mbit: Option<f64>,
}

impl MeasurementRecord {
    pub fn new(
        start_time: f64,
        end_time: f64,
        transferred_bytes: f64,
        instantaneous_rate_mbit: Option<f64>,
    ) -> Result<Self> {
        if !start_time.is_finite() || start_time < 0.0 {
            return Err(MeasureError::InvalidParameter(format!(
                "start time must be a non-negative number, got {}",
                start_time
            )));
        }
        if !end_time.is_finite() || end_time <= start_time {
            return Err(MeasureError::InvalidParameter(format!(
                "end time {} must be after start time {}",
                end_time, start_time
            )));
        }
        if !transferred_bytes.is_finite() || transferred_bytes < 0.0 {
            return Err(MeasureError::InvalidParameter(format!(
                "transferred bytes must be non-negative, got {}",
                transferred_bytes
            )));
        }
        if let Some(rate) = instantaneous_rate_mbit {
            if !rate.is_finite() || rate < 0.0 {
                return Err(MeasureError::InvalidParameter(format!(
                    "rate must be non-negative, got {}",
                    rate
                )));
            }
        }

        Ok(Self {
            start_time,
            end_time,
            transferred_bytes,
            instantaneous_rate_mbit,
        })
    }

    /// Length of the reported interval in seconds
    pub fn span(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Whether the record covers roughly one second
    pub fn is_unit_span(&self) -> bool {
        (self.span() - 1.0).abs() <= UNIT_SPAN_TOLERANCE
    }
}

/// Which parsed records a log source passes on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// Drop records without a recognized bitrate column
    pub require_rate: bool,
    /// Drop records that do not span about one second
    pub unit_span_only: bool,
}

impl RecordFilter {
    /// Filter used by the per-interval summary
    pub fn per_interval() -> Self {
        Self {
            require_rate: true,
            unit_span_only: false,
        }
    }

    /// Filter used by the fixed-interval summary
    pub fn fixed_interval() -> Self {
        Self {
            require_rate: false,
            unit_span_only: true,
        }
    }

    pub fn accepts(&self, record: &MeasurementRecord) -> bool {
        if self.require_rate && record.instantaneous_rate_mbit.is_none() {
            return false;
        }
        if self.unit_span_only && !record.is_unit_span() {
            return false;
        }
        true
    }
}

fn malformed(line: &str) -> MeasureError {
    MeasureError::MalformedLine(line.trim_end().to_string())
}

/// `digits.digits`, the way iperf3 prints interval bounds
fn parse_decimal(token: &str) -> Option<f64> {
    let (int, frac) = token.split_once('.')?;
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if digits(int) && digits(frac) {
        token.parse().ok()
    } else {
        None
    }
}

/// Digits and dots only; the conversion itself may still fail
fn parse_number(token: &str) -> Option<f64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    token.parse().ok()
}

fn is_byte_label(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    lower.ends_with("bytes")
        && token
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_')
}

/// Parse one iperf3 report line into a record.
///
/// The bitrate column is optional; when it is missing or carries an
/// unrecognized unit the record has no instantaneous rate.
pub fn parse_log_line(line: &str) -> Result<MeasurementRecord> {
    let rest = line.strip_prefix('[').ok_or_else(|| malformed(line))?;
    let (id, rest) = rest.split_once(']').ok_or_else(|| malformed(line))?;
    let id = id.trim_start();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(line));
    }
    if !rest.starts_with(char::is_whitespace) {
        return Err(malformed(line));
    }

    let mut tokens = rest.split_whitespace();

    let (start, end) = tokens
        .next()
        .and_then(|span| span.split_once('-'))
        .ok_or_else(|| malformed(line))?;
    let start_time = parse_decimal(start).ok_or_else(|| malformed(line))?;
    let end_time = parse_decimal(end).ok_or_else(|| malformed(line))?;

    if !tokens.next().is_some_and(|t| t.eq_ignore_ascii_case("sec")) {
        return Err(malformed(line));
    }

    let transfer = tokens
        .next()
        .and_then(parse_number)
        .ok_or_else(|| malformed(line))?;
    let unit_label = tokens
        .next()
        .filter(|t| is_byte_label(t))
        .ok_or_else(|| malformed(line))?;
    let transferred_bytes = ByteUnit::from_label(unit_label)?.to_bytes(transfer);

    let rate = match (tokens.next(), tokens.next()) {
        (Some(value), Some(unit)) => parse_number(value)
            .zip(BitrateUnit::from_label(unit).ok())
            .map(|(value, unit)| unit.to_mbit(value)),
        _ => None,
    };

    MeasurementRecord::new(start_time, end_time, transferred_bytes, rate)
}

/// Lines of a text input. Lines that are not valid UTF-8 are skipped;
/// read errors are passed on.
pub struct TextLines<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
}

impl<R: BufRead> TextLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }

    /// Number of the line returned last, starting at 1
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for TextLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e)),
            }
            self.line_no += 1;

            if self.buf.ends_with(b"\n") {
                self.buf.pop();
                if self.buf.ends_with(b"\r") {
                    self.buf.pop();
                }
            }
            match std::str::from_utf8(&self.buf) {
                Ok(line) => return Some(Ok(line.to_string())),
                Err(e) => tracing::debug!(line = self.line_no, "skipping non-UTF-8 line: {}", e),
            }
        }
    }
}

/// Iterator over the accepted records of a text log.
///
/// Lines that fail to parse are skipped; only read errors are yielded.
pub struct LogRecords<R> {
    lines: TextLines<R>,
    filter: RecordFilter,
}

impl<R: BufRead> LogRecords<R> {
    pub fn new(reader: R, filter: RecordFilter) -> Self {
        Self {
            lines: TextLines::new(reader),
            filter,
        }
    }
}

impl LogRecords<BufReader<File>> {
    pub fn open(path: &Path, filter: RecordFilter) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), filter))
    }
}

impl<R: BufRead> Iterator for LogRecords<R> {
    type Item = Result<MeasurementRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            let line_no = self.lines.line_no();

            match parse_log_line(&line) {
                Ok(record) if self.filter.accepts(&record) => return Some(Ok(record)),
                Ok(_) => tracing::trace!(line = line_no, "record filtered out"),
                Err(e) => tracing::debug!(line = line_no, "skipping line: {}", e),
            }
        }
    }
}
