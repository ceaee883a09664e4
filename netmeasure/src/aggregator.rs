//! Fixed-duration interval aggregation of throughput records.
//!
//! Each record is assigned wholly to the bucket containing its start time,
//! `floor(start_time / block_duration)`; records crossing a bucket boundary
//! are not split. Which buckets are emitted, and how the mean rate of a
//! bucket is computed, is chosen by [`AggregatorConfig`].

use crate::error::{MeasureError, Result};
use crate::record::MeasurementRecord;
use crate::units::{average_mbit, bytes_to_mbytes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

/// Upper bound on the number of buckets one run may emit
pub const MAX_INTERVALS: usize = 1_000_000;

/// Which bucket indices are emitted at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletenessPolicy {
    /// Emit `0..floor(last_end_time / block_duration)`; the partially
    /// observed final bucket is suppressed.
    DropIncomplete,
    /// Emit exactly `0..n`; records starting at or after
    /// `n * block_duration` are discarded.
    FixedCount(usize),
}

/// How `mean_rate_mbit` of a bucket is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateMeanPolicy {
    /// Arithmetic mean of the instantaneous rate samples (0 without samples)
    OverSamples,
    /// Accumulated bytes as an average bitrate over the full bucket duration
    OverDuration,
    /// Sum of the rate samples divided by the bucket duration, counting
    /// seconds without samples as zero throughput
    SampleSumOverDuration,
}

impl RateMeanPolicy {
    fn tracks_samples(self) -> bool {
        matches!(
            self,
            RateMeanPolicy::OverSamples | RateMeanPolicy::SampleSumOverDuration
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorConfig {
    /// Bucket length in seconds
    pub block_duration: f64,
    pub completeness: CompletenessPolicy,
    pub rate_mean: RateMeanPolicy,
}

impl AggregatorConfig {
    /// Configuration of the per-interval summary: only complete buckets,
    /// rate averaged over the collected samples
    pub fn per_interval(block_duration: f64) -> Self {
        Self {
            block_duration,
            completeness: CompletenessPolicy::DropIncomplete,
            rate_mean: RateMeanPolicy::OverSamples,
        }
    }

    /// Configuration of the fixed-interval summary: `count` buckets, rate
    /// derived from the transferred bytes
    pub fn fixed_intervals(block_duration: f64, count: usize) -> Self {
        Self {
            block_duration,
            completeness: CompletenessPolicy::FixedCount(count),
            rate_mean: RateMeanPolicy::OverDuration,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.block_duration.is_finite() || self.block_duration <= 0.0 {
            return Err(MeasureError::InvalidParameter(format!(
                "block duration must be a positive number of seconds, got {}",
                self.block_duration
            )));
        }
        if let CompletenessPolicy::FixedCount(count) = self.completeness {
            if count > MAX_INTERVALS {
                return Err(MeasureError::InvalidParameter(format!(
                    "at most {} intervals can be emitted, got {}",
                    MAX_INTERVALS, count
                )));
            }
        }
        Ok(())
    }

    /// Bucket holding `time`; `None` beyond `MAX_INTERVALS`
    fn bucket_index(&self, time: f64) -> Option<usize> {
        let index = (time / self.block_duration).floor();
        (index <= MAX_INTERVALS as f64).then_some(index as usize)
    }
}

/// Accumulator for one bucket
#[derive(Debug, Clone, Default)]
struct IntervalBucket {
    total_bytes: f64,
    rate_samples: Vec<f64>,
}

/// Aggregated result for one bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalSummary {
    pub interval_start: f64,
    pub interval_end: f64,
    pub total_bytes: f64,
    pub mean_rate_mbit: f64,
}

impl IntervalSummary {
    pub fn total_mbytes(&self) -> f64 {
        bytes_to_mbytes(self.total_bytes)
    }
}

impl fmt::Display for IntervalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Interval {:.0} - {:.0} sec: TP-Sum = {:.2} MBytes; {:.2} Mbit/s",
            self.interval_start,
            self.interval_end,
            self.total_mbytes(),
            self.mean_rate_mbit
        )
    }
}

/// Single-run aggregator; feed records with [`push`](Self::push), then
/// call [`finish`](Self::finish).
#[derive(Debug)]
pub struct IntervalAggregator {
    config: AggregatorConfig,
    buckets: BTreeMap<usize, IntervalBucket>,
    last_time: f64,
}

impl IntervalAggregator {
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            buckets: BTreeMap::new(),
            last_time: 0.0,
        })
    }

    /// Assign a record to its bucket. Returns false when the record lies
    /// outside the configured range and was discarded.
    ///
    /// In drop-incomplete mode a record ending past `MAX_INTERVALS` buckets
    /// is discarded as well.
    pub fn push(&mut self, record: &MeasurementRecord) -> bool {
        let Some(index) = self.config.bucket_index(record.start_time) else {
            return false;
        };
        match self.config.completeness {
            CompletenessPolicy::FixedCount(count) if index >= count => return false,
            CompletenessPolicy::FixedCount(_) => {}
            CompletenessPolicy::DropIncomplete => {
                if self.config.bucket_index(record.end_time).is_none() {
                    return false;
                }
            }
        }

        if record.end_time > self.last_time {
            self.last_time = record.end_time;
        }

        let track_samples = self.config.rate_mean.tracks_samples();
        let bucket = self.buckets.entry(index).or_default();
        bucket.total_bytes += record.transferred_bytes;
        if track_samples {
            if let Some(rate) = record.instantaneous_rate_mbit {
                bucket.rate_samples.push(rate);
            }
        }
        true
    }

    /// Number of buckets that will be emitted
    pub fn interval_count(&self) -> usize {
        match self.config.completeness {
            CompletenessPolicy::DropIncomplete => {
                self.config.bucket_index(self.last_time).unwrap_or(MAX_INTERVALS)
            }
            CompletenessPolicy::FixedCount(count) => count,
        }
    }

    /// End the run and yield the summaries in bucket order
    pub fn finish(self) -> IntervalSummaries {
        let end = self.interval_count();
        IntervalSummaries {
            config: self.config,
            buckets: self.buckets,
            next: 0,
            end,
        }
    }
}

/// Lazy, ordered sequence of interval summaries
#[derive(Debug)]
pub struct IntervalSummaries {
    config: AggregatorConfig,
    buckets: BTreeMap<usize, IntervalBucket>,
    next: usize,
    end: usize,
}

impl IntervalSummaries {
    fn summarize(&self, index: usize, bucket: Option<IntervalBucket>) -> IntervalSummary {
        let duration = self.config.block_duration;
        let bucket = bucket.unwrap_or_default();
        let mean_rate_mbit = match self.config.rate_mean {
            RateMeanPolicy::OverSamples if bucket.rate_samples.is_empty() => 0.0,
            RateMeanPolicy::OverSamples => {
                bucket.rate_samples.iter().sum::<f64>() / bucket.rate_samples.len() as f64
            }
            RateMeanPolicy::OverDuration => average_mbit(bucket.total_bytes, duration),
            RateMeanPolicy::SampleSumOverDuration => {
                bucket.rate_samples.iter().sum::<f64>() / duration
            }
        };

        IntervalSummary {
            interval_start: index as f64 * duration,
            interval_end: (index + 1) as f64 * duration,
            total_bytes: bucket.total_bytes,
            mean_rate_mbit,
        }
    }
}

impl Iterator for IntervalSummaries {
    type Item = IntervalSummary;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let bucket = self.buckets.remove(&index);
        Some(self.summarize(index, bucket))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IntervalSummaries {}

/// Aggregate a finite sequence of records in one call
pub fn aggregate<I>(config: AggregatorConfig, records: I) -> Result<IntervalSummaries>
where
    I: IntoIterator<Item = MeasurementRecord>,
{
    let mut aggregator = IntervalAggregator::new(config)?;
    for record in records {
        aggregator.push(&record);
    }
    Ok(aggregator.finish())
}

/// Consumer of interval summaries (console report, chart, ...)
pub trait SummarySink {
    fn emit(&mut self, summary: &IntervalSummary) -> Result<()>;
}

/// Writes one report line per summary
pub struct TextReport<W> {
    out: W,
}

impl<W: Write> TextReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> SummarySink for TextReport<W> {
    fn emit(&mut self, summary: &IntervalSummary) -> Result<()> {
        writeln!(self.out, "{}", summary)?;
        Ok(())
    }
}

/// Drain summaries into a sink, returning how many were written
pub fn render<S, I>(sink: &mut S, summaries: I) -> Result<usize>
where
    S: SummarySink + ?Sized,
    I: IntoIterator<Item = IntervalSummary>,
{
    let mut count = 0;
    for summary in summaries {
        sink.emit(&summary)?;
        count += 1;
    }
    Ok(count)
}
