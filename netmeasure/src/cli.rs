//! Entry points shared by the command-line tools.
//!
//! Each `run_*` function takes the full argument vector (program name
//! first), writes its report to `out` and diagnostics to `err`, and returns
//! the process exit code.

use crate::aggregator::{render, AggregatorConfig, IntervalAggregator, TextReport};
use crate::capture::CaptureSummary;
use crate::config::ToolConfig;
use crate::error::{MeasureError, Result};
use crate::measurement::MeasurementName;
use crate::record::{LogRecords, RecordFilter};
use crate::report::ThroughputReport;
use crate::rtt::{collect_samples, sort_lines_by_rtt, RttStats, Spacing};
use crate::series::{ReportSeries, SeriesSink, TextSeries};
use crate::trace::{find_timestamp, TextTrace, ThroughputTrace, TraceSink};
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const EXIT_OK: u8 = 0;
/// Missing or malformed command-line arguments
pub const EXIT_USAGE: u8 = 1;
/// Input file missing or unreadable, or the report could not be written
pub const EXIT_INPUT: u8 = 2;
/// Input file is not valid JSON
pub const EXIT_PARSE: u8 = 3;
/// Report file name does not follow the naming scheme
pub const EXIT_FILE_NAME: u8 = 4;

/// Arguments of the interval summaries
#[derive(Parser, Debug)]
#[command(about = "Summarize an iperf3 text log in fixed-duration intervals")]
pub struct IntervalArgs {
    /// iperf3 client or server log
    #[arg(value_name = "iperf3_log_file")]
    pub log_file: PathBuf,

    /// Interval length in seconds; invalid values fall back to the default
    #[arg(value_name = "block_duration_seconds", allow_hyphen_values = true)]
    pub block_duration: Option<String>,

    /// Further arguments are accepted and ignored
    #[arg(hide = true, allow_hyphen_values = true)]
    pub ignored: Vec<String>,
}

#[derive(Parser, Debug)]
#[command(about = "RTT statistics of hping output read from stdin")]
pub struct RttStatsArgs {}

#[derive(Parser, Debug)]
#[command(about = "Sort hping output lines by RTT, slowest first")]
pub struct SortRttArgs {
    #[arg(value_name = "input_file")]
    pub input: PathBuf,

    /// Defaults to `rtt.sorted_output` from the config file
    #[arg(value_name = "output_file")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Packet loss and throughput of a Wireshark CSV export")]
pub struct CaptureArgs {
    #[arg(value_name = "path_to_csv_file")]
    pub csv_file: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Throughput and congestion-window series of a JSON test report")]
pub struct ReportArgs {
    /// Named `<algo>_<test>_<YYYYMMDD>_<HHMM>.json`
    #[arg(value_name = "report_file")]
    pub report: PathBuf,
}

#[derive(Parser, Debug)]
#[command(about = "Instantaneous and accumulated throughput of an iperf3 text log")]
pub struct TraceArgs {
    #[arg(value_name = "iperf3_log_file", default_value = "main.log")]
    pub log_file: PathBuf,
}

fn program<'a>(args: &'a [String], fallback: &'a str) -> &'a str {
    args.first()
        .and_then(|p| Path::new(p).file_name())
        .and_then(|n| n.to_str())
        .unwrap_or(fallback)
}

/// Parse `args` into `T`, or the exit code to stop with. Argument errors
/// print the usage line to `out`.
fn parse_args<T, W>(
    args: &[String],
    fallback: &str,
    out: &mut W,
) -> Result<std::result::Result<T, u8>>
where
    T: Parser,
    W: Write,
{
    let mut command = T::command().bin_name(program(args, fallback).to_string());
    let parsed = command
        .try_get_matches_from_mut(args.iter())
        .and_then(|matches| T::from_arg_matches(&matches));

    match parsed {
        Ok(parsed) => Ok(Ok(parsed)),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            write!(out, "{}", e)?;
            Ok(Err(EXIT_OK))
        }
        Err(e) => {
            tracing::debug!("argument error: {}", e);
            writeln!(out, "{}", command.render_usage())?;
            Ok(Err(EXIT_USAGE))
        }
    }
}

/// Block duration from an optional argument. Values that do not parse, or
/// are not a positive finite number, produce a warning and the default.
pub fn parse_block_duration<W: Write>(
    arg: Option<&str>,
    default: f64,
    out: &mut W,
) -> Result<f64> {
    let Some(arg) = arg else {
        return Ok(default);
    };
    match arg.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => {
            writeln!(
                out,
                "Invalid block duration provided. Using default {} seconds.",
                default
            )?;
            Ok(default)
        }
    }
}

fn exit_code(e: &MeasureError) -> u8 {
    match e {
        MeasureError::Io(_) => EXIT_INPUT,
        _ => EXIT_USAGE,
    }
}

fn report_failure<E: Write>(subject: &str, e: &MeasureError, err: &mut E) -> u8 {
    // Nothing is left to report a failing stderr to
    let _ = writeln!(err, "Error: cannot process '{}': {}", subject, e);
    exit_code(e)
}

fn summarize_log<W: Write>(
    path: &Path,
    filter: RecordFilter,
    config: AggregatorConfig,
    out: &mut W,
) -> Result<usize> {
    let mut aggregator = IntervalAggregator::new(config)?;
    let mut discarded = 0usize;
    for record in LogRecords::open(path, filter)? {
        if !aggregator.push(&record?) {
            discarded += 1;
        }
    }
    tracing::debug!(discarded, "finished reading {}", path.display());

    let mut report = TextReport::new(out);
    render(&mut report, aggregator.finish())
}

fn interval_tool<W: Write>(
    args: &[String],
    fallback_name: &str,
    build: impl FnOnce(f64) -> (RecordFilter, AggregatorConfig),
    config: &ToolConfig,
    out: &mut W,
) -> Result<u8> {
    let args = match parse_args::<IntervalArgs, _>(args, fallback_name, out)? {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };

    let block_duration = parse_block_duration(
        args.block_duration.as_deref(),
        config.intervals.block_duration_secs,
        out,
    )?;
    let (filter, aggregator_config) = build(block_duration);
    tracing::info!(
        block_duration,
        completeness = ?aggregator_config.completeness,
        "summarizing {}",
        args.log_file.display()
    );

    summarize_log(&args.log_file, filter, aggregator_config, out)?;
    Ok(EXIT_OK)
}

fn finish<E: Write>(result: Result<u8>, subject: &str, err: &mut E) -> u8 {
    match result {
        Ok(code) => code,
        Err(e) => report_failure(subject, &e, err),
    }
}

fn subject(args: &[String], index: usize) -> &str {
    args.get(index).map_or("<input>", String::as_str)
}

/// Complete intervals only, rate averaged over the reported samples
pub fn run_per_interval<W: Write, E: Write>(
    args: &[String],
    config: &ToolConfig,
    out: &mut W,
    err: &mut E,
) -> u8 {
    let rate_mean = config.intervals.per_interval_rate_mean;
    let result = interval_tool(
        args,
        "throughput-per-interval",
        |block| {
            (
                RecordFilter::per_interval(),
                AggregatorConfig {
                    rate_mean,
                    ..AggregatorConfig::per_interval(block)
                },
            )
        },
        config,
        out,
    );
    finish(result, subject(args, 1), err)
}

/// A fixed number of intervals, rate derived from transferred bytes
pub fn run_fixed_intervals<W: Write, E: Write>(
    args: &[String],
    config: &ToolConfig,
    out: &mut W,
    err: &mut E,
) -> u8 {
    let count = config.intervals.fixed_count;
    let result = interval_tool(
        args,
        "throughput-fixed-intervals",
        |block| {
            (
                RecordFilter::fixed_interval(),
                AggregatorConfig::fixed_intervals(block, count),
            )
        },
        config,
        out,
    );
    finish(result, subject(args, 1), err)
}

fn rtt_stats<R: BufRead, W: Write>(
    args: &[String],
    input: R,
    config: &ToolConfig,
    out: &mut W,
) -> Result<u8> {
    if let Err(code) = parse_args::<RttStatsArgs, _>(args, "rtt-stats", out)? {
        return Ok(code);
    }

    let samples = collect_samples(input, Spacing::Required)?;
    match RttStats::from_samples(&samples, &config.rtt.percentiles) {
        Some(stats) => writeln!(out, "{}", stats)?,
        None => writeln!(out, "No RTT found!")?,
    }
    Ok(EXIT_OK)
}

/// RTT statistics over hping output read from `input`
pub fn run_rtt_stats<R: BufRead, W: Write, E: Write>(
    args: &[String],
    input: R,
    config: &ToolConfig,
    out: &mut W,
    err: &mut E,
) -> u8 {
    let result = rtt_stats(args, input, config, out);
    finish(result, "<stdin>", err)
}

fn sort_rtt<W: Write>(args: &[String], config: &ToolConfig, out: &mut W) -> Result<u8> {
    let args = match parse_args::<SortRttArgs, _>(args, "sort-rtt", out)? {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.rtt.sorted_output));

    let lines = sort_lines_by_rtt(BufReader::new(File::open(&args.input)?))?;
    let mut writer = BufWriter::new(File::create(&output)?);
    for line in &lines {
        writeln!(writer, "{}", line.line)?;
    }
    writer.flush()?;

    writeln!(
        out,
        "Sorted {} lines by RTT. Output in '{}'.",
        lines.len(),
        output.display()
    )?;
    Ok(EXIT_OK)
}

/// Re-order hping output by RTT, slowest first
pub fn run_sort_rtt<W: Write, E: Write>(
    args: &[String],
    config: &ToolConfig,
    out: &mut W,
    err: &mut E,
) -> u8 {
    let result = sort_rtt(args, config, out);
    finish(result, subject(args, 1), err)
}

fn capture_summary<W: Write>(args: &[String], out: &mut W) -> Result<u8> {
    let args = match parse_args::<CaptureArgs, _>(args, "capture-summary", out)? {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };
    let path = args.csv_file.display();

    let summary = File::open(&args.csv_file)
        .map_err(MeasureError::from)
        .and_then(|file| CaptureSummary::from_reader(BufReader::new(file)));
    match summary {
        Ok(summary) => {
            writeln!(out, "Analyzed file: {}", path)?;
            writeln!(out, "{}", summary)?;
            Ok(EXIT_OK)
        }
        Err(e) => {
            writeln!(out, "Error processing file {}: {}", path, e)?;
            Ok(exit_code(&e))
        }
    }
}

/// Packet loss and throughput of a Wireshark CSV export
pub fn run_capture_summary<W: Write, E: Write>(args: &[String], out: &mut W, err: &mut E) -> u8 {
    let result = capture_summary(args, out);
    finish(result, subject(args, 1), err)
}

fn report_series<W: Write, E: Write>(args: &[String], out: &mut W, err: &mut E) -> Result<u8> {
    let args = match parse_args::<ReportArgs, _>(args, "report-series", out)? {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };
    let path = args.report.as_path();
    if !path.exists() {
        writeln!(out, "[Error] File {} does not exist!", path.display())?;
        return Ok(EXIT_INPUT);
    }

    let report = match ThroughputReport::load(path) {
        Ok(report) => report,
        Err(MeasureError::Io(e)) if e.kind() != io::ErrorKind::InvalidData => {
            writeln!(err, "[Error] Reading {}: {}", path.display(), e)?;
            return Ok(EXIT_INPUT);
        }
        Err(e) => {
            tracing::debug!("report parse failure: {}", e);
            writeln!(out, "[Error] Parsing JSON failed")?;
            return Ok(EXIT_PARSE);
        }
    };

    let Ok(name) = MeasurementName::from_path(path) else {
        writeln!(out, "[Error] File name does not match the expected format!")?;
        return Ok(EXIT_FILE_NAME);
    };

    let series = ReportSeries::new(name, &report);
    TextSeries::new(out).render(&series)?;
    Ok(EXIT_OK)
}

/// Throughput and congestion-window series of a JSON report
pub fn run_report_series<W: Write, E: Write>(args: &[String], out: &mut W, err: &mut E) -> u8 {
    let result = report_series(args, out, err);
    finish(result, subject(args, 1), err)
}

fn throughput_trace<W: Write>(args: &[String], out: &mut W) -> Result<u8> {
    let args = match parse_args::<TraceArgs, _>(args, "throughput-trace", out)? {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };

    let records = LogRecords::open(&args.log_file, RecordFilter::per_interval())?
        .collect::<Result<Vec<_>>>()?;
    let trace = ThroughputTrace::from_records(records);

    let name = args.log_file.to_string_lossy();
    let stamp = match find_timestamp(&name) {
        Some(stamp) => stamp.to_string(),
        None => chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
    };

    TextTrace::new(out).render(&trace, &stamp)?;
    Ok(EXIT_OK)
}

/// Per-line rate series and its trapezoid-rule accumulation
pub fn run_throughput_trace<W: Write, E: Write>(args: &[String], out: &mut W, err: &mut E) -> u8 {
    let result = throughput_trace(args, out);
    finish(result, subject(args, 1), err)
}
