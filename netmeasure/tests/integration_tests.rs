//! Integration tests for the measurement tools.

use netmeasure::aggregator::{aggregate, AggregatorConfig, RateMeanPolicy};
use netmeasure::cli::{self, EXIT_FILE_NAME, EXIT_INPUT, EXIT_OK, EXIT_PARSE, EXIT_USAGE};
use netmeasure::record::{LogRecords, RecordFilter};
use netmeasure::{MeasurementRecord, ToolConfig};
use std::io::Write;
use tempfile::NamedTempFile;

const IPERF3_LOG: &str = "\
Connecting to host 192.168.1.2, port 5201
[  5] local 192.168.1.3 port 50000 connected to 192.168.1.2 port 5201
[ ID] Interval           Transfer     Bitrate         Retr  Cwnd
[  5]   0.00-1.00   sec  1.00 MBytes  8.39 Mbits/sec    0    128 KBytes
[  5]   1.00-2.00   sec  2.00 MBytes  16.8 Mbits/sec    0    128 KBytes
[  5]   2.00-3.00   sec   512 KBytes  4.19 Mbits/sec    1    64.0 KBytes
[  5]   3.00-4.00   sec  1.00 MBytes  8.39 Mbits/sec    0    64.0 KBytes
[  5]   4.00-5.00   sec  1.00 MBytes  8.39 Mbits/sec    0    64.0 KBytes
- - - - - - - - - - - - - - - - - - - - - - - - -
[ ID] Interval           Transfer     Bitrate         Retr
[  5]   0.00-5.00   sec  5.50 MBytes  9.23 Mbits/sec    1             sender
[  5]   0.00-5.04   sec  5.40 MBytes  8.99 Mbits/sec                  receiver

iperf Done.
";

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn write_temp(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn run<F>(f: F) -> (u8, String, String)
where
    F: FnOnce(&mut Vec<u8>, &mut Vec<u8>) -> u8,
{
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = f(&mut out, &mut err);
    (
        code,
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[test]
fn test_per_interval_report() {
    let log = write_temp(IPERF3_LOG, ".log");
    let path = log.path().to_str().unwrap();
    let config = ToolConfig::default();

    let (code, out, _) =
        run(|o, e| cli::run_per_interval(&args(&["tpi", path, "2"]), &config, o, e));
    assert_eq!(code, EXIT_OK);
    // Summary lines start at 0 and land in bucket 0; last end is 5.04
    assert_eq!(
        out,
        "Interval 0 - 2 sec: TP-Sum = 13.90 MBytes; 10.85 Mbit/s\n\
         Interval 2 - 4 sec: TP-Sum = 1.50 MBytes; 6.29 Mbit/s\n"
    );
}

#[test]
fn test_fixed_intervals_report() {
    let log = write_temp(IPERF3_LOG, ".log");
    let path = log.path().to_str().unwrap();
    let mut config = ToolConfig::default();
    config.intervals.fixed_count = 4;

    let (code, out, _) =
        run(|o, e| cli::run_fixed_intervals(&args(&["tfi", path, "2"]), &config, o, e));
    assert_eq!(code, EXIT_OK);
    assert_eq!(
        out,
        "Interval 0 - 2 sec: TP-Sum = 3.00 MBytes; 12.58 Mbit/s\n\
         Interval 2 - 4 sec: TP-Sum = 1.50 MBytes; 6.29 Mbit/s\n\
         Interval 4 - 6 sec: TP-Sum = 1.00 MBytes; 4.19 Mbit/s\n\
         Interval 6 - 8 sec: TP-Sum = 0.00 MBytes; 0.00 Mbit/s\n"
    );
}

#[test]
fn test_usage_and_invalid_duration() {
    let config = ToolConfig::default();
    let (code, out, _) = run(|o, e| cli::run_per_interval(&args(&["tpi"]), &config, o, e));
    assert_eq!(code, EXIT_USAGE);
    assert!(out.starts_with("Usage: tpi <iperf3_log_file>"));

    let empty = write_temp("", ".log");
    let path = empty.path().to_str().unwrap();
    let (code, out, _) =
        run(|o, e| cli::run_per_interval(&args(&["tpi", path, "soon"]), &config, o, e));
    assert_eq!(code, EXIT_OK);
    assert_eq!(out, "Invalid block duration provided. Using default 150 seconds.\n");

    let (code, out, _) =
        run(|o, e| cli::run_fixed_intervals(&args(&["tfi", path]), &config, o, e));
    assert_eq!(code, EXIT_OK);
    assert_eq!(out.lines().count(), 4);
    assert!(out.ends_with("Interval 450 - 600 sec: TP-Sum = 0.00 MBytes; 0.00 Mbit/s\n"));
}

#[test]
fn test_argument_errors_print_usage() {
    let config = ToolConfig::default();
    let (code, out, err) =
        run(|o, e| cli::run_fixed_intervals(&args(&["tfi", "--bogus"]), &config, o, e));
    assert_eq!(code, EXIT_USAGE);
    assert_eq!(
        out.trim_end(),
        "Usage: tfi <iperf3_log_file> [block_duration_seconds]"
    );
    assert!(err.is_empty());

    let (code, out, _) = run(|o, e| cli::run_sort_rtt(&args(&["sort-rtt"]), &config, o, e));
    assert_eq!(code, EXIT_USAGE);
    assert!(out.starts_with("Usage: sort-rtt <input_file> [output_file]"));
}

#[test]
fn test_extra_arguments_are_ignored() {
    let log = write_temp(IPERF3_LOG, ".log");
    let path = log.path().to_str().unwrap();
    let config = ToolConfig::default();

    let (code, out, _) =
        run(|o, e| cli::run_fixed_intervals(&args(&["tfi", path, "2", "extra"]), &config, o, e));
    assert_eq!(code, EXIT_OK);
    assert_eq!(out.lines().count(), 4);
    assert!(out.starts_with("Interval 0 - 2 sec: TP-Sum = 3.00 MBytes; 12.58 Mbit/s\n"));
}

#[test]
fn test_per_interval_duty_cycle_mean() {
    let log = write_temp(IPERF3_LOG, ".log");
    let path = log.path().to_str().unwrap();
    let mut config = ToolConfig::default();
    config.intervals.per_interval_rate_mean = RateMeanPolicy::SampleSumOverDuration;

    let (code, out, _) =
        run(|o, e| cli::run_per_interval(&args(&["tpi", path, "2"]), &config, o, e));
    assert_eq!(code, EXIT_OK);
    assert_eq!(
        out,
        "Interval 0 - 2 sec: TP-Sum = 13.90 MBytes; 21.71 Mbit/s\n\
         Interval 2 - 4 sec: TP-Sum = 1.50 MBytes; 6.29 Mbit/s\n"
    );
}

#[test]
fn test_negative_block_duration_uses_default() {
    let log = write_temp(IPERF3_LOG, ".log");
    let path = log.path().to_str().unwrap();
    let config = ToolConfig::default();

    let (code, out, _) =
        run(|o, e| cli::run_per_interval(&args(&["tpi", path, "-10"]), &config, o, e));
    assert_eq!(code, EXIT_OK);
    // The whole log fits in one 150 s bucket, which never completes
    assert_eq!(out, "Invalid block duration provided. Using default 150 seconds.\n");
}

#[test]
fn test_log_with_invalid_utf8_line() {
    let mut bytes = IPERF3_LOG.as_bytes().to_vec();
    let garbage_at = IPERF3_LOG.find("[  5]   1.00-2.00").unwrap();
    bytes.splice(garbage_at..garbage_at, b"\xff\xfe\x80 noise\n".iter().copied());

    let mut file = tempfile::Builder::new().suffix(".log").tempfile().unwrap();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    let path = file.path().to_str().unwrap();
    let config = ToolConfig::default();

    let (code, out, err) =
        run(|o, e| cli::run_per_interval(&args(&["tpi", path, "2"]), &config, o, e));
    assert_eq!(code, EXIT_OK);
    assert!(err.is_empty());
    assert_eq!(
        out,
        "Interval 0 - 2 sec: TP-Sum = 13.90 MBytes; 10.85 Mbit/s\n\
         Interval 2 - 4 sec: TP-Sum = 1.50 MBytes; 6.29 Mbit/s\n"
    );
}

#[test]
fn test_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.log");
    let config = ToolConfig::default();

    let (code, out, err) = run(|o, e| {
        cli::run_per_interval(&args(&["tpi", missing.to_str().unwrap()]), &config, o, e)
    });
    assert_eq!(code, EXIT_INPUT);
    assert!(out.is_empty());
    assert!(err.contains("nope.log"));
}

#[test]
fn test_summaries_cover_range_without_gaps() {
    let records: Vec<MeasurementRecord> = (0..97)
        .map(|i| {
            let start = (i * 7 % 97) as f64;
            MeasurementRecord::new(start, start + 1.0, 1000.0 + i as f64, Some(1.0)).unwrap()
        })
        .collect();
    let input_total: f64 = records.iter().map(|r| r.transferred_bytes).sum();

    let summaries: Vec<_> = aggregate(AggregatorConfig::per_interval(10.0), records.clone())
        .unwrap()
        .collect();
    assert_eq!(summaries.len(), 9);
    for (i, summary) in summaries.iter().enumerate() {
        assert_eq!(summary.interval_start, i as f64 * 10.0);
        assert_eq!(summary.interval_end, (i + 1) as f64 * 10.0);
    }
    let emitted: f64 = summaries.iter().map(|s| s.total_bytes).sum();
    assert!(emitted < input_total);

    let summaries: Vec<_> = aggregate(AggregatorConfig::fixed_intervals(10.0, 10), records)
        .unwrap()
        .collect();
    let emitted: f64 = summaries.iter().map(|s| s.total_bytes).sum();
    assert_eq!(emitted, input_total);
}

#[test]
fn test_log_records_from_file() {
    let log = write_temp(IPERF3_LOG, ".log");
    let records = LogRecords::open(log.path(), RecordFilter::fixed_interval())
        .unwrap()
        .collect::<netmeasure::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.is_unit_span()));
}

#[test]
fn test_rtt_stats_tool() {
    let input = "\
len=46 ip=10.0.0.1 ttl=64 seq=0 rtt=10.0 ms
len=46 ip=10.0.0.1 ttl=64 seq=1 rtt=20.0 ms
len=46 ip=10.0.0.1 ttl=64 seq=2 rtt=30.0 ms
";
    let config = ToolConfig::default();
    let rtt_args = args(&["rtt-stats"]);
    let (code, out, _) =
        run(|o, e| cli::run_rtt_stats(&rtt_args, input.as_bytes(), &config, o, e));
    assert_eq!(code, EXIT_OK);
    assert_eq!(
        out,
        "Count: 3\n\
         Mean RTT: 20.00 ms\n\
         StdDev: 10.00 ms\n\
         Percentiles:\n  \
         50th: 20.00 ms\n  \
         90th: 30.00 ms\n  \
         95th: 30.00 ms\n  \
         99th: 30.00 ms\n"
    );

    let (code, out, _) =
        run(|o, e| cli::run_rtt_stats(&rtt_args, "nothing\n".as_bytes(), &config, o, e));
    assert_eq!(code, EXIT_OK);
    assert_eq!(out, "No RTT found!\n");
}

#[test]
fn test_sort_rtt_tool() {
    let input = write_temp(
        "HPING header\nseq=0 rtt=1.5 ms\nseq=1 rtt=9.0ms\nseq=2 rtt=4.2 ms\n",
        ".txt",
    );
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("sorted.txt");
    let output_str = output.to_str().unwrap();
    let config = ToolConfig::default();

    let (code, out, _) = run(|o, e| {
        cli::run_sort_rtt(
            &args(&["sort-rtt", input.path().to_str().unwrap(), output_str]),
            &config,
            o,
            e,
        )
    });
    assert_eq!(code, EXIT_OK);
    assert_eq!(out, format!("Sorted 3 lines by RTT. Output in '{}'.\n", output_str));
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "seq=1 rtt=9.0ms\nseq=2 rtt=4.2 ms\nseq=0 rtt=1.5 ms\n"
    );

    let (code, _, _) = run(|o, e| cli::run_sort_rtt(&args(&["sort-rtt"]), &config, o, e));
    assert_eq!(code, EXIT_USAGE);
}

#[test]
fn test_capture_summary_tool() {
    let csv = write_temp(
        "\"No.\",\"Time\",\"Source\",\"Destination\",\"Protocol\",\"Length\",\"Info\"\n\
         \"1\",\"0.0\",\"a\",\"b\",\"TCP\",\"1000\",\"data\"\n\
         \"2\",\"4.0\",\"a\",\"b\",\"TCP\",\"1000\",\"[TCP Retransmission] data\"\n",
        ".csv",
    );
    let path = csv.path().to_str().unwrap();

    let (code, out, _) = run(|o, e| cli::run_capture_summary(&args(&["cs", path]), o, e));
    assert_eq!(code, EXIT_OK);
    assert_eq!(
        out,
        format!(
            "Analyzed file: {}\n\
             Total packets: 2\n\
             Retransmissions: 1\n\
             ACKed Lost Segments: 0\n\
             Total lost packets: 1\n\
             Packet loss percentage: 50.00%\n\
             Total data transferred: 2000 Bytes\n\
             Duration: 4.00 seconds\n\
             Throughput: 0.00 Mbps\n",
            path
        )
    );

    let (code, _, _) = run(|o, e| cli::run_capture_summary(&args(&["cs"]), o, e));
    assert_eq!(code, EXIT_USAGE);
}

#[test]
fn test_report_series_tool() {
    let dir = tempfile::tempdir().unwrap();
    let report = serde_json::json!({
        "intervals": [
            {"streams": [{"end": 1.0, "throughput-bytes": 3_000_000, "tcp-window-size": 90_000}]}
        ],
        "summary": {"summary": {"throughput-bytes": 3_000_000, "retransmits": 0}}
    });

    let series = |path: &std::path::Path| {
        run(|o, e| cli::run_report_series(&args(&["rs", path.to_str().unwrap()]), o, e))
    };

    let good = dir.path().join("cubic_test_20250301_1200.json");
    std::fs::write(&good, report.to_string()).unwrap();
    let (code, out, _) = series(&good);
    assert_eq!(code, EXIT_OK);
    assert!(out.starts_with("CUBIC Test\n01.03.2025 12:00\n"));
    assert!(out.contains("1\t3000\t90\n"));
    assert!(out.contains("Throughput overall: 3 MBytes\n"));
    assert!(!out.contains("Receiver throughput"));

    let badly_named = dir.path().join("report.json");
    std::fs::write(&badly_named, report.to_string()).unwrap();
    assert_eq!(series(&badly_named).0, EXIT_FILE_NAME);

    let not_json = dir.path().join("bbr_test_20250301_1200.json");
    std::fs::write(&not_json, "{ not json").unwrap();
    assert_eq!(series(&not_json).0, EXIT_PARSE);

    let not_utf8 = dir.path().join("reno_test_20250301_1200.json");
    std::fs::write(&not_utf8, b"{\"intervals\": [\xff\xfe]}").unwrap();
    let (code, out, _) = series(&not_utf8);
    assert_eq!(code, EXIT_PARSE);
    assert_eq!(out, "[Error] Parsing JSON failed\n");

    let missing = dir.path().join("missing.json");
    assert_eq!(series(&missing).0, EXIT_INPUT);

    let (code, _, _) = run(|o, e| cli::run_report_series(&args(&["rs"]), o, e));
    assert_eq!(code, EXIT_USAGE);
}

#[test]
fn test_throughput_trace_tool() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("main_20250114_153000.log");
    std::fs::write(&log, IPERF3_LOG).unwrap();

    let (code, out, _) =
        run(|o, e| cli::run_throughput_trace(&args(&["tt", log.to_str().unwrap()]), o, e));
    assert_eq!(code, EXIT_OK);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "time_s\tmbit_s\taccumulated_mbit");
    assert_eq!(lines[1], "1.00\t8.39\t0.00");
    assert_eq!(lines[2], "2.00\t16.80\t12.60");
    // Five interval lines plus the sender and receiver summaries
    assert_eq!(lines.len(), 1 + 7 + 3);
    assert_eq!(lines[7], "5.04\t8.99\t38.13");
    assert_eq!(lines[8], "Non-zero samples: 7 of 7");
    assert_eq!(lines[9], "Accumulated throughput: 38.13 Mbit");
    assert_eq!(lines[10], "Plot file: throughput_plot_20250114_153000.png");

    let missing = dir.path().join("missing.log");
    let (code, out, err) =
        run(|o, e| cli::run_throughput_trace(&args(&["tt", missing.to_str().unwrap()]), o, e));
    assert_eq!(code, EXIT_INPUT);
    assert!(out.is_empty());
    assert!(err.contains("missing.log"));
}
