use std::path::{Path, PathBuf};

use eventlog_breakdown::analyzer::analyze_paths;
use eventlog_breakdown::compare::{compare, report, Metric, Side};
use eventlog_breakdown::config::{AnalyzeConfig, CompareConfig};
use eventlog_breakdown::sink::{CsvSink, Destination, Sink};
use serde_json::{json, Value};

/// One event log holding one execution per (query, makespan) pair. Each
/// execution runs a single task whose CPU time is half its run time.
fn event_log(queries: &[(&str, i64)]) -> Vec<Value> {
    let mut events = Vec::new();
    for (i, (query, makespan)) in queries.iter().enumerate() {
        let id = i as i64;
        events.push(json!({
            "Event": "SparkListenerSQLExecutionStart",
            "executionId": id,
            "description": format!("benchmark {query}-v2.4"),
        }));
        events.push(json!({
            "Event": "SparkListenerJobStart",
            "Job ID": id,
            "Stage IDs": [id],
            "Properties": { "spark.sql.execution.id": id.to_string() },
        }));
        events.push(json!({
            "Event": "SparkListenerTaskEnd",
            "Stage ID": id,
            "Task Info": { "Task ID": 0, "Launch Time": 0, "Finish Time": makespan },
            "Task Metrics": {
                "Executor Run Time": makespan,
                "Executor CPU Time": makespan * 500_000,
            },
        }));
    }
    events
}

/// Analyze a synthesized log and write the CSV as `{config}-{run}.csv`.
fn analysis_csv(dir: &Path, config: &str, run: u32, queries: &[(&str, i64)]) -> PathBuf {
    let log = dir.join(format!("{config}-{run}.eventlog"));
    let body: String = event_log(queries).iter().map(|e| format!("{e}\n")).collect();
    std::fs::write(&log, body).expect("write log");

    let analysis = analyze_paths(&[log], &AnalyzeConfig::default()).expect("analyze");
    let out = dir.join(format!("{config}-{run}.csv"));
    let mut sink = CsvSink::new(Destination::File(out.clone()));
    sink.write_rows(&analysis.rows).expect("write csv");
    out
}

#[test]
fn test_compare_analysis_outputs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inputs = vec![
        // q1 runs twice in the first baseline run; only the last one counts.
        analysis_csv(dir.path(), "baseline", 1, &[("q1", 9_000), ("q1", 4_000), ("q2", 3_000)]),
        analysis_csv(dir.path(), "baseline", 2, &[("q1", 6_000), ("q2", 3_000)]),
        analysis_csv(dir.path(), "tuned", 1, &[("q1", 2_000), ("q2", 4_000)]),
        analysis_csv(dir.path(), "tuned", 2, &[("q1", 3_000), ("q2", 2_000), ("q3", 500)]),
    ];

    let cmp = compare(&inputs, &CompareConfig::default()).expect("compare");
    assert_eq!(cmp.baseline, "baseline");
    assert_eq!(cmp.target, "tuned");

    let labels: Vec<&str> = cmp.queries.iter().map(|q| q.query.as_str()).collect();
    assert_eq!(labels, vec!["q1", "q2", "q3"]);

    let q1 = &cmp.queries[0];
    assert_eq!(q1.value(Side::Baseline, Metric::TotalTime), Some(5_000.0));
    assert_eq!(q1.value(Side::Target, Metric::TotalTime), Some(2_500.0));
    assert_eq!(q1.value(Side::Baseline, Metric::ExecutorCpuTime), Some(2_500.0));
    assert_eq!(q1.ratio(Metric::TotalTime), Some(100.0));

    let q2 = &cmp.queries[1];
    assert_eq!(q2.ratio(Metric::TotalTime), Some(0.0));

    // q3 never ran on the baseline.
    assert_eq!(cmp.queries[2].value(Side::Baseline, Metric::TotalTime), None);

    let out = dir.path().join("report");
    std::fs::create_dir_all(&out).expect("mkdir");
    let table = report::write_table(&cmp, &out).expect("table");
    let speedups = report::write_speedups(&cmp, Metric::TotalTime, &out).expect("speedups");

    let table = std::fs::read_to_string(table).expect("read table");
    let rows: Vec<&str> = table.lines().collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1], "\"q1\",5000.0,2500.0,5000.0,2500.0,2500.0,1250.0");
    assert_eq!(rows[3], "\"q3\",\"\",500.0,\"\",500.0,\"\",250.0");

    let speedups = std::fs::read_to_string(speedups).expect("read speedups");
    assert_eq!(speedups, "\"query\",\"ratio\"\n\"q2\",0.0\n\"q1\",100.0\n");
}

#[test]
fn test_compare_longer_than_drops_short_queries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let inputs = vec![
        analysis_csv(dir.path(), "a", 1, &[("q1", 90_000), ("q2", 1_000)]),
        analysis_csv(dir.path(), "b", 1, &[("q1", 61_000), ("q2", 59_000)]),
    ];

    let cfg = CompareConfig {
        longer_than: 60.0,
        ..CompareConfig::default()
    };
    let cmp = compare(&inputs, &cfg).expect("compare");
    let labels: Vec<&str> = cmp.queries.iter().map(|q| q.query.as_str()).collect();
    assert_eq!(labels, vec!["q1"]);
}

#[test]
fn test_compare_ignores_non_benchmark_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let a = dir.path().join("a-1.csv");
    let b = dir.path().join("b-1.csv");
    let header = "\"executionId\",\"description\",\"makespan_ms\",\"executor_run_ms\",\"executor_cpu_ms\"\n";
    std::fs::write(&a, format!("{header}0,\"create database tpcds\",10,10,5.0\n")).expect("write");
    std::fs::write(&b, format!("{header}0,\"show tables\",10,10,5.0\n")).expect("write");

    let cmp = compare(&[a, b], &CompareConfig::default()).expect("compare");
    assert!(cmp.queries.is_empty());
    assert!(cmp.summary(Metric::TotalTime).is_none());
}
