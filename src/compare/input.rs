use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::CompareConfig;

use super::{CompareError, Metric, NUM_METRICS};

/// An analysis CSV named `{config}-{run}.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFile {
    pub config: String,
    pub run: i64,
    pub path: PathBuf,
}

impl RunFile {
    /// Split the file stem at its last `-` into config name and run number.
    pub fn from_path(path: &Path) -> Result<Self, CompareError> {
        let invalid = || CompareError::InvalidFileName {
            path: path.to_path_buf(),
        };

        let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(invalid)?;
        let (config, run) = stem.rsplit_once('-').ok_or_else(invalid)?;
        let run = run.trim().parse::<i64>().map_err(|_| invalid())?;

        Ok(Self {
            config: config.to_string(),
            run,
            path: path.to_path_buf(),
        })
    }
}

/// The last iteration of one benchmark query within a run.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRun {
    pub query: String,
    pub execution_id: i64,
    /// Metric values indexed by [`Metric::index`].
    pub values: [Option<f64>; NUM_METRICS],
}

impl QueryRun {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values[metric.index()]
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzedRow {
    #[serde(rename = "executionId")]
    execution_id: i64,
    description: String,
    makespan_ms: Option<f64>,
    executor_run_ms: Option<f64>,
    executor_cpu_ms: Option<f64>,
}

/// Turn a description into a query label, if it names a benchmark query.
pub fn query_label<'a>(description: &'a str, cfg: &CompareConfig) -> Option<&'a str> {
    if !description.contains(&cfg.description_prefix) {
        return None;
    }
    let label = description
        .strip_prefix(cfg.strip_prefix.as_str())
        .unwrap_or(description);
    Some(label.strip_suffix(cfg.strip_suffix.as_str()).unwrap_or(label))
}

/// Read the benchmark queries of one run, keeping the last iteration
/// (highest execution id) of each query.
pub fn read_run(file: &RunFile, cfg: &CompareConfig) -> Result<Vec<QueryRun>, CompareError> {
    let csv_err = |source| CompareError::Csv {
        path: file.path.clone(),
        source,
    };

    let mut reader = csv::Reader::from_path(&file.path).map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?;
    let required = ["executionId", "description"]
        .into_iter()
        .chain(Metric::ALL.into_iter().map(Metric::source_column));
    for column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(CompareError::MissingColumn {
                path: file.path.clone(),
                column,
            });
        }
    }

    let mut latest: HashMap<String, QueryRun> = HashMap::new();

    for row in reader.deserialize::<AnalyzedRow>() {
        let row = row.map_err(csv_err)?;
        let Some(query) = query_label(&row.description, cfg) else {
            continue;
        };

        let candidate = QueryRun {
            query: query.to_string(),
            execution_id: row.execution_id,
            values: [row.makespan_ms, row.executor_run_ms, row.executor_cpu_ms],
        };

        let newer = latest
            .get(query)
            .map_or(true, |existing| existing.execution_id < candidate.execution_id);
        if newer {
            latest.insert(candidate.query.clone(), candidate);
        }
    }

    let mut runs: Vec<QueryRun> = latest.into_values().collect();
    runs.sort_by(|a, b| a.query.cmp(&b.query));

    tracing::debug!(
        path = %file.path.display(),
        config = %file.config,
        run = file.run,
        queries = runs.len(),
        "read analysis CSV",
    );

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_file_from_path() {
        let rf = RunFile::from_path(Path::new("/tmp/out/corretto-1.csv")).expect("parse");
        assert_eq!(rf.config, "corretto");
        assert_eq!(rf.run, 1);

        let rf = RunFile::from_path(Path::new("jdk-21-12.csv")).expect("parse");
        assert_eq!(rf.config, "jdk-21");
        assert_eq!(rf.run, 12);
    }

    #[test]
    fn test_run_file_rejects_bad_names() {
        assert!(RunFile::from_path(Path::new("corretto.csv")).is_err());
        assert!(RunFile::from_path(Path::new("corretto-x.csv")).is_err());
    }

    #[test]
    fn test_query_label() {
        let cfg = CompareConfig::default();
        assert_eq!(query_label("benchmark q14a-v2.4", &cfg), Some("q14a"));
        assert_eq!(query_label("benchmark q3", &cfg), Some("q3"));
        assert_eq!(query_label("warmup benchmark q3-v2.4", &cfg), Some("warmup benchmark q3"));
        assert_eq!(query_label("show tables", &cfg), None);
        assert_eq!(query_label("", &cfg), None);
    }

    #[test]
    fn test_read_run_keeps_last_iteration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("zing-1.csv");
        std::fs::write(
            &path,
            "\"executionId\",\"description\",\"num_jobs\",\"makespan_ms\",\"executor_run_ms\",\"executor_cpu_ms\"\n\
             1,\"benchmark q1-v2.4\",1,100,80,40.0\n\
             2,\"create table\",1,5,5,1.0\n\
             3,\"benchmark q1-v2.4\",1,90,70,35.0\n\
             4,\"benchmark q2-v2.4\",1,\"\",0,0.0\n",
        )
        .expect("write");

        let rf = RunFile::from_path(&path).expect("run file");
        let runs = read_run(&rf, &CompareConfig::default()).expect("read");
        assert_eq!(runs.len(), 2);

        assert_eq!(runs[0].query, "q1");
        assert_eq!(runs[0].execution_id, 3);
        assert_eq!(runs[0].value(Metric::TotalTime), Some(90.0));
        assert_eq!(runs[0].value(Metric::ExecutorCpuTime), Some(35.0));

        assert_eq!(runs[1].query, "q2");
        assert_eq!(runs[1].value(Metric::TotalTime), None);
        assert_eq!(runs[1].value(Metric::ExecutorTime), Some(0.0));
    }

    #[test]
    fn test_read_run_rejects_foreign_csv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("zing-2.csv");
        std::fs::write(
            &path,
            "\"executionId\",\"description\",\"makespan_ms\",\"executor_run_ms\"\n1,\"benchmark q1\",5,5\n",
        )
        .expect("write");

        let rf = RunFile::from_path(&path).expect("run file");
        let err = read_run(&rf, &CompareConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CompareError::MissingColumn { column: "executor_cpu_ms", .. }
        ));
    }

    #[test]
    fn test_read_run_missing_column() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("zing-1.csv");
        std::fs::write(&path, "\"executionId\",\"description\"\n1,\"benchmark q1\"\n")
            .expect("write");

        let rf = RunFile::from_path(&path).expect("run file");
        let err = read_run(&rf, &CompareConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CompareError::MissingColumn { column: "makespan_ms", .. }
        ));
        assert!(err.to_string().contains("makespan_ms"));
    }
}
