//! CSV export of execution rows.
//!
//! Non-numeric fields (the header, descriptions and missing values) are
//! quoted; numbers are written bare. The whole table is rendered in memory
//! and written in one step.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::aggregate::{ExecutionAggregate, COLUMNS};

use super::Sink;

/// Where the CSV goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub struct CsvSink {
    destination: Destination,
}

impl CsvSink {
    pub fn new(destination: Destination) -> Self {
        Self { destination }
    }

    /// Stdout when `path` is `None`.
    pub fn from_output(path: Option<PathBuf>) -> Self {
        Self::new(path.map_or(Destination::Stdout, Destination::File))
    }
}

/// Render the header and all rows.
pub fn render(rows: &[ExecutionAggregate]) -> Result<Vec<u8>> {
    let mut wtr = ::csv::WriterBuilder::new()
        .quote_style(::csv::QuoteStyle::NonNumeric)
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(COLUMNS).context("writing CSV header")?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("writing row for execution {}", row.execution_id))?;
    }

    wtr.into_inner()
        .map_err(|e| anyhow!("flushing CSV buffer: {}", e.error()))
}

impl Sink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn write_rows(&mut self, rows: &[ExecutionAggregate]) -> Result<()> {
        let data = render(rows)?;

        match &self.destination {
            Destination::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(&data).context("writing CSV to stdout")?;
                out.flush().context("flushing stdout")?;
            }
            Destination::File(path) => {
                std::fs::write(path, &data)
                    .with_context(|| format!("writing CSV to {}", path.display()))?;
            }
        }

        tracing::info!(
            sink = self.name(),
            destination = %self.destination,
            rows = rows.len(),
            bytes = data.len(),
            "wrote execution rows",
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(execution_id: i64, description: &str) -> ExecutionAggregate {
        ExecutionAggregate {
            execution_id,
            description: description.to_string(),
            num_jobs: 1,
            num_tasks: 1,
            makespan_ms: Some(500),
            task_slot_ms: 500,
            executor_run_ms: 400,
            executor_cpu_ms: 300.0,
            cpu_vs_wall_pct: Some(75.0),
            deserialize_ms: 0,
            result_serialize_ms: 0,
            gc_ms: 0,
            shuffle_fetch_wait_ms: 0,
            shuffle_write_time_ms: 0.0,
            input_bytes: 0,
            output_bytes: 0,
            shuffle_read_bytes: 0,
            shuffle_write_bytes: 0,
        }
    }

    #[test]
    fn test_render_header_and_row() {
        let data = render(&[row(7, "benchmark q1-v2.4")]).expect("render");
        let text = String::from_utf8(data).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("\"executionId\",\"description\",\"num_jobs\""));
        assert!(lines[0].ends_with("\"shuffle_write_bytes\""));
        assert_eq!(
            lines[1],
            "7,\"benchmark q1-v2.4\",1,1,500,500,400,300.0,75.0,0,0,0,0,0.0,0,0,0,0"
        );
    }

    #[test]
    fn test_render_missing_values_quoted_empty() {
        let mut r = row(3, "");
        r.makespan_ms = None;
        r.cpu_vs_wall_pct = None;
        r.executor_run_ms = 0;
        r.executor_cpu_ms = 0.0;

        let text = String::from_utf8(render(&[r]).expect("render")).expect("utf8");
        let line = text.lines().nth(1).expect("row");
        assert_eq!(line, "3,\"\",1,1,\"\",500,0,0.0,\"\",0,0,0,0,0.0,0,0,0,0");
    }

    #[test]
    fn test_render_quotes_embedded_quotes() {
        let text = String::from_utf8(render(&[row(1, "say \"hi\", twice")]).expect("render"))
            .expect("utf8");
        assert!(text.contains("\"say \"\"hi\"\", twice\""));
    }

    #[test]
    fn test_file_destination() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.csv");
        let mut sink = CsvSink::from_output(Some(path.clone()));
        assert_eq!(sink.destination, Destination::File(path.clone()));

        sink.write_rows(&[row(0, "a"), row(1, "b")]).expect("write");
        let text = std::fs::read_to_string(&path).expect("read");
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_destination_display() {
        assert_eq!(CsvSink::from_output(None).destination, Destination::Stdout);
        assert_eq!(Destination::Stdout.to_string(), "stdout");
        assert_eq!(
            Destination::File(PathBuf::from("/tmp/run/out.csv")).to_string(),
            "/tmp/run/out.csv"
        );
    }

    #[test]
    fn test_unwritable_file_is_error() {
        let mut sink = CsvSink::new(Destination::File(PathBuf::from("/nonexistent/dir/out.csv")));
        let err = sink.write_rows(&[row(0, "a")]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dir/out.csv"));
    }
}
