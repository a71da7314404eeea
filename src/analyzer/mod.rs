//! Wires input sources into one correlation context and runs the
//! aggregation pass.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::aggregate::ExecutionAggregate;
use crate::config::AnalyzeConfig;
use crate::correlate::execution::ExecutionMeta;
use crate::correlate::CorrelationContext;
use crate::eventlog::IngestStats;
use crate::source::{self, ContainerKind, SourceError};

/// What was read from one input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub path: PathBuf,
    pub kind: ContainerKind,
    pub lines: u64,
}

/// Result of a complete analysis run.
#[derive(Debug)]
pub struct Analysis {
    /// One row per attributable execution, sorted by execution id.
    pub rows: Vec<ExecutionAggregate>,
    pub executions: HashMap<i64, ExecutionMeta>,
    pub stats: IngestStats,
    pub sources: Vec<SourceSummary>,
}

/// Streams any number of sources into a single correlation context.
///
/// The context is never reset between sources, so a job start in one file
/// attributes tasks recorded in another.
pub struct Analyzer {
    ctx: CorrelationContext,
    sources: Vec<SourceSummary>,
}

impl Analyzer {
    pub fn new(cfg: &AnalyzeConfig) -> Self {
        Self {
            ctx: CorrelationContext::with_execution_id_property(
                cfg.execution_id_property.clone(),
            ),
            sources: Vec::new(),
        }
    }

    /// Ingest every line of one source.
    pub fn add_source(&mut self, path: &Path) -> Result<SourceSummary, SourceError> {
        let kind = ContainerKind::from_path(path);
        let started = Instant::now();
        let undecodable_before = self.ctx.stats().undecodable_lines;

        let ctx = &mut self.ctx;
        let lines = source::with_reader(path, |reader| ctx.ingest_reader(reader))?;

        tracing::info!(
            path = %path.display(),
            kind = kind.as_str(),
            lines,
            undecodable = self.ctx.stats().undecodable_lines - undecodable_before,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ingested event log",
        );

        let summary = SourceSummary {
            path: path.to_path_buf(),
            kind,
            lines,
        };
        self.sources.push(summary.clone());
        Ok(summary)
    }

    /// Run the aggregation pass and release the ingest state.
    pub fn finish(self) -> Analysis {
        self.ctx.stats().log_summary();
        let rows = self.ctx.aggregate();
        let (executions, stats) = self.ctx.into_parts();

        tracing::info!(
            executions = executions.len(),
            rows = rows.len(),
            "aggregation finished",
        );

        Analysis {
            rows,
            executions,
            stats,
            sources: self.sources,
        }
    }
}

/// Analyze the given sources in order.
pub fn analyze_paths<P: AsRef<Path>>(
    paths: &[P],
    cfg: &AnalyzeConfig,
) -> Result<Analysis, SourceError> {
    let mut analyzer = Analyzer::new(cfg);
    for path in paths {
        analyzer.add_source(path.as_ref())?;
    }
    Ok(analyzer.finish())
}
