//! Comparing analysis CSVs of two runtime configurations.
//!
//! Each input is one analysis run named `{config}-{run}.csv`. Benchmark
//! queries are picked out by description, the last iteration of each query
//! per run is kept, runs are averaged per configuration, and the two
//! configurations are lined up per query.

pub mod input;
pub mod report;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::config::CompareConfig;

pub use self::input::{read_run, QueryRun, RunFile};

pub const NUM_METRICS: usize = 3;

/// A per-query metric taken from the analysis CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    TotalTime,
    ExecutorTime,
    ExecutorCpuTime,
}

impl Metric {
    pub const ALL: [Metric; NUM_METRICS] = [
        Metric::TotalTime,
        Metric::ExecutorTime,
        Metric::ExecutorCpuTime,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TotalTime => "total_time",
            Self::ExecutorTime => "executor_time",
            Self::ExecutorCpuTime => "executor_cpu_time",
        }
    }

    /// Analysis CSV column the metric is read from.
    pub const fn source_column(self) -> &'static str {
        match self {
            Self::TotalTime => "makespan_ms",
            Self::ExecutorTime => "executor_run_ms",
            Self::ExecutorCpuTime => "executor_cpu_ms",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!("unknown metric {s:?}, expected total_time, executor_time or executor_cpu_time")
            })
    }
}

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("no analysis CSVs given")]
    NoInputs,

    #[error("{}: file name must look like <config>-<run>.csv", path.display())]
    InvalidFileName { path: PathBuf },

    #[error("expected exactly two configurations, found {}: {}", found.len(), found.join(", "))]
    ConfigCount { found: Vec<String> },

    #[error("{}: missing column {column:?}, not an analysis CSV", path.display())]
    MissingColumn {
        path: PathBuf,
        column: &'static str,
    },

    #[error("{}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Which side of the comparison a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Baseline,
    Target,
}

/// Mean metric values of one query under both configurations.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparedQuery {
    pub query: String,
    pub baseline: [Option<f64>; NUM_METRICS],
    pub target: [Option<f64>; NUM_METRICS],
}

impl ComparedQuery {
    pub fn value(&self, side: Side, metric: Metric) -> Option<f64> {
        match side {
            Side::Baseline => self.baseline[metric.index()],
            Side::Target => self.target[metric.index()],
        }
    }

    /// Relative speedup of the target over the baseline in percent.
    pub fn ratio(&self, metric: Metric) -> Option<f64> {
        let baseline = self.value(Side::Baseline, metric)?;
        let target = self.value(Side::Target, metric)?;
        if target == 0.0 {
            return None;
        }
        Some(100.0 * (baseline / target - 1.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Speedup {
    pub query: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedupSummary {
    pub mean: f64,
    pub median: f64,
}

/// Two configurations lined up per query, sorted by query label.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub baseline: String,
    pub target: String,
    pub queries: Vec<ComparedQuery>,
}

impl Comparison {
    /// Per-query speedups for `metric`, ascending. Queries missing either
    /// value are left out.
    pub fn speedups(&self, metric: Metric) -> Vec<Speedup> {
        let mut speedups: Vec<Speedup> = self
            .queries
            .iter()
            .filter_map(|q| {
                q.ratio(metric).map(|ratio| Speedup {
                    query: q.query.clone(),
                    ratio,
                })
            })
            .collect();
        speedups.sort_by(|a, b| a.ratio.total_cmp(&b.ratio).then_with(|| a.query.cmp(&b.query)));
        speedups
    }

    pub fn summary(&self, metric: Metric) -> Option<SpeedupSummary> {
        let ratios: Vec<f64> = self.speedups(metric).into_iter().map(|s| s.ratio).collect();
        if ratios.is_empty() {
            return None;
        }

        let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
        let mid = ratios.len() / 2;
        let median = if ratios.len() % 2 == 0 {
            (ratios[mid - 1] + ratios[mid]) / 2.0
        } else {
            ratios[mid]
        };

        Some(SpeedupSummary { mean, median })
    }
}

#[derive(Default)]
struct MeanAccumulator {
    sums: [f64; NUM_METRICS],
    counts: [u32; NUM_METRICS],
}

impl MeanAccumulator {
    fn record(&mut self, run: &QueryRun) {
        for metric in Metric::ALL {
            if let Some(v) = run.value(metric) {
                self.sums[metric.index()] += v;
                self.counts[metric.index()] += 1;
            }
        }
    }

    fn means(&self) -> [Option<f64>; NUM_METRICS] {
        let mut out = [None; NUM_METRICS];
        for (i, slot) in out.iter_mut().enumerate() {
            if self.counts[i] > 0 {
                *slot = Some(self.sums[i] / f64::from(self.counts[i]));
            }
        }
        out
    }
}

/// Read every analysis CSV and compare the two configurations they cover.
///
/// The configuration of the first file is the baseline.
pub fn compare<P: AsRef<Path>>(paths: &[P], cfg: &CompareConfig) -> Result<Comparison, CompareError> {
    let files = paths
        .iter()
        .map(|p| RunFile::from_path(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let baseline = files.first().ok_or(CompareError::NoInputs)?.config.clone();
    let configs: BTreeSet<&str> = files.iter().map(|f| f.config.as_str()).collect();
    if configs.len() != 2 {
        return Err(CompareError::ConfigCount {
            found: configs.into_iter().map(str::to_string).collect(),
        });
    }
    let target = configs
        .iter()
        .find(|c| **c != baseline)
        .map(|c| c.to_string())
        .ok_or_else(|| CompareError::ConfigCount {
            found: vec![baseline.clone()],
        })?;

    let mut means: BTreeMap<String, (MeanAccumulator, MeanAccumulator)> = BTreeMap::new();
    for file in &files {
        for run in read_run(file, cfg)? {
            let entry = means.entry(run.query.clone()).or_default();
            if file.config == baseline {
                entry.0.record(&run);
            } else {
                entry.1.record(&run);
            }
        }
    }

    let threshold_ms = cfg.longer_than * 1000.0;
    let queries: Vec<ComparedQuery> = means
        .into_iter()
        .map(|(query, (b, t))| ComparedQuery {
            query,
            baseline: b.means(),
            target: t.means(),
        })
        .filter(|q| {
            q.value(Side::Target, Metric::TotalTime)
                .is_some_and(|total| total > threshold_ms)
        })
        .collect();

    tracing::info!(
        baseline = %baseline,
        target = %target,
        files = files.len(),
        queries = queries.len(),
        "compared configurations",
    );

    Ok(Comparison {
        baseline,
        target,
        queries,
    })
}
