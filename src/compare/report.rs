//! Writing comparison results as CSV.

use std::path::{Path, PathBuf};

use super::{CompareError, Comparison, Metric, Side};

fn format_value(value: Option<f64>) -> String {
    value.map(|v| format!("{v:?}")).unwrap_or_default()
}

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, CompareError> {
    csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .from_path(path)
        .map_err(|source| CompareError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

/// Write the side-by-side table as `{target}-vs-{baseline}.csv` in `dir`.
pub fn write_table(cmp: &Comparison, dir: &Path) -> Result<PathBuf, CompareError> {
    let path = dir.join(format!("{}-vs-{}.csv", cmp.target, cmp.baseline));
    let csv_err = |source| CompareError::Csv {
        path: path.clone(),
        source,
    };

    let mut header = vec!["query".to_string()];
    for metric in Metric::ALL {
        header.push(format!("{}_{}", metric.as_str(), cmp.baseline));
        header.push(format!("{}_{}", metric.as_str(), cmp.target));
    }

    let mut wtr = writer(&path)?;
    wtr.write_record(&header).map_err(csv_err)?;
    for q in &cmp.queries {
        let mut record = vec![q.query.clone()];
        for metric in Metric::ALL {
            record.push(format_value(q.value(Side::Baseline, metric)));
            record.push(format_value(q.value(Side::Target, metric)));
        }
        wtr.write_record(&record).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| CompareError::Io {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}

/// Write per-query speedups for `metric` as
/// `{target}-vs-{baseline}-{metric}.csv` in `dir`, ascending by ratio.
pub fn write_speedups(
    cmp: &Comparison,
    metric: Metric,
    dir: &Path,
) -> Result<PathBuf, CompareError> {
    let path = dir.join(format!(
        "{}-vs-{}-{}.csv",
        cmp.target,
        cmp.baseline,
        metric.as_str()
    ));
    let csv_err = |source| CompareError::Csv {
        path: path.clone(),
        source,
    };

    let mut wtr = writer(&path)?;
    wtr.write_record(["query", "ratio"]).map_err(csv_err)?;
    for speedup in cmp.speedups(metric) {
        wtr.write_record([speedup.query, format!("{:?}", speedup.ratio)])
            .map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| CompareError::Io {
        path: path.clone(),
        source,
    })?;

    match cmp.summary(metric) {
        Some(summary) => tracing::info!(
            metric = metric.as_str(),
            mean_pct = summary.mean,
            median_pct = summary.median,
            "{} vs {} speedup",
            cmp.target,
            cmp.baseline,
        ),
        None => tracing::warn!(
            metric = metric.as_str(),
            "no query has {} for both configurations",
            metric.as_str(),
        ),
    }

    Ok(path)
}
