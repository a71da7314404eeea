use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use eventlog_breakdown::analyzer;
use eventlog_breakdown::compare::{self, report, Metric};
use eventlog_breakdown::config::Config;
use eventlog_breakdown::sink::{CsvSink, Sink};

/// Exit status when no execution produced a row.
const EXIT_NO_ROWS: u8 = 2;

/// Per-SQL-execution performance breakdowns from Spark event logs.
#[derive(Parser)]
#[command(name = "eventlog-breakdown", about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Logging verbosity level (trace, debug, info, warn, error).
    /// Overrides the config file; default "info".
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize event logs into one CSV row per SQL execution.
    Analyze {
        /// Event log files (plain, .gz or .zip), read as one stream.
        #[arg(required = true)]
        eventlogs: Vec<PathBuf>,

        /// Write the CSV here instead of stdout.
        #[arg(short, long)]
        output_file: Option<PathBuf>,

        /// Job property holding the SQL execution id.
        #[arg(long)]
        execution_id_property: Option<String>,
    },

    /// Compare analysis CSVs named <config>-<run>.csv of two configurations.
    Compare {
        /// Analysis CSVs; the first file's config is the baseline.
        #[arg(required = true)]
        csv_files: Vec<PathBuf>,

        /// Directory for the comparison CSVs.
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Only keep queries whose target total time exceeds this many seconds.
        #[arg(long)]
        longer_than: Option<f64>,

        /// Metric for the speedup table (total_time, executor_time, executor_cpu_time).
        #[arg(long)]
        metric: Option<Metric>,
    },

    /// Print version information and exit.
    Version,
}

/// Build-time version info, injected via RUSTFLAGS.
mod version {
    /// Release version string (set at build time).
    pub const RELEASE: &str = env!("CARGO_PKG_VERSION");

    /// Git commit hash (set at build time via env, or "unknown").
    pub fn git_commit() -> &'static str {
        option_env!("GIT_COMMIT").unwrap_or("unknown")
    }

    /// Full version string with platform info.
    pub fn full() -> String {
        format!(
            "{} (commit: {}, {}/{})",
            RELEASE,
            git_commit(),
            std::env::consts::OS,
            std::env::consts::ARCH,
        )
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Handle version subcommand before anything else.
    if let Command::Version = &cli.command {
        println!("eventlog-breakdown {}", version::full());
        return Ok(ExitCode::SUCCESS);
    }

    let mut cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };

    // Initialize tracing. Logs go to stderr; stdout may carry the CSV.
    let log_level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    let filter = EnvFilter::try_new(log_level)
        .with_context(|| format!("invalid log level: {log_level}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        version = version::RELEASE,
        commit = version::git_commit(),
        "starting eventlog-breakdown",
    );

    match cli.command {
        Command::Analyze {
            eventlogs,
            output_file,
            execution_id_property,
        } => {
            if let Some(property) = execution_id_property {
                cfg.analyze.execution_id_property = property;
            }
            run_analyze(&cfg, &eventlogs, output_file)
        }
        Command::Compare {
            csv_files,
            output_dir,
            longer_than,
            metric,
        } => {
            if let Some(secs) = longer_than {
                cfg.compare.longer_than = secs;
            }
            if let Some(metric) = metric {
                cfg.compare.metric = metric;
            }
            cfg.compare.validate()?;
            run_compare(&cfg, &csv_files, &output_dir)
        }
        Command::Version => Ok(ExitCode::SUCCESS),
    }
}

fn run_analyze(
    cfg: &Config,
    eventlogs: &[PathBuf],
    output_file: Option<PathBuf>,
) -> Result<ExitCode> {
    let analysis = analyzer::analyze_paths(eventlogs, &cfg.analyze)?;

    if analysis.rows.is_empty() {
        eprintln!(
            "No SQL executions found (or no mappable tasks). Check that the logs \
             contain SQL execution and job start events with the {} property.",
            cfg.analyze.execution_id_property,
        );
        return Ok(ExitCode::from(EXIT_NO_ROWS));
    }

    let mut sink = CsvSink::from_output(output_file);
    sink.write_rows(&analysis.rows)
        .with_context(|| format!("exporting rows via {} sink", sink.name()))?;

    Ok(ExitCode::SUCCESS)
}

fn run_compare(cfg: &Config, csv_files: &[PathBuf], output_dir: &Path) -> Result<ExitCode> {
    let comparison = compare::compare(csv_files, &cfg.compare)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let table = report::write_table(&comparison, output_dir)?;
    let speedups = report::write_speedups(&comparison, cfg.compare.metric, output_dir)?;

    tracing::info!(
        table = %table.display(),
        speedups = %speedups.display(),
        queries = comparison.queries.len(),
        "wrote comparison",
    );

    Ok(ExitCode::SUCCESS)
}
