//! Incremental correlation of event log records.
//!
//! A [`CorrelationContext`] is created empty, fed every line of every input
//! source in order, and then handed to the aggregation pass. Records can
//! arrive in any order relative to each other: mappings are only joined once
//! the stream is exhausted.

pub mod execution;
pub mod job;
pub mod task;

use std::collections::{BTreeSet, HashMap};
use std::io::{self, BufRead};

use crate::aggregate::{self, ExecutionAggregate};
use crate::eventlog::fields::{self, DEFAULT_EXECUTION_ID_PROPERTY};
use crate::eventlog::{decode_line, EventKind, IngestStats, RawRecord};

use self::execution::ExecutionMeta;
use self::job::JobStart;
use self::task::{InsertOutcome, TaskRecord, TaskStore};

/// All state accumulated over one analysis run.
#[derive(Debug)]
pub struct CorrelationContext {
    execution_id_property: String,
    executions: HashMap<i64, ExecutionMeta>,
    /// Last job seen for each stage.
    stage_to_job: HashMap<i64, i64>,
    /// Last execution seen for each job.
    job_to_execution: HashMap<i64, i64>,
    /// Every job ever mapped to each execution.
    execution_jobs: HashMap<i64, BTreeSet<i64>>,
    tasks: TaskStore,
    stats: IngestStats,
}

impl Default for CorrelationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationContext {
    /// Creates an empty context keyed on `spark.sql.execution.id`.
    pub fn new() -> Self {
        Self::with_execution_id_property(DEFAULT_EXECUTION_ID_PROPERTY)
    }

    /// Creates an empty context that reads execution ids from the given job
    /// property.
    pub fn with_execution_id_property(property: impl Into<String>) -> Self {
        Self {
            execution_id_property: property.into(),
            executions: HashMap::new(),
            stage_to_job: HashMap::new(),
            job_to_execution: HashMap::new(),
            execution_jobs: HashMap::new(),
            tasks: TaskStore::new(),
            stats: IngestStats::new(),
        }
    }

    /// Feed every line of a reader. Returns the number of lines read.
    ///
    /// Undecodable lines are counted and skipped; only I/O errors abort.
    pub fn ingest_reader<R: BufRead + ?Sized>(&mut self, reader: &mut R) -> io::Result<u64> {
        let mut buf = Vec::with_capacity(4096);
        let mut lines = 0u64;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            lines += 1;
            self.ingest_line(&buf);
        }

        Ok(lines)
    }

    /// Decode and ingest a single line.
    pub fn ingest_line(&mut self, line: &[u8]) {
        self.stats.lines += 1;

        match decode_line(line) {
            Ok(record) => self.ingest_record(&record),
            Err(err) if err.is_blank() => self.stats.blank_lines += 1,
            Err(err) => {
                self.stats.undecodable_lines += 1;
                tracing::trace!(line = self.stats.lines, error = %err, "skipping undecodable line");
            }
        }
    }

    /// Apply one decoded record to the mappings and task store.
    pub fn ingest_record(&mut self, record: &RawRecord) {
        let Some(kind) = fields::event_kind(record) else {
            self.stats.ignored_events += 1;
            return;
        };

        let accepted = match kind {
            EventKind::ExecutionStart => self.on_execution_start(record),
            EventKind::ExecutionEnd => self.on_execution_end(record),
            EventKind::JobStart => self.on_job_start(record),
            EventKind::TaskEnd => self.on_task_end(record),
        };

        if accepted {
            self.stats.record(kind);
        } else {
            self.stats.missing_id_events += 1;
            tracing::trace!(kind = %kind, "dropping event without required id");
        }
    }

    fn on_execution_start(&mut self, record: &RawRecord) -> bool {
        let Some(id) = execution::execution_id(record) else {
            return false;
        };
        self.executions.entry(id).or_default().apply_start(record);
        true
    }

    fn on_execution_end(&mut self, record: &RawRecord) -> bool {
        let Some(id) = execution::execution_id(record) else {
            return false;
        };
        self.executions.entry(id).or_default().apply_end(record);
        true
    }

    fn on_job_start(&mut self, record: &RawRecord) -> bool {
        let Some(job) = JobStart::from_record(record, &self.execution_id_property) else {
            return false;
        };

        if let Some(execution_id) = job.execution_id {
            self.job_to_execution.insert(job.job_id, execution_id);
            self.execution_jobs
                .entry(execution_id)
                .or_default()
                .insert(job.job_id);
        }

        for stage_id in job.stage_ids {
            self.stage_to_job.insert(stage_id, job.job_id);
        }

        true
    }

    fn on_task_end(&mut self, record: &RawRecord) -> bool {
        let Some(task) = TaskRecord::from_task_end(record) else {
            return false;
        };
        match self.tasks.insert(task) {
            InsertOutcome::Inserted => {}
            InsertOutcome::Replaced => self.stats.duplicate_tasks_replaced += 1,
            InsertOutcome::Kept => self.stats.duplicate_tasks_kept += 1,
        }
        true
    }

    /// Run the attribution and aggregation pass over the current state.
    pub fn aggregate(&self) -> Vec<ExecutionAggregate> {
        aggregate::aggregate(self)
    }

    pub fn execution(&self, execution_id: i64) -> Option<&ExecutionMeta> {
        self.executions.get(&execution_id)
    }

    pub fn executions(&self) -> &HashMap<i64, ExecutionMeta> {
        &self.executions
    }

    /// Job owning a stage, if any job start listed it.
    pub fn job_for_stage(&self, stage_id: i64) -> Option<i64> {
        self.stage_to_job.get(&stage_id).copied()
    }

    /// Execution owning a job, if the job's properties named one.
    pub fn execution_for_job(&self, job_id: i64) -> Option<i64> {
        self.job_to_execution.get(&job_id).copied()
    }

    /// Number of distinct jobs ever mapped to an execution.
    pub fn job_count(&self, execution_id: i64) -> usize {
        self.execution_jobs
            .get(&execution_id)
            .map_or(0, BTreeSet::len)
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Consume the context, keeping only the execution metadata and counters.
    pub fn into_parts(self) -> (HashMap<i64, ExecutionMeta>, IngestStats) {
        (self.executions, self.stats)
    }
}
