use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::eventlog::fields::{
    BYTES_READ, BYTES_WRITTEN, EXECUTOR_CPU_TIME, EXECUTOR_DESERIALIZE_TIME, EXECUTOR_RUN_TIME,
    FETCH_WAIT_TIME, FINISH_TIME, INPUT_METRICS, JVM_GC_TIME, LAUNCH_TIME, LOCAL_BYTES_READ,
    OUTPUT_METRICS, REASON, REMOTE_BYTES_READ, RESULT_SERIALIZATION_TIME, SHUFFLE_BYTES_WRITTEN,
    SHUFFLE_READ_METRICS, SHUFFLE_WRITE_METRICS, SHUFFLE_WRITE_TIME, STAGE_ID, TASK_END_REASON,
    TASK_ID, TASK_INFO, TASK_METRICS,
};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Dedup identity of a task outcome.
///
/// `task_id == None` is the "unknown" sentinel; tasks without an id only
/// collide with other id-less tasks of the same stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskKey {
    pub stage_id: i64,
    pub task_id: Option<i64>,
}

/// Metrics of one completed task attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub key: TaskKey,
    /// Launch time in epoch milliseconds.
    pub launch_time: Option<i64>,
    /// Finish time in epoch milliseconds.
    pub finish_time: Option<i64>,
    /// Wall time in ms; falls back to run time when a timestamp is missing.
    pub duration_ms: i64,
    pub run_time_ms: i64,
    pub cpu_time_ms: f64,
    pub deserialize_ms: i64,
    pub result_serialize_ms: i64,
    pub gc_ms: i64,
    pub shuffle_fetch_wait_ms: i64,
    pub shuffle_write_time_ms: f64,
    pub input_bytes: i64,
    pub output_bytes: i64,
    /// Remote plus local shuffle bytes read.
    pub shuffle_read_bytes: i64,
    pub shuffle_write_bytes: i64,
    pub success: bool,
}

impl TaskRecord {
    /// Extract a task record from a task end record. Returns `None` without
    /// a stage id.
    pub fn from_task_end(record: &Map<String, Value>) -> Option<Self> {
        let stage_id = STAGE_ID.int(record)?;

        let empty = Map::new();
        let info = TASK_INFO.object(record).unwrap_or(&empty);
        let metrics = TASK_METRICS.object(record).unwrap_or(&empty);
        let shuffle_read = SHUFFLE_READ_METRICS.object(metrics).unwrap_or(&empty);
        let shuffle_write = SHUFFLE_WRITE_METRICS.object(metrics).unwrap_or(&empty);
        let input = INPUT_METRICS.object(metrics).unwrap_or(&empty);
        let output = OUTPUT_METRICS.object(metrics).unwrap_or(&empty);

        let launch_time = LAUNCH_TIME.int(info);
        let finish_time = FINISH_TIME.int(info);
        let run_time_ms = EXECUTOR_RUN_TIME.int_or_zero(metrics);
        let duration_ms = match (launch_time, finish_time) {
            (Some(launch), Some(finish)) => finish.saturating_sub(launch).max(0),
            _ => run_time_ms,
        };

        Some(Self {
            key: TaskKey {
                stage_id,
                task_id: TASK_ID.int(info),
            },
            launch_time,
            finish_time,
            duration_ms,
            run_time_ms,
            cpu_time_ms: EXECUTOR_CPU_TIME.int_or_zero(metrics) as f64 / NANOS_PER_MILLI,
            deserialize_ms: EXECUTOR_DESERIALIZE_TIME.int_or_zero(metrics),
            result_serialize_ms: RESULT_SERIALIZATION_TIME.int_or_zero(metrics),
            gc_ms: JVM_GC_TIME.int_or_zero(metrics),
            shuffle_fetch_wait_ms: FETCH_WAIT_TIME.int_or_zero(shuffle_read),
            shuffle_write_time_ms: SHUFFLE_WRITE_TIME.int_or_zero(shuffle_write) as f64
                / NANOS_PER_MILLI,
            input_bytes: BYTES_READ.int_or_zero(input),
            output_bytes: BYTES_WRITTEN.int_or_zero(output),
            shuffle_read_bytes: REMOTE_BYTES_READ
                .int_or_zero(shuffle_read)
                .saturating_add(LOCAL_BYTES_READ.int_or_zero(shuffle_read)),
            shuffle_write_bytes: SHUFFLE_BYTES_WRITTEN.int_or_zero(shuffle_write),
            success: task_succeeded(record),
        })
    }
}

/// Decide whether a task end record reports success.
///
/// A record without an end reason counts as successful.
pub fn task_succeeded(record: &Map<String, Value>) -> bool {
    let reason = match TASK_END_REASON.lookup(record) {
        None | Some(Value::Null) => return true,
        Some(reason) => reason,
    };

    match reason {
        Value::String(s) => s.eq_ignore_ascii_case("success"),
        Value::Object(obj) => match REASON.lookup(obj) {
            Some(Value::String(s)) => s.eq_ignore_ascii_case("success"),
            _ => reason.to_string().contains("Success"),
        },
        other => other.to_string().contains("Success"),
    }
}

/// What [`TaskStore::insert`] did with an incoming record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// First record for the key.
    Inserted,
    /// Replaced a stored record that was not successful.
    Replaced,
    /// Kept the stored successful record.
    Kept,
}

/// Deduplicated task outcomes keyed by (stage, task).
///
/// Ordered by key so aggregation visits tasks in the same order on every
/// run.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: BTreeMap<TaskKey, TaskRecord>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record unless a successful one is already held for its key.
    pub fn insert(&mut self, record: TaskRecord) -> InsertOutcome {
        match self.tasks.entry(record.key) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                InsertOutcome::Inserted
            }
            Entry::Occupied(mut slot) => {
                if slot.get().success {
                    InsertOutcome::Kept
                } else {
                    slot.insert(record);
                    InsertOutcome::Replaced
                }
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &TaskKey) -> Option<&TaskRecord> {
        self.tasks.get(key)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, TaskKey, TaskRecord> {
        self.tasks.values()
    }
}
