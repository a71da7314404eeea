//! Field normalization across event log producer versions.
//!
//! The same concept is written under different names depending on the
//! producer (`"Stage ID"` in the JSON protocol, `"stageId"` in REST-style
//! dumps). Each concept is a [`Field`] listing its spellings in priority
//! order; the first spelling present in a record wins.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::event::EventKind;

/// A field concept and its accepted spellings, highest priority first.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    names: &'static [&'static str],
}

impl Field {
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    /// Returns the value stored under the first present spelling.
    ///
    /// A spelling present with `null` still wins; later spellings are not
    /// consulted.
    pub fn lookup<'a>(&self, obj: &'a Map<String, Value>) -> Option<&'a Value> {
        self.names.iter().find_map(|name| obj.get(*name))
    }

    /// Like [`lookup`](Self::lookup) but treats `null` as absent.
    pub fn value<'a>(&self, obj: &'a Map<String, Value>) -> Option<&'a Value> {
        self.lookup(obj).filter(|v| !v.is_null())
    }

    /// Integer value of the field, coerced with [`as_i64`].
    pub fn int(&self, obj: &Map<String, Value>) -> Option<i64> {
        self.lookup(obj).and_then(as_i64)
    }

    /// Integer value of the field, or zero when absent or not an integer.
    pub fn int_or_zero(&self, obj: &Map<String, Value>) -> i64 {
        self.int(obj).unwrap_or(0)
    }

    /// Nested object stored under the field, if it is an object.
    pub fn object<'a>(&self, obj: &'a Map<String, Value>) -> Option<&'a Map<String, Value>> {
        self.lookup(obj).and_then(Value::as_object)
    }

    /// String value of the field, if it is a string.
    pub fn str<'a>(&self, obj: &'a Map<String, Value>) -> Option<&'a str> {
        self.lookup(obj).and_then(Value::as_str)
    }
}

// --- Record envelope ---

pub const EVENT: Field = Field::new(&["Event", "event"]);

// --- SQL execution events ---

pub const EXECUTION_ID: Field = Field::new(&["executionId", "Execution ID"]);
pub const DESCRIPTION: Field = Field::new(&["description", "Description"]);
pub const DETAILS: Field = Field::new(&["details", "Details"]);
pub const EXECUTION_START_TIME: Field = Field::new(&["time", "Time", "startTime", "Start Time"]);
pub const EXECUTION_END_TIME: Field = Field::new(&["time", "Time", "endTime", "End Time"]);

// --- Job start ---

pub const JOB_ID: Field = Field::new(&["Job ID", "jobId"]);
pub const STAGE_IDS: Field = Field::new(&["Stage IDs", "stageIds"]);
pub const STAGE_INFOS: Field = Field::new(&["Stage Infos", "stageInfos"]);
pub const STAGE_ID: Field = Field::new(&["Stage ID", "stageId"]);
pub const PROPERTIES: Field = Field::new(&["Properties", "properties"]);

// --- Task end ---

pub const TASK_INFO: Field = Field::new(&["Task Info", "taskInfo", "TaskInfo"]);
pub const TASK_METRICS: Field = Field::new(&["Task Metrics", "taskMetrics", "TaskMetrics"]);
pub const TASK_END_REASON: Field = Field::new(&["Task End Reason", "taskEndReason"]);
pub const REASON: Field = Field::new(&["Reason", "reason"]);

pub const TASK_ID: Field = Field::new(&["Task ID", "taskId", "TaskId"]);
pub const LAUNCH_TIME: Field = Field::new(&["Launch Time", "launchTime"]);
pub const FINISH_TIME: Field = Field::new(&["Finish Time", "finishTime"]);

pub const EXECUTOR_RUN_TIME: Field = Field::new(&["Executor Run Time", "executorRunTime"]);
pub const EXECUTOR_CPU_TIME: Field = Field::new(&["Executor CPU Time", "executorCpuTime"]);
pub const EXECUTOR_DESERIALIZE_TIME: Field =
    Field::new(&["Executor Deserialize Time", "executorDeserializeTime"]);
pub const RESULT_SERIALIZATION_TIME: Field =
    Field::new(&["Result Serialization Time", "resultSerializationTime"]);
pub const JVM_GC_TIME: Field = Field::new(&["JVM GC Time", "JvmGcTime", "jvmGcTime"]);

pub const SHUFFLE_READ_METRICS: Field = Field::new(&["Shuffle Read Metrics", "shuffleReadMetrics"]);
pub const SHUFFLE_WRITE_METRICS: Field =
    Field::new(&["Shuffle Write Metrics", "shuffleWriteMetrics"]);
pub const INPUT_METRICS: Field = Field::new(&["Input Metrics", "inputMetrics"]);
pub const OUTPUT_METRICS: Field = Field::new(&["Output Metrics", "outputMetrics"]);

pub const FETCH_WAIT_TIME: Field = Field::new(&["Fetch Wait Time", "fetchWaitTime"]);
pub const REMOTE_BYTES_READ: Field = Field::new(&["Remote Bytes Read", "remoteBytesRead"]);
pub const LOCAL_BYTES_READ: Field = Field::new(&["Local Bytes Read", "localBytesRead"]);
/// Shuffle write time, reported in nanoseconds.
pub const SHUFFLE_WRITE_TIME: Field =
    Field::new(&["Write Time", "writeTime", "Shuffle Write Time"]);
pub const SHUFFLE_BYTES_WRITTEN: Field =
    Field::new(&["Bytes Written", "bytesWritten", "Shuffle Bytes Written"]);
pub const BYTES_WRITTEN: Field = Field::new(&["Bytes Written", "bytesWritten"]);
pub const BYTES_READ: Field = Field::new(&["Bytes Read", "bytesRead"]);

/// Property carrying the SQL execution id on job start events.
pub const DEFAULT_EXECUTION_ID_PROPERTY: &str = "spark.sql.execution.id";

/// Flattened job properties.
pub type Properties = HashMap<String, Value>;

/// Resolve the recognized event kind of a record, if any.
pub fn event_kind(record: &Map<String, Value>) -> Option<EventKind> {
    EVENT.str(record).and_then(EventKind::from_discriminator)
}

/// Coerce a JSON value to an integer.
///
/// Accepts integers, finite floats (truncated toward zero) and strings
/// holding an integer. Everything else, `null` included, yields `None`.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().and_then(|u| i64::try_from(u).ok()))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                    .map(|f| f.trunc() as i64)
            }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Flatten a job property bag into a single mapping.
///
/// Producers write either a plain object or an array of
/// `{"key": .., "value": ..}` pairs. Values wrapped as `{"value": x}` are
/// unwrapped to `x`. Anything else yields an empty mapping.
pub fn normalize_properties(props: Option<&Value>) -> Properties {
    match props {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), unwrap_value(v).clone()))
            .collect(),
        Some(Value::Array(pairs)) => pairs
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|pair| {
                let key = pair.get("key")?.as_str()?;
                let value = pair.get("value").map_or(&Value::Null, unwrap_value);
                Some((key.to_string(), value.clone()))
            })
            .collect(),
        _ => Properties::new(),
    }
}

fn unwrap_value(v: &Value) -> &Value {
    match v {
        Value::Object(inner) if inner.len() == 1 => inner.get("value").unwrap_or(v),
        _ => v,
    }
}
