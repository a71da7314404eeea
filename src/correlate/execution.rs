use serde_json::{Map, Value};

use crate::eventlog::fields::{
    as_i64, DESCRIPTION, DETAILS, EXECUTION_END_TIME, EXECUTION_ID, EXECUTION_START_TIME,
};

/// What the log says about one SQL execution.
///
/// Start and end events merge into the same entry; a later value for a
/// field overwrites an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionMeta {
    /// Trimmed free-text description (benchmark harnesses put the query name here).
    pub description: String,
    /// Call-site details as written by the producer.
    pub details: String,
    /// Start time in epoch milliseconds.
    pub start_time: Option<i64>,
    /// End time in epoch milliseconds.
    pub end_time: Option<i64>,
}

/// Execution id of an execution start/end record.
pub fn execution_id(record: &Map<String, Value>) -> Option<i64> {
    EXECUTION_ID.int(record)
}

impl ExecutionMeta {
    /// Merge an execution start record.
    pub fn apply_start(&mut self, record: &Map<String, Value>) {
        self.description = DESCRIPTION
            .str(record)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        self.details = match DETAILS.value(record) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        if let Some(start) = EXECUTION_START_TIME.value(record) {
            self.start_time = as_i64(start);
        }
    }

    /// Merge an execution end record.
    pub fn apply_end(&mut self, record: &Map<String, Value>) {
        if let Some(end) = EXECUTION_END_TIME.value(record) {
            self.end_time = as_i64(end);
        }
    }
}
