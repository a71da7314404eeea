use serde_json::{Map, Value};

use crate::eventlog::fields::{
    as_i64, normalize_properties, JOB_ID, PROPERTIES, STAGE_ID, STAGE_IDS, STAGE_INFOS,
};

/// The parts of a job start record the correlation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStart {
    pub job_id: i64,
    pub stage_ids: Vec<i64>,
    /// SQL execution that spawned the job, when the property bag names one.
    pub execution_id: Option<i64>,
}

impl JobStart {
    /// Extract a job start from a record. Returns `None` without a job id.
    pub fn from_record(record: &Map<String, Value>, execution_id_property: &str) -> Option<Self> {
        let job_id = JOB_ID.int(record)?;

        let props = normalize_properties(PROPERTIES.lookup(record));
        let execution_id = props.get(execution_id_property).and_then(as_i64);

        Some(Self {
            job_id,
            stage_ids: stage_ids(record),
            execution_id,
        })
    }
}

/// Stage ids from the explicit list, or projected out of the stage infos
/// when no list is present.
fn stage_ids(record: &Map<String, Value>) -> Vec<i64> {
    if let Some(ids) = STAGE_IDS.value(record) {
        return ids
            .as_array()
            .map(|ids| ids.iter().filter_map(as_i64).collect())
            .unwrap_or_default();
    }

    STAGE_INFOS
        .value(record)
        .and_then(Value::as_array)
        .map(|infos| {
            infos
                .iter()
                .filter_map(Value::as_object)
                .filter_map(|info| STAGE_ID.int(info))
                .collect()
        })
        .unwrap_or_default()
}
