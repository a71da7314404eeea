use serde::Serialize;

/// Output columns, in emission order.
pub const COLUMNS: [&str; 18] = [
    "executionId",
    "description",
    "num_jobs",
    "num_tasks",
    "makespan_ms",
    "task_slot_ms",
    "executor_run_ms",
    "executor_cpu_ms",
    "cpu_vs_wall_pct",
    "deserialize_ms",
    "result_serialize_ms",
    "gc_ms",
    "shuffle_fetch_wait_ms",
    "shuffle_write_time_ms",
    "input_bytes",
    "output_bytes",
    "shuffle_read_bytes",
    "shuffle_write_bytes",
];

/// Performance profile of one SQL execution.
///
/// Field order matches [`COLUMNS`]; the CSV sink serializes rows as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionAggregate {
    #[serde(rename = "executionId")]
    pub execution_id: i64,
    pub description: String,
    pub num_jobs: u64,
    pub num_tasks: u64,
    /// Latest finish minus earliest launch over tasks with both timestamps.
    pub makespan_ms: Option<i64>,
    pub task_slot_ms: i64,
    pub executor_run_ms: i64,
    pub executor_cpu_ms: f64,
    /// `None` when no run time was recorded.
    pub cpu_vs_wall_pct: Option<f64>,
    pub deserialize_ms: i64,
    pub result_serialize_ms: i64,
    pub gc_ms: i64,
    pub shuffle_fetch_wait_ms: i64,
    pub shuffle_write_time_ms: f64,
    pub input_bytes: i64,
    pub output_bytes: i64,
    pub shuffle_read_bytes: i64,
    pub shuffle_write_bytes: i64,
}
