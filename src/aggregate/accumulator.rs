use crate::correlate::task::TaskRecord;

use super::metric::ExecutionAggregate;

/// Running totals for the tasks attributed to one execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionAccumulator {
    num_tasks: u64,
    min_launch: Option<i64>,
    max_finish: Option<i64>,
    task_slot_ms: i64,
    run_ms: i64,
    cpu_ms: f64,
    deserialize_ms: i64,
    result_serialize_ms: i64,
    gc_ms: i64,
    shuffle_fetch_wait_ms: i64,
    shuffle_write_time_ms: f64,
    input_bytes: i64,
    output_bytes: i64,
    shuffle_read_bytes: i64,
    shuffle_write_bytes: i64,
}

impl ExecutionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one task's metrics.
    pub fn record(&mut self, task: &TaskRecord) {
        self.num_tasks += 1;

        // Only tasks with both timestamps bound the makespan.
        if let (Some(launch), Some(finish)) = (task.launch_time, task.finish_time) {
            self.min_launch = Some(self.min_launch.map_or(launch, |m| m.min(launch)));
            self.max_finish = Some(self.max_finish.map_or(finish, |m| m.max(finish)));
        }

        self.task_slot_ms = self.task_slot_ms.saturating_add(task.duration_ms);
        self.run_ms = self.run_ms.saturating_add(task.run_time_ms);
        self.cpu_ms += task.cpu_time_ms;
        self.deserialize_ms = self.deserialize_ms.saturating_add(task.deserialize_ms);
        self.result_serialize_ms = self
            .result_serialize_ms
            .saturating_add(task.result_serialize_ms);
        self.gc_ms = self.gc_ms.saturating_add(task.gc_ms);
        self.shuffle_fetch_wait_ms = self
            .shuffle_fetch_wait_ms
            .saturating_add(task.shuffle_fetch_wait_ms);
        self.shuffle_write_time_ms += task.shuffle_write_time_ms;
        self.input_bytes = self.input_bytes.saturating_add(task.input_bytes);
        self.output_bytes = self.output_bytes.saturating_add(task.output_bytes);
        self.shuffle_read_bytes = self.shuffle_read_bytes.saturating_add(task.shuffle_read_bytes);
        self.shuffle_write_bytes = self
            .shuffle_write_bytes
            .saturating_add(task.shuffle_write_bytes);
    }

    pub fn num_tasks(&self) -> u64 {
        self.num_tasks
    }

    /// Wall-clock span of the recorded tasks, if any had both timestamps.
    pub fn makespan_ms(&self) -> Option<i64> {
        match (self.min_launch, self.max_finish) {
            (Some(start), Some(end)) => Some(end.saturating_sub(start)),
            _ => None,
        }
    }

    /// CPU time as a percentage of executor run time. `None` on zero run time.
    pub fn cpu_vs_wall_pct(&self) -> Option<f64> {
        if self.run_ms > 0 {
            Some(100.0 * self.cpu_ms / self.run_ms as f64)
        } else {
            None
        }
    }

    /// Produces the output row.
    pub fn finish(&self, execution_id: i64, description: String, num_jobs: u64) -> ExecutionAggregate {
        ExecutionAggregate {
            execution_id,
            description,
            num_jobs,
            num_tasks: self.num_tasks,
            makespan_ms: self.makespan_ms(),
            task_slot_ms: self.task_slot_ms,
            executor_run_ms: self.run_ms,
            executor_cpu_ms: self.cpu_ms,
            cpu_vs_wall_pct: self.cpu_vs_wall_pct(),
            deserialize_ms: self.deserialize_ms,
            result_serialize_ms: self.result_serialize_ms,
            gc_ms: self.gc_ms,
            shuffle_fetch_wait_ms: self.shuffle_fetch_wait_ms,
            shuffle_write_time_ms: self.shuffle_write_time_ms,
            input_bytes: self.input_bytes,
            output_bytes: self.output_bytes,
            shuffle_read_bytes: self.shuffle_read_bytes,
            shuffle_write_bytes: self.shuffle_write_bytes,
        }
    }
}
