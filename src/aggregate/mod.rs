//! Attribution and aggregation pass.
//!
//! Runs once after ingest. Every retained task is joined stage → job →
//! execution; tasks that fall off the chain are dropped. Surviving tasks are
//! folded into one [`ExecutionAggregate`] per execution.

pub mod accumulator;
pub mod metric;

use std::collections::BTreeMap;

use crate::correlate::CorrelationContext;

pub use self::accumulator::ExecutionAccumulator;
pub use self::metric::{ExecutionAggregate, COLUMNS};

/// Why a task could not be attributed to an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unattributed {
    /// No job start listed the task's stage.
    UnknownStage,
    /// The owning job carried no execution id.
    UnknownJob,
}

/// Resolve the execution owning a stage.
pub fn attribute(ctx: &CorrelationContext, stage_id: i64) -> Result<i64, Unattributed> {
    let job_id = ctx
        .job_for_stage(stage_id)
        .ok_or(Unattributed::UnknownStage)?;
    ctx.execution_for_job(job_id)
        .ok_or(Unattributed::UnknownJob)
}

/// Build one row per execution with at least one attributed task, sorted by
/// execution id.
pub fn aggregate(ctx: &CorrelationContext) -> Vec<ExecutionAggregate> {
    let mut groups: BTreeMap<i64, ExecutionAccumulator> = BTreeMap::new();
    let mut unknown_stage = 0u64;
    let mut unknown_job = 0u64;

    for task in ctx.tasks().iter() {
        match attribute(ctx, task.key.stage_id) {
            Ok(execution_id) => groups.entry(execution_id).or_default().record(task),
            Err(Unattributed::UnknownStage) => unknown_stage += 1,
            Err(Unattributed::UnknownJob) => unknown_job += 1,
        }
    }

    tracing::debug!(
        tasks = ctx.tasks().len(),
        executions = groups.len(),
        unknown_stage,
        unknown_job,
        "attributed tasks",
    );

    groups
        .into_iter()
        .filter(|(_, acc)| acc.num_tasks() > 0)
        .map(|(execution_id, acc)| {
            let description = ctx
                .execution(execution_id)
                .map(|meta| meta.description.trim().to_string())
                .unwrap_or_default();
            let num_jobs = ctx.job_count(execution_id) as u64;
            acc.finish(execution_id, description, num_jobs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(lines: &[&str]) -> CorrelationContext {
        let mut ctx = CorrelationContext::new();
        for line in lines {
            ctx.ingest_line(line.as_bytes());
        }
        ctx
    }

    const JOB_5: &str = r#"{"Event":"SparkListenerJobStart","Job ID":5,"Stage IDs":[1],"Properties":{"spark.sql.execution.id":"7"}}"#;
    const EXEC_7: &str = r#"{"Event":"org.apache.spark.sql.execution.ui.SparkListenerSQLExecutionStart","executionId":7,"description":"benchmark q1-v2.4","time":900}"#;
    const TASK_1_0: &str = r#"{"Event":"SparkListenerTaskEnd","Stage ID":1,"Task End Reason":{"Reason":"Success"},"Task Info":{"Task ID":0,"Launch Time":1000,"Finish Time":1500},"Task Metrics":{"Executor Run Time":400,"Executor CPU Time":300000000}}"#;

    #[test]
    fn test_single_execution_row() {
        let rows = aggregate(&context(&[JOB_5, EXEC_7, TASK_1_0]));
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.execution_id, 7);
        assert_eq!(row.description, "benchmark q1-v2.4");
        assert_eq!(row.num_jobs, 1);
        assert_eq!(row.num_tasks, 1);
        assert_eq!(row.makespan_ms, Some(500));
        assert_eq!(row.task_slot_ms, 500);
        assert_eq!(row.executor_run_ms, 400);
        assert_eq!(row.executor_cpu_ms, 300.0);
        assert_eq!(row.cpu_vs_wall_pct, Some(75.0));
    }

    #[test]
    fn test_order_of_events_does_not_matter() {
        let forward = aggregate(&context(&[JOB_5, EXEC_7, TASK_1_0]));
        let reverse = aggregate(&context(&[TASK_1_0, EXEC_7, JOB_5]));
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_task_for_unknown_stage_dropped() {
        let ctx = context(&[
            JOB_5,
            EXEC_7,
            r#"{"Event":"SparkListenerTaskEnd","Stage ID":99,"Task Info":{"Task ID":0}}"#,
        ]);
        assert_eq!(attribute(&ctx, 99), Err(Unattributed::UnknownStage));
        assert!(aggregate(&ctx).is_empty());
    }

    #[test]
    fn test_task_for_job_without_execution_dropped() {
        let ctx = context(&[
            r#"{"Event":"SparkListenerJobStart","Job ID":1,"Stage IDs":[4]}"#,
            r#"{"Event":"SparkListenerTaskEnd","Stage ID":4,"Task Info":{"Task ID":0}}"#,
        ]);
        assert_eq!(attribute(&ctx, 4), Err(Unattributed::UnknownJob));
        assert!(aggregate(&ctx).is_empty());
    }

    #[test]
    fn test_execution_without_meta_gets_empty_description() {
        let rows = aggregate(&context(&[JOB_5, TASK_1_0]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "");
    }

    #[test]
    fn test_rows_sorted_by_execution_id() {
        let rows = aggregate(&context(&[
            r#"{"Event":"SparkListenerJobStart","Job ID":1,"Stage IDs":[10],"Properties":{"spark.sql.execution.id":"30"}}"#,
            r#"{"Event":"SparkListenerJobStart","Job ID":2,"Stage IDs":[20],"Properties":{"spark.sql.execution.id":"4"}}"#,
            r#"{"Event":"SparkListenerJobStart","Job ID":3,"Stage IDs":[30],"Properties":{"spark.sql.execution.id":"0"}}"#,
            r#"{"Event":"SparkListenerTaskEnd","Stage ID":10}"#,
            r#"{"Event":"SparkListenerTaskEnd","Stage ID":20}"#,
            r#"{"Event":"SparkListenerTaskEnd","Stage ID":30}"#,
        ]));
        let ids: Vec<i64> = rows.iter().map(|r| r.execution_id).collect();
        assert_eq!(ids, vec![0, 4, 30]);
    }

    #[test]
    fn test_num_jobs_counts_jobs_without_tasks() {
        let rows = aggregate(&context(&[
            JOB_5,
            r#"{"Event":"SparkListenerJobStart","Job ID":6,"Stage IDs":[2],"Properties":{"spark.sql.execution.id":"7"}}"#,
            TASK_1_0,
        ]));
        assert_eq!(rows[0].num_jobs, 2);
        assert_eq!(rows[0].num_tasks, 1);
    }
}
