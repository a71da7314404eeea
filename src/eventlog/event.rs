use std::fmt;

/// Discriminators emitted by the SQL listener. Older producers write the
/// short form, newer ones the fully qualified class name.
pub const SQL_EXECUTION_START: &str =
    "org.apache.spark.sql.execution.ui.SparkListenerSQLExecutionStart";
pub const SQL_EXECUTION_START_SHORT: &str = "SparkListenerSQLExecutionStart";
pub const SQL_EXECUTION_END: &str = "org.apache.spark.sql.execution.ui.SparkListenerSQLExecutionEnd";
pub const SQL_EXECUTION_END_SHORT: &str = "SparkListenerSQLExecutionEnd";
pub const JOB_START: &str = "SparkListenerJobStart";
pub const TASK_END: &str = "SparkListenerTaskEnd";

/// EventKind identifies the event log records the analyzer acts on.
/// Every other discriminator is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    ExecutionStart = 0,
    ExecutionEnd = 1,
    JobStart = 2,
    TaskEnd = 3,
}

/// Number of recognized event kinds, used for array sizing.
pub const NUM_EVENT_KINDS: usize = 4;

impl EventKind {
    /// Resolve an `Event` discriminator by exact, case-sensitive match.
    pub fn from_discriminator(name: &str) -> Option<Self> {
        match name {
            SQL_EXECUTION_START | SQL_EXECUTION_START_SHORT => Some(Self::ExecutionStart),
            SQL_EXECUTION_END | SQL_EXECUTION_END_SHORT => Some(Self::ExecutionEnd),
            JOB_START => Some(Self::JobStart),
            TASK_END => Some(Self::TaskEnd),
            _ => None,
        }
    }

    /// Returns the canonical log label name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExecutionStart => "execution_start",
            Self::ExecutionEnd => "execution_end",
            Self::JobStart => "job_start",
            Self::TaskEnd => "task_end",
        }
    }

    /// Return all event kinds in index order.
    pub fn all() -> &'static [Self] {
        &[
            Self::ExecutionStart,
            Self::ExecutionEnd,
            Self::JobStart,
            Self::TaskEnd,
        ]
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_sql_spellings_resolve() {
        assert_eq!(
            EventKind::from_discriminator(SQL_EXECUTION_START),
            Some(EventKind::ExecutionStart)
        );
        assert_eq!(
            EventKind::from_discriminator("SparkListenerSQLExecutionStart"),
            Some(EventKind::ExecutionStart)
        );
        assert_eq!(
            EventKind::from_discriminator(SQL_EXECUTION_END),
            Some(EventKind::ExecutionEnd)
        );
        assert_eq!(
            EventKind::from_discriminator("SparkListenerSQLExecutionEnd"),
            Some(EventKind::ExecutionEnd)
        );
    }

    #[test]
    fn test_discriminator_match_is_case_sensitive() {
        assert_eq!(EventKind::from_discriminator("sparklistenertaskend"), None);
        assert_eq!(EventKind::from_discriminator("SparkListenerStageCompleted"), None);
        assert_eq!(EventKind::from_discriminator(""), None);
    }

    #[test]
    fn test_all_kinds_indexed_in_order() {
        assert_eq!(EventKind::all().len(), NUM_EVENT_KINDS);
        for (i, kind) in EventKind::all().iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }
}
