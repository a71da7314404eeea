pub mod csv;

use anyhow::Result;

use crate::aggregate::ExecutionAggregate;

pub use self::csv::{CsvSink, Destination};

/// Sink consumes finished execution rows and exports them.
pub trait Sink {
    /// Returns the sink's name for logging.
    fn name(&self) -> &str;

    /// Export all rows. Called once per analysis run.
    fn write_rows(&mut self, rows: &[ExecutionAggregate]) -> Result<()>;
}
