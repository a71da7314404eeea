//! Per-SQL-execution performance breakdowns from Spark event logs.

pub mod aggregate;
pub mod analyzer;
pub mod compare;
pub mod config;
pub mod correlate;
pub mod eventlog;
pub mod sink;
pub mod source;
