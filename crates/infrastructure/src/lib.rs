//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod file_record_store;
mod in_memory_metrics_recorder;
mod json_lines_operation_log;

pub use file_record_store::FileRecordStore;
pub use in_memory_metrics_recorder::InMemoryMetricsRecorder;
pub use json_lines_operation_log::{JsonLinesOperationLog, OPERATION_LOG_FILE_NAME};
