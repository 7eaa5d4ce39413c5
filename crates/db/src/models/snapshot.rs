//! Full data snapshot for export.

use cmms_core::types::Timestamp;
use serde::Serialize;

use super::execution::Execution;
use super::machine::Machine;
use super::task::Task;

/// Every machine, task (including soft-deleted ones) and execution.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub exported_at: Timestamp,
    pub machines: Vec<Machine>,
    pub tasks: Vec<Task>,
    pub executions: Vec<Execution>,
}
