//! Execution record model and DTOs.

use cmms_core::task_filter::ExecutionFacts;
use cmms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `executions` table. Task context is copied at completion
/// time so history survives later edits and deletions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Execution {
    pub id: DbId,
    pub task_id: Option<DbId>,
    pub executed_at: Timestamp,
    pub executed_by: String,
    pub line: Option<String>,
    pub machine_name: String,
    pub section: Option<String>,
    pub unit: Option<String>,
    pub task: String,
    pub is_planned: bool,
    pub duration_min: Option<i32>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

impl ExecutionFacts for Execution {
    fn executed_at(&self) -> Timestamp {
        self.executed_at
    }
    fn executed_by(&self) -> &str {
        &self.executed_by
    }
    fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }
    fn machine_name(&self) -> &str {
        &self.machine_name
    }
    fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }
    fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
    fn task(&self) -> &str {
        &self.task
    }
    fn is_planned(&self) -> bool {
        self.is_planned
    }
    fn duration_min(&self) -> Option<i32> {
        self.duration_min
    }
}

/// DTO for inserting an execution.
#[derive(Debug, Clone)]
pub struct CreateExecution {
    pub task_id: Option<DbId>,
    pub executed_at: Timestamp,
    pub executed_by: String,
    pub line: Option<String>,
    pub machine_name: String,
    pub section: Option<String>,
    pub unit: Option<String>,
    pub task: String,
    pub is_planned: bool,
    pub duration_min: Option<i32>,
    pub notes: Option<String>,
}

/// Input for completing a task.
#[derive(Debug, Clone)]
pub struct CompleteTask {
    pub executed_by: String,
    pub executed_at: Timestamp,
    /// Actual minutes spent; falls back to the task's estimate.
    pub duration_min: Option<i32>,
    pub notes: Option<String>,
}

/// An execution and the task as it stands after completion.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub execution: Execution,
    pub task: super::task::Task,
}
