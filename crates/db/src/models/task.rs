//! Task / preventive rule entity model and DTOs.

use cmms_core::library::LibraryFacts;
use cmms_core::task::TaskKind;
use cmms_core::task_filter::TaskFacts;
use cmms_core::types::{Date, DbId, Timestamp};
use cmms_core::workload::RuleFacts;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub machine_id: DbId,
    pub section: Option<String>,
    pub unit: Option<String>,
    pub task: String,
    pub task_type: Option<String>,
    pub quantity: Option<i32>,
    pub duration_min: Option<i32>,
    pub frequency_hours: Option<i32>,
    pub due_date: Option<Date>,
    pub status: String,
    pub is_preventive: bool,
    pub is_planned: bool,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        TaskKind::from_flags(self.is_preventive, self.is_planned, self.frequency_hours)
    }
}

/// A live task joined with the machine it belongs to.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskWithMachine {
    pub id: DbId,
    pub machine_id: DbId,
    pub machine_name: String,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub line: Option<String>,
    pub section: Option<String>,
    pub unit: Option<String>,
    pub task: String,
    pub task_type: Option<String>,
    pub quantity: Option<i32>,
    pub duration_min: Option<i32>,
    pub frequency_hours: Option<i32>,
    pub due_date: Option<Date>,
    pub status: String,
    pub is_preventive: bool,
    pub is_planned: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TaskFacts for TaskWithMachine {
    fn machine_name(&self) -> &str {
        &self.machine_name
    }
    fn line(&self) -> Option<&str> {
        self.line.as_deref()
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
    fn status(&self) -> &str {
        &self.status
    }
    fn due_date(&self) -> Option<Date> {
        self.due_date
    }
    fn duration_min(&self) -> Option<i32> {
        self.duration_min
    }
    fn kind(&self) -> TaskKind {
        TaskKind::from_flags(self.is_preventive, self.is_planned, self.frequency_hours)
    }
}

impl RuleFacts for TaskWithMachine {
    fn frequency_hours(&self) -> Option<i32> {
        self.frequency_hours
    }
    fn duration_min(&self) -> Option<i32> {
        self.duration_min
    }
}

impl LibraryFacts for TaskWithMachine {
    fn machine_id(&self) -> DbId {
        self.machine_id
    }
    fn machine_name(&self) -> &str {
        &self.machine_name
    }
    fn model(&self) -> Option<&str> {
        self.model.as_deref()
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
}

/// DTO for creating a task.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub machine_id: DbId,
    pub section: Option<String>,
    pub unit: Option<String>,
    pub task: String,
    pub task_type: Option<String>,
    pub quantity: Option<i32>,
    pub duration_min: Option<i32>,
    pub frequency_hours: Option<i32>,
    pub due_date: Option<Date>,
    /// Defaults to `Planned` when absent.
    pub status: Option<String>,
    pub is_preventive: bool,
    pub is_planned: bool,
}

/// DTO for updating a task. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub section: Option<String>,
    pub unit: Option<String>,
    pub task: Option<String>,
    pub task_type: Option<String>,
    pub quantity: Option<i32>,
    pub duration_min: Option<i32>,
    pub frequency_hours: Option<i32>,
    pub due_date: Option<Date>,
    pub status: Option<String>,
}

/// Identifies the tasks a preventive rule deletion applies to: every live
/// preventive task with the same description, either on one machine or on
/// every machine of a model.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSelector {
    pub task: String,
    pub section: Option<String>,
    pub machine_id: Option<DbId>,
    pub model: Option<String>,
}
