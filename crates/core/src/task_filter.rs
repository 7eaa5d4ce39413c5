//! Task and execution views plus list filtering.
//!
//! The DB crate implements [`TaskFacts`] and [`ExecutionFacts`] for its row
//! types so the filters, KPIs and reports here can work over fetched rows
//! without knowing about SQL.

use serde::Deserialize;

use crate::due_state::{self, DueState};
use crate::task::TaskKind;
use crate::types::{Date, Timestamp};

/// Read-only view of a task joined with its machine.
pub trait TaskFacts {
    fn machine_name(&self) -> &str;
    fn line(&self) -> Option<&str>;
    fn section(&self) -> Option<&str>;
    fn unit(&self) -> Option<&str>;
    fn task(&self) -> &str;
    fn status(&self) -> &str;
    fn due_date(&self) -> Option<Date>;
    fn duration_min(&self) -> Option<i32>;
    fn kind(&self) -> TaskKind;

    fn due_state(&self, today: Date) -> DueState {
        due_state::classify(self.due_date(), self.status(), today)
    }
}

/// Read-only view of an execution record.
pub trait ExecutionFacts {
    fn executed_at(&self) -> Timestamp;
    fn executed_by(&self) -> &str;
    fn line(&self) -> Option<&str>;
    fn machine_name(&self) -> &str;
    fn section(&self) -> Option<&str>;
    fn unit(&self) -> Option<&str>;
    fn task(&self) -> &str;
    fn is_planned(&self) -> bool;
    fn duration_min(&self) -> Option<i32>;
}

/// Case-insensitive substring match. An empty needle matches everything.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn opt_contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| contains_ci(h, needle))
}

/// Filters available on the task list. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    /// Substring over machine, task, section and unit (case-insensitive).
    pub search: Option<String>,
    pub due_state: Option<DueState>,
    /// Exact production line (case-insensitive).
    pub line: Option<String>,
    pub kind: Option<TaskKind>,
    /// Exact status (case-insensitive).
    pub status: Option<String>,
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, str::is_empty)
            && self.due_state.is_none()
            && self.line.is_none()
            && self.kind.is_none()
            && self.status.is_none()
    }

    pub fn matches<T: TaskFacts>(&self, task: &T, today: Date) -> bool {
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty()
                && !(contains_ci(task.machine_name(), search)
                    || contains_ci(task.task(), search)
                    || opt_contains_ci(task.section(), search)
                    || opt_contains_ci(task.unit(), search))
            {
                return false;
            }
        }
        if let Some(state) = self.due_state {
            if task.due_state(today) != state {
                return false;
            }
        }
        if let Some(line) = self.line.as_deref() {
            if !task.line().is_some_and(|l| l.eq_ignore_ascii_case(line)) {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if task.kind() != kind {
                return false;
            }
        }
        if let Some(status) = self.status.as_deref() {
            if !task.status().eq_ignore_ascii_case(status) {
                return false;
            }
        }
        true
    }
}

/// Apply `filter` to `tasks`, preserving order.
pub fn filter_tasks<'a, T: TaskFacts>(
    tasks: &'a [T],
    filter: &TaskFilter,
    today: Date,
) -> Vec<&'a T> {
    tasks.iter().filter(|t| filter.matches(*t, today)).collect()
}

/// Date-range, line and technician filter over executions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionFilter {
    /// Inclusive lower bound on the execution date.
    pub from: Option<Date>,
    /// Inclusive upper bound on the execution date.
    pub to: Option<Date>,
    pub line: Option<String>,
    /// Case-insensitive substring of `executed_by`.
    pub technician: Option<String>,
}

impl ExecutionFilter {
    pub fn matches<E: ExecutionFacts>(&self, exec: &E) -> bool {
        let day = exec.executed_at().date_naive();
        if self.from.is_some_and(|from| day < from) {
            return false;
        }
        if self.to.is_some_and(|to| day > to) {
            return false;
        }
        if let Some(line) = self.line.as_deref() {
            if !exec.line().is_some_and(|l| l.eq_ignore_ascii_case(line)) {
                return false;
            }
        }
        if let Some(tech) = self.technician.as_deref() {
            if !contains_ci(exec.executed_by(), tech.trim()) {
                return false;
            }
        }
        true
    }
}

/// Apply `filter` to `executions`, preserving order.
pub fn filter_executions<'a, E: ExecutionFacts>(
    executions: &'a [E],
    filter: &ExecutionFilter,
) -> Vec<&'a E> {
    executions.iter().filter(|e| filter.matches(*e)).collect()
}
