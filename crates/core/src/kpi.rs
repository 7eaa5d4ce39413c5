//! KPI aggregation over fetched task and execution rows.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::due_state::DueState;
use crate::task::{TaskKind, STATUS_DONE};
use crate::task_filter::{ExecutionFacts, TaskFacts};
use crate::types::Date;

// ---------------------------------------------------------------------------
// Task summary
// ---------------------------------------------------------------------------

/// Headline counts for the task list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub total: usize,
    pub preventive: usize,
    pub planned: usize,
    pub unplanned: usize,
    pub done: usize,
    pub open: usize,
    pub overdue: usize,
    pub due_today: usize,
    pub due_soon: usize,
    /// Estimated minutes of work in overdue open tasks.
    pub overdue_backlog_min: i64,
}

pub fn summarize_tasks<T: TaskFacts>(tasks: &[T], today: Date) -> TaskSummary {
    let mut summary = TaskSummary {
        total: tasks.len(),
        ..TaskSummary::default()
    };
    for task in tasks {
        match task.kind() {
            TaskKind::Preventive => summary.preventive += 1,
            TaskKind::Planned => summary.planned += 1,
            TaskKind::Unplanned => summary.unplanned += 1,
        }
        if task.status() == STATUS_DONE {
            summary.done += 1;
            continue;
        }
        summary.open += 1;
        match task.due_state(today) {
            DueState::Overdue => {
                summary.overdue += 1;
                summary.overdue_backlog_min += task.duration_min().unwrap_or(0).max(0) as i64;
            }
            DueState::Today => summary.due_today += 1,
            DueState::Soon => summary.due_soon += 1,
            DueState::Ok | DueState::Unknown => {}
        }
    }
    summary
}

// ---------------------------------------------------------------------------
// Execution compliance
// ---------------------------------------------------------------------------

/// Planned vs unplanned split of executions in a period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Compliance {
    pub executions: usize,
    pub planned_executions: usize,
    pub unplanned_executions: usize,
    /// Share of executions that were planned work, in percent (0 when empty).
    pub planned_pct: f64,
    pub executed_minutes: i64,
}

pub fn compliance<E: ExecutionFacts>(executions: &[&E]) -> Compliance {
    let planned = executions.iter().filter(|e| e.is_planned()).count();
    let total = executions.len();
    let executed_minutes = executions
        .iter()
        .map(|e| e.duration_min().unwrap_or(0).max(0) as i64)
        .sum();
    Compliance {
        executions: total,
        planned_executions: planned,
        unplanned_executions: total - planned,
        planned_pct: percent(planned, total),
        executed_minutes,
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let pct = part as f64 * 100.0 / whole as f64;
    (pct * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Grouped counts
// ---------------------------------------------------------------------------

/// Count and minutes for one group key (machine, line or technician).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    pub key: String,
    pub count: usize,
    pub minutes: i64,
}

fn group_by<'a, E, F>(executions: &[&'a E], key: F) -> Vec<GroupCount>
where
    E: ExecutionFacts,
    F: Fn(&'a E) -> String,
{
    let mut groups: BTreeMap<String, (usize, i64)> = BTreeMap::new();
    for exec in executions {
        let entry = groups.entry(key(exec)).or_default();
        entry.0 += 1;
        entry.1 += exec.duration_min().unwrap_or(0).max(0) as i64;
    }
    let mut out: Vec<GroupCount> = groups
        .into_iter()
        .map(|(key, (count, minutes))| GroupCount {
            key,
            count,
            minutes,
        })
        .collect();
    // Most frequent first; ties keep alphabetical order (stable sort).
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Label used for rows with no production line.
pub const NO_LINE: &str = "(no line)";

/// Unplanned (breakdown) executions grouped by machine and by line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakdowns {
    pub total: usize,
    pub by_machine: Vec<GroupCount>,
    pub by_line: Vec<GroupCount>,
}

pub fn breakdowns<E: ExecutionFacts>(executions: &[&E]) -> Breakdowns {
    let unplanned: Vec<&E> = executions
        .iter()
        .copied()
        .filter(|e| !e.is_planned())
        .collect();
    Breakdowns {
        total: unplanned.len(),
        by_machine: group_by(&unplanned, |e| e.machine_name().to_string()),
        by_line: group_by(&unplanned, |e| e.line().unwrap_or(NO_LINE).to_string()),
    }
}

/// Executions grouped by technician.
pub fn by_technician<E: ExecutionFacts>(executions: &[&E]) -> Vec<GroupCount> {
    group_by(executions, |e| e.executed_by().trim().to_string())
}
