//! Printable HTML reports built from filtered task and execution rows.

use serde::Deserialize;

use crate::due_state::DueState;
use crate::duration::format_minutes;
use crate::task_filter::{contains_ci, ExecutionFacts, TaskFacts};
use crate::types::Date;

/// The report variants that can be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Every open and closed task with its due state.
    Status,
    /// Executions grouped by technician.
    Completed,
    /// Open tasks past their due date.
    Overdue,
    /// Breakdown (non-planned) executions.
    Unplanned,
}

impl ReportKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "status" => Some(Self::Status),
            "completed" => Some(Self::Completed),
            "overdue" => Some(Self::Overdue),
            "unplanned" => Some(Self::Unplanned),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Status => "Task status",
            Self::Completed => "Completed work by technician",
            Self::Overdue => "Overdue tasks",
            Self::Unplanned => "Breakdowns (non-planned work)",
        }
    }

    /// Whether the report is built from executions rather than tasks.
    pub fn uses_executions(self) -> bool {
        matches!(self, Self::Completed | Self::Unplanned)
    }
}

/// Report filters. Task reports apply the date range to the due date,
/// execution reports to the execution date. Both bounds are inclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilter {
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub line: Option<String>,
    pub status: Option<String>,
    pub technician: Option<String>,
}

impl ReportFilter {
    fn in_range(&self, day: Date) -> bool {
        self.from.map_or(true, |from| from <= day) && self.to.map_or(true, |to| day <= to)
    }

    fn line_matches(&self, line: Option<&str>) -> bool {
        match self.line.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(wanted) => line.is_some_and(|l| l.eq_ignore_ascii_case(wanted)),
        }
    }

    fn task_matches<T: TaskFacts>(&self, task: &T) -> bool {
        if let Some(status) = self.status.as_deref().map(str::trim) {
            if !status.is_empty() && !task.status().eq_ignore_ascii_case(status) {
                return false;
            }
        }
        if self.from.is_some() || self.to.is_some() {
            match task.due_date() {
                Some(due) if self.in_range(due) => {}
                _ => return false,
            }
        }
        self.line_matches(task.line())
    }

    fn execution_matches<E: ExecutionFacts>(&self, exec: &E) -> bool {
        if let Some(tech) = self.technician.as_deref() {
            if !contains_ci(exec.executed_by(), tech.trim()) {
                return false;
            }
        }
        self.in_range(exec.executed_at().date_naive()) && self.line_matches(exec.line())
    }
}

/// A rendered-ready table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    pub generated_on: Date,
}

const TASK_HEADERS: [&str; 8] = [
    "Machine", "Line", "Section", "Unit", "Task", "Due date", "Due state", "Duration",
];

const EXECUTION_HEADERS: [&str; 7] = [
    "Executed at", "Technician", "Line", "Machine", "Section", "Task", "Duration",
];

fn opt(value: Option<&str>) -> String {
    value.unwrap_or("").to_string()
}

fn task_row<T: TaskFacts>(task: &T, today: Date) -> Vec<String> {
    vec![
        task.machine_name().to_string(),
        opt(task.line()),
        opt(task.section()),
        opt(task.unit()),
        task.task().to_string(),
        task.due_date().map(|d| d.to_string()).unwrap_or_default(),
        task.due_state(today).as_str().to_string(),
        format_minutes(task.duration_min()),
    ]
}

fn execution_row<E: ExecutionFacts>(exec: &E) -> Vec<String> {
    vec![
        exec.executed_at().format("%Y-%m-%d %H:%M").to_string(),
        exec.executed_by().to_string(),
        opt(exec.line()),
        exec.machine_name().to_string(),
        opt(exec.section()),
        exec.task().to_string(),
        format_minutes(exec.duration_min()),
    ]
}

/// Build a task-based report (`Status` or `Overdue`).
pub fn task_report<T: TaskFacts>(
    kind: ReportKind,
    tasks: &[T],
    filter: &ReportFilter,
    today: Date,
) -> Report {
    let rows = tasks
        .iter()
        .filter(|t| filter.task_matches(*t))
        .filter(|t| kind != ReportKind::Overdue || t.due_state(today) == DueState::Overdue)
        .map(|t| task_row(t, today))
        .collect();
    Report {
        title: kind.title().to_string(),
        headers: TASK_HEADERS.to_vec(),
        rows,
        generated_on: today,
    }
}

/// Build an execution-based report (`Completed` or `Unplanned`).
///
/// `Completed` rows are ordered by technician, then by execution time.
/// `Unplanned` keeps only executions of non-planned work, newest first.
pub fn execution_report<E: ExecutionFacts>(
    kind: ReportKind,
    executions: &[E],
    filter: &ReportFilter,
    today: Date,
) -> Report {
    let mut selected: Vec<&E> = executions
        .iter()
        .filter(|e| filter.execution_matches(*e))
        .filter(|e| kind != ReportKind::Unplanned || !e.is_planned())
        .collect();
    match kind {
        ReportKind::Completed => selected.sort_by(|a, b| {
            a.executed_by()
                .to_lowercase()
                .cmp(&b.executed_by().to_lowercase())
                .then(a.executed_at().cmp(&b.executed_at()))
        }),
        _ => selected.sort_by(|a, b| b.executed_at().cmp(&a.executed_at())),
    }
    Report {
        title: kind.title().to_string(),
        headers: EXECUTION_HEADERS.to_vec(),
        rows: selected.into_iter().map(execution_row).collect(),
        generated_on: today,
    }
}

/// Build whichever report `kind` names from the matching row set.
pub fn build_report<T: TaskFacts, E: ExecutionFacts>(
    kind: ReportKind,
    tasks: &[T],
    executions: &[E],
    filter: &ReportFilter,
    today: Date,
) -> Report {
    if kind.uses_executions() {
        execution_report(kind, executions, filter, today)
    } else {
        task_report(kind, tasks, filter, today)
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl Report {
    /// Render a standalone, print-friendly HTML document.
    pub fn render_html(&self) -> String {
        let title = escape_html(&self.title);
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
        html.push_str(&format!("<title>{title}</title>"));
        html.push_str(
            "<style>body{font-family:sans-serif}table{border-collapse:collapse}\
             th,td{border:1px solid #999;padding:4px 8px}</style></head><body>\n",
        );
        html.push_str(&format!(
            "<h1>{title}</h1>\n<p>Generated {} &middot; {} rows</p>\n<table>\n<thead><tr>",
            self.generated_on,
            self.rows.len()
        ));
        for header in &self.headers {
            html.push_str(&format!("<th>{}</th>", escape_html(header)));
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td>{}</td>", escape_html(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n</body></html>\n");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_filter::fixtures::{day, E, T};

    #[test]
    fn kind_parsing() {
        assert_eq!(ReportKind::from_str("overdue"), Some(ReportKind::Overdue));
        assert_eq!(ReportKind::from_str("weekly"), None);
        assert!(ReportKind::Completed.uses_executions());
        assert!(!ReportKind::Status.uses_executions());
    }

    #[test]
    fn overdue_report_keeps_only_overdue_open_tasks() {
        let today = day(2024, 3, 5);
        let mut done = T::new("Press 1", "Oil", Some(day(2024, 3, 1)));
        done.status = "Done";
        let tasks = vec![
            done,
            T::new("Press 2", "Oil", Some(day(2024, 3, 1))),
            T::new("Press 3", "Oil", Some(day(2024, 3, 20))),
        ];
        let report = task_report(ReportKind::Overdue, &tasks, &ReportFilter::default(), today);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0][0], "Press 2");
        assert_eq!(report.rows[0][6], "overdue");
        assert_eq!(report.rows[0][7], "30m");
    }

    #[test]
    fn status_report_filters_by_due_range_and_status() {
        let today = day(2024, 3, 5);
        let tasks = vec![
            T::new("Press 1", "Oil", Some(day(2024, 3, 1))),
            T::new("Press 2", "Oil", Some(day(2024, 4, 1))),
            T::new("Press 3", "Oil", None),
        ];
        let filter = ReportFilter {
            from: Some(day(2024, 3, 1)),
            to: Some(day(2024, 3, 31)),
            status: Some("planned".into()),
            ..ReportFilter::default()
        };
        let report = task_report(ReportKind::Status, &tasks, &filter, today);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0][0], "Press 1");

        let all = task_report(ReportKind::Status, &tasks, &ReportFilter::default(), today);
        assert_eq!(all.rows.len(), 3);
    }

    #[test]
    fn completed_report_sorts_by_technician() {
        let execs = vec![
            E::on(2024, 3, 3, "marco", "Lathe"),
            E::on(2024, 3, 2, "Anna", "Press 2"),
            E::on(2024, 3, 1, "Anna", "Press 1"),
        ];
        let report = execution_report(
            ReportKind::Completed,
            &execs,
            &ReportFilter::default(),
            day(2024, 3, 5),
        );
        let order: Vec<&str> = report.rows.iter().map(|r| r[3].as_str()).collect();
        assert_eq!(order, vec!["Press 1", "Press 2", "Lathe"]);
    }

    #[test]
    fn unplanned_report_filters_technician_and_line() {
        let mut a = E::on(2024, 3, 3, "Marco Rossi", "Lathe");
        a.planned = false;
        let mut b = a.clone();
        b.line = Some("L2");
        let execs = vec![a, b, E::on(2024, 3, 4, "Marco Rossi", "Press 1")];
        let filter = ReportFilter {
            technician: Some("rossi".into()),
            line: Some("L1".into()),
            ..ReportFilter::default()
        };
        let report = execution_report(ReportKind::Unplanned, &execs, &filter, day(2024, 3, 5));
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0][2], "L1");
    }

    #[test]
    fn html_escapes_cell_text() {
        let tasks = vec![T::new("Press <1>", "Check \"seal\" & oil", None)];
        let html = task_report(
            ReportKind::Status,
            &tasks,
            &ReportFilter::default(),
            day(2024, 3, 5),
        )
        .render_html();
        assert!(html.contains("<td>Press &lt;1&gt;</td>"));
        assert!(html.contains("Check &quot;seal&quot; &amp; oil"));
        assert!(html.contains("<th>Due state</th>"));
        assert!(html.contains("1 rows"));
    }
}
