//! Printable HTML reports.

use axum::extract::{Path, Query, State};
use axum::response::Html;
use cmms_core::report::{build_report, ReportFilter, ReportKind};
use cmms_db::repositories::{ExecutionRepo, TaskRepo};

use super::executions::check_range;
use super::today;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::state::AppState;

/// GET /reports/{kind}
///
/// `kind` is one of `status`, `completed`, `overdue` or `unplanned`. Query
/// parameters `from`, `to`, `line`, `status` and `technician` narrow the
/// rows.
pub async fn render_report(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(filter): Query<ReportFilter>,
) -> AppResult<Html<String>> {
    let kind = ReportKind::from_str(&kind)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown report kind '{kind}'")))?;
    check_range(filter.from, filter.to)?;

    let (tasks, executions) = if kind.uses_executions() {
        let executions = ExecutionRepo::list_between(&state.pool, filter.from, filter.to).await?;
        (Vec::new(), executions)
    } else {
        (TaskRepo::list_with_machine(&state.pool).await?, Vec::new())
    };

    let report = build_report(kind, &tasks, &executions, &filter, today());
    tracing::debug!(kind = ?kind, rows = report.rows.len(), user_id = auth.user_id, "Report rendered");
    Ok(Html(report.render_html()))
}
