//! Handler for the execution history.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::error::CoreError;
use cmms_core::task_filter::{filter_executions, ExecutionFilter};
use cmms_db::repositories::ExecutionRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Reject a range whose lower bound is after its upper bound.
pub(crate) fn check_range(
    from: Option<cmms_core::types::Date>,
    to: Option<cmms_core::types::Date>,
) -> AppResult<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(AppError::Core(CoreError::Validation(
            format!("'from' ({from}) is after 'to' ({to})"),
        ))),
        _ => Ok(()),
    }
}

/// GET /executions
///
/// Executions newest first, filtered by inclusive `from`/`to` dates, exact
/// `line` and `technician` substring.
pub async fn list_executions(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    Query(filter): Query<ExecutionFilter>,
) -> AppResult<impl IntoResponse> {
    check_range(filter.from, filter.to)?;
    let executions = ExecutionRepo::list_between(&state.pool, filter.from, filter.to).await?;
    let rows: Vec<_> = filter_executions(&executions, &filter)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(DataResponse { data: rows }))
}
