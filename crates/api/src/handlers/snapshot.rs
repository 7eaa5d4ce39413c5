use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use cmms_db::repositories::SnapshotRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /snapshot/export
///
/// Every machine, task (soft-deleted included) and execution as JSON.
pub async fn export(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let snapshot = SnapshotRepo::export(&state.pool).await?;
    tracing::info!(
        machines = snapshot.machines.len(),
        tasks = snapshot.tasks.len(),
        executions = snapshot.executions.len(),
        user_id = admin.user_id,
        "Snapshot exported",
    );
    Ok(Json(DataResponse { data: snapshot }))
}
