//! Route definitions for maintenance tasks.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                -> list_tasks
/// POST   /                -> create_task (planner)
/// PUT    /{id}            -> update_task (planner)
/// DELETE /{id}            -> delete_task (planner)
/// POST   /{id}/status     -> set_status (planner)
/// POST   /{id}/complete   -> complete_task (technician+)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_task))
        .route("/{id}", put(tasks::update_task).delete(tasks::delete_task))
        .route("/{id}/status", post(tasks::set_status))
        .route("/{id}/complete", post(tasks::complete_task))
}
