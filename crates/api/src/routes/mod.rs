pub mod auth;
pub mod executions;
pub mod health;
pub mod import;
pub mod kpis;
pub mod machines;
pub mod preventives;
pub mod reports;
pub mod snapshot;
pub mod tasks;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree. Everything is mounted at the root.
///
/// ```text
/// /auth/login, /auth/refresh                       public
/// /auth/logout, /auth/me                           any user
///
/// /machines                                        list, create (upsert)
/// /machines/{id}                                   get, update
///
/// /tasks                                           list (filters), create
/// /tasks/{id}                                      update, delete (soft)
/// /tasks/{id}/status                               status change
/// /tasks/{id}/complete                             record an execution
///
/// /executions                                      list (filters)
///
/// /preventives                                     list, create
/// /preventives/{id}                                update
/// /preventives/library                             rules grouped by model
/// /preventives/workload                            monthly load
/// /preventives/delete-rule/preview                 dry run (admin)
/// /preventives/delete-rule                         soft delete (admin)
///
/// /import                                          legacy import from disk
/// /importExcel/preview                             multipart upload preview
/// /importExcel/commit                              atomic commit
///
/// /kpis/{summary,compliance,breakdowns,workload,dashboard}
/// /reports/{kind}                                  HTML
/// /snapshot/export                                 JSON dump (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/machines", machines::router())
        .nest("/tasks", tasks::router())
        .nest("/executions", executions::router())
        .nest("/preventives", preventives::router())
        .merge(import::router())
        .nest("/kpis", kpis::router())
        .nest("/reports", reports::router())
        .nest("/snapshot", snapshot::router())
}
