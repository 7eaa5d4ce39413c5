use axum::routing::get;
use axum::Router;

use crate::handlers::kpis;
use crate::state::AppState;

/// Routes mounted at `/kpis`.
///
/// ```text
/// GET /summary      -> task counts by kind and due state
/// GET /compliance   -> planned vs unplanned executions, per technician
/// GET /breakdowns   -> unplanned executions by machine and line
/// GET /workload     -> monthly preventive load
/// GET /dashboard    -> all of the above, failures isolated per section
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(kpis::summary))
        .route("/compliance", get(kpis::compliance))
        .route("/breakdowns", get(kpis::breakdowns))
        .route("/workload", get(kpis::workload))
        .route("/dashboard", get(kpis::dashboard))
}
