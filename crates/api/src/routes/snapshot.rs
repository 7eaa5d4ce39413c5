use axum::routing::get;
use axum::Router;

use crate::handlers::snapshot;
use crate::state::AppState;

/// Routes mounted at `/snapshot`.
pub fn router() -> Router<AppState> {
    Router::new().route("/export", get(snapshot::export))
}
