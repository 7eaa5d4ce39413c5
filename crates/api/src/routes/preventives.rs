//! Route definitions for preventive rules.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::preventives;
use crate::state::AppState;

/// Routes mounted at `/preventives`.
///
/// ```text
/// GET  /                        -> list_rules
/// POST /                        -> create_rule (planner)
/// PUT  /{id}                    -> update_rule (planner)
/// GET  /library                 -> library
/// GET  /workload                -> workload
/// POST /delete-rule/preview     -> preview_rule_deletion (admin)
/// POST /delete-rule             -> delete_rule (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(preventives::list_rules).post(preventives::create_rule),
        )
        .route("/{id}", put(preventives::update_rule))
        .route("/library", get(preventives::library))
        .route("/workload", get(preventives::workload))
        .route(
            "/delete-rule/preview",
            post(preventives::preview_rule_deletion),
        )
        .route("/delete-rule", post(preventives::delete_rule))
}
