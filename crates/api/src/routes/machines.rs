//! Route definitions for machines (assets).

use axum::routing::get;
use axum::Router;

use crate::handlers::machines;
use crate::state::AppState;

/// Routes mounted at `/machines`.
///
/// ```text
/// GET  /       -> list_machines
/// POST /       -> create_machine (planner; upsert by name)
/// GET  /{id}   -> get_machine
/// PUT  /{id}   -> update_machine (planner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(machines::list_machines).post(machines::create_machine),
        )
        .route(
            "/{id}",
            get(machines::get_machine).put(machines::update_machine),
        )
}
