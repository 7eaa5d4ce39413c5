//! Route definitions for spreadsheet import.

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;

use crate::handlers::import;
use crate::state::AppState;

/// Largest accepted workbook upload.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Import routes, merged at the root.
///
/// ```text
/// POST /import                -> import_from_disk (planner)
/// POST /importExcel/preview   -> preview_upload (planner, multipart)
/// POST /importExcel/commit    -> commit_rows (planner)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/import", post(import::import_from_disk))
        .route(
            "/importExcel/preview",
            post(import::preview_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/importExcel/commit", post(import::commit_rows))
}
