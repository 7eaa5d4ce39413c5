//! Handlers for spreadsheet import.
//!
//! - `POST /import` reads the configured workbook from disk and writes every
//!   row without a surrounding transaction.
//! - `POST /importExcel/preview` maps an uploaded workbook without writing.
//! - `POST /importExcel/commit` writes previewed rows in one transaction.

use std::path::PathBuf;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::error::CoreError;
use cmms_core::importer::{
    build_preview, map_row, ImportRow, ImportSummary, RawRow, RejectedRow, RowOutcome,
};
use cmms_db::repositories::{ImportRepo, MachineRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequirePlanner;
use crate::response::DataResponse;
use crate::spreadsheet::{self, SpreadsheetError};
use crate::state::AppState;

/// Multipart field carrying the workbook.
const UPLOAD_FIELD: &str = "file";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A valid preview row and whether its machine is already registered.
#[derive(Debug, Serialize)]
pub struct PreviewRow {
    #[serde(flatten)]
    pub row: ImportRow,
    pub machine_exists: bool,
}

/// Response body for `POST /importExcel/preview`.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub valid: Vec<PreviewRow>,
    pub rejected: Vec<RejectedRow>,
    pub new_machines: Vec<String>,
}

/// Body for `POST /importExcel/commit`: the valid rows from a preview.
#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub rows: Vec<ImportRow>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn read_from_disk(path: PathBuf) -> AppResult<Vec<RawRow>> {
    let rows = tokio::task::spawn_blocking(move || spreadsheet::read_rows_from_path(&path))
        .await
        .map_err(|e| AppError::InternalError(format!("Spreadsheet reader panicked: {e}")))??;
    Ok(rows)
}

async fn read_upload(bytes: Vec<u8>) -> AppResult<Vec<RawRow>> {
    tokio::task::spawn_blocking(move || spreadsheet::read_rows_from_bytes(bytes))
        .await
        .map_err(|e| AppError::InternalError(format!("Spreadsheet reader panicked: {e}")))?
        .map_err(|e: SpreadsheetError| AppError::BadRequest(e.to_string()))
}

/// Reject committed rows that could not have come out of a preview.
fn check_commit_rows(rows: &[ImportRow]) -> AppResult<()> {
    let bad: Vec<String> = rows
        .iter()
        .filter(|r| {
            r.machine_name.trim().is_empty()
                || r.task.trim().is_empty()
                || [r.quantity, r.duration_min, r.frequency_hours]
                    .iter()
                    .any(|n| n.is_some_and(|n| n < 0))
        })
        .map(|r| r.row_number.to_string())
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Validation(format!(
            "invalid rows: {}",
            bad.join(", ")
        ))))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /import
///
/// Reads the workbook at `IMPORT_FILE_PATH`. Rows without a machine name are
/// skipped; unparseable fields are stored as NULL and reported in `issues`.
/// A database failure stops the import and leaves earlier rows in place.
pub async fn import_from_disk(
    RequirePlanner(user): RequirePlanner,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let path = state.config.import_file_path.clone();
    tracing::info!(path = %path.display(), user_id = user.user_id, "Import from disk started");
    let raw = read_from_disk(path).await?;

    let mut rows = Vec::with_capacity(raw.len());
    let mut issues = Vec::new();
    let mut skipped = 0;
    for (idx, raw_row) in raw.iter().enumerate() {
        match map_row(idx + 2, raw_row) {
            RowOutcome::Skipped => skipped += 1,
            RowOutcome::Mapped { row, issues: found } => {
                issues.extend(found);
                rows.push(row);
            }
        }
    }

    let summary = ImportRepo::import_rows(&state.pool, &rows).await?;
    let summary = ImportSummary {
        rows_skipped: skipped,
        issues,
        ..summary
    };

    tracing::info!(
        rows = summary.rows_read,
        skipped = summary.rows_skipped,
        machines_created = summary.machines_created,
        tasks_inserted = summary.tasks_inserted,
        issues = summary.issues.len(),
        "Import from disk finished",
    );
    Ok(Json(DataResponse { data: summary }))
}

/// POST /importExcel/preview
///
/// Multipart upload with the workbook in field `file`. Nothing is written.
pub async fn preview_upload(
    RequirePlanner(_user): RequirePlanner,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            bytes = Some(data.to_vec());
            break;
        }
    }
    let bytes = bytes.ok_or_else(|| {
        AppError::BadRequest(format!("multipart field '{UPLOAD_FIELD}' is required"))
    })?;

    let raw = read_upload(bytes).await?;
    let known = MachineRepo::names(&state.pool).await?;
    let preview = build_preview(&raw, |name| known.contains(name));

    let valid = preview
        .valid
        .into_iter()
        .map(|row| PreviewRow {
            machine_exists: known.contains(&row.machine_name),
            row,
        })
        .collect();

    Ok(Json(DataResponse {
        data: PreviewResponse {
            total_rows: preview.total_rows,
            skipped_rows: preview.skipped_rows,
            valid,
            rejected: preview.rejected,
            new_machines: preview.new_machines,
        },
    }))
}

/// POST /importExcel/commit
///
/// All rows are written in one transaction; any failure rolls back the lot.
pub async fn commit_rows(
    RequirePlanner(user): RequirePlanner,
    State(state): State<AppState>,
    Json(input): Json<CommitRequest>,
) -> AppResult<impl IntoResponse> {
    if input.rows.is_empty() {
        return Err(AppError::BadRequest("no rows to import".into()));
    }
    check_commit_rows(&input.rows)?;

    let summary = ImportRepo::commit_rows(&state.pool, &input.rows).await?;
    tracing::info!(
        rows = summary.rows_read,
        machines_created = summary.machines_created,
        tasks_inserted = summary.tasks_inserted,
        user_id = user.user_id,
        "Import committed",
    );
    Ok(Json(DataResponse { data: summary }))
}
