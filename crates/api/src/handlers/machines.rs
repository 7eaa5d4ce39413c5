//! Handlers for machines (assets).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::error::CoreError;
use cmms_core::types::DbId;
use cmms_db::models::machine::{CreateMachine, UpdateMachine};
use cmms_db::repositories::MachineRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{validate_request, AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequirePlanner};
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /machines`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMachineRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 200))]
    pub model: Option<String>,
    #[validate(length(max = 200))]
    pub serial: Option<String>,
    #[validate(length(max = 100))]
    pub line: Option<String>,
}

/// Body for `PUT /machines/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMachineRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub model: Option<String>,
    #[validate(length(max = 200))]
    pub serial: Option<String>,
    #[validate(length(max = 100))]
    pub line: Option<String>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// GET /machines
///
/// Every machine in ascending id order.
pub async fn list_machines(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let machines = MachineRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: machines }))
}

/// GET /machines/{id}
pub async fn get_machine(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let machine = MachineRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Machine",
            id,
        }))?;
    Ok(Json(DataResponse { data: machine }))
}

/// POST /machines
///
/// Upsert by name. Returns 201 when a new machine was created and 200 when
/// an existing one was reused; missing attributes on an existing machine
/// are filled in.
pub async fn create_machine(
    RequirePlanner(user): RequirePlanner,
    State(state): State<AppState>,
    Json(input): Json<CreateMachineRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Machine name is required".into(),
        )));
    }

    let upsert = MachineRepo::upsert_by_name(
        &state.pool,
        &CreateMachine {
            name,
            model: trimmed(input.model),
            serial: trimmed(input.serial),
            line: trimmed(input.line),
        },
    )
    .await?;

    let machine = MachineRepo::find_by_id(&state.pool, upsert.id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Machine",
            id: upsert.id,
        }))?;

    let status = if upsert.inserted {
        tracing::info!(machine_id = machine.id, name = %machine.name, user_id = user.user_id, "Machine created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: machine })))
}

/// PUT /machines/{id}
pub async fn update_machine(
    RequirePlanner(_user): RequirePlanner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMachineRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    let update = UpdateMachine {
        name: trimmed(input.name),
        model: trimmed(input.model),
        serial: trimmed(input.serial),
        line: trimmed(input.line),
    };
    let machine = MachineRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Machine",
            id,
        }))?;
    Ok(Json(DataResponse { data: machine }))
}
