//! Handlers for maintenance tasks: list with filters, manual task CRUD,
//! status changes and completion.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::due_state::DueState;
use cmms_core::duration::format_minutes;
use cmms_core::error::CoreError;
use cmms_core::task::{self as task_rules, TaskKind};
use cmms_core::task_filter::{filter_tasks, TaskFacts, TaskFilter};
use cmms_core::types::{Date, DbId, Timestamp};
use cmms_db::models::execution::CompleteTask;
use cmms_db::models::task::{CreateTask, TaskWithMachine, UpdateTask};
use cmms_db::repositories::{MachineRepo, TaskRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::today;
use crate::error::{validate_request, AppError, AppResult};
use crate::middleware::rbac::{RequireAuth, RequirePlanner, RequireTechnician};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response / request types
// ---------------------------------------------------------------------------

/// A task row with the values computed at read time.
#[derive(Debug, Serialize)]
pub struct TaskRow {
    #[serde(flatten)]
    pub task: TaskWithMachine,
    pub kind: TaskKind,
    pub due_state: DueState,
    pub duration_label: String,
}

impl TaskRow {
    pub fn new(task: TaskWithMachine, today: Date) -> Self {
        Self {
            kind: TaskFacts::kind(&task),
            due_state: task.due_state(today),
            duration_label: format_minutes(task.duration_min),
            task,
        }
    }
}

/// Body for `POST /tasks`. Creates a manual (planned) or breakdown
/// (unplanned) task; recurring rules go through `/preventives`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub machine_id: DbId,
    #[validate(length(max = 200))]
    pub section: Option<String>,
    #[validate(length(max = 200))]
    pub unit: Option<String>,
    pub task: String,
    #[validate(length(max = 100))]
    pub task_type: Option<String>,
    pub quantity: Option<i32>,
    pub duration_min: Option<i32>,
    pub due_date: Option<Date>,
    pub status: Option<String>,
    /// `false` records breakdown work. Defaults to `true`.
    #[serde(default = "default_true")]
    pub is_planned: bool,
}

fn default_true() -> bool {
    true
}

/// Body for `PUT /tasks/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(max = 200))]
    pub section: Option<String>,
    #[validate(length(max = 200))]
    pub unit: Option<String>,
    pub task: Option<String>,
    #[validate(length(max = 100))]
    pub task_type: Option<String>,
    pub quantity: Option<i32>,
    pub duration_min: Option<i32>,
    pub frequency_hours: Option<i32>,
    pub due_date: Option<Date>,
    pub status: Option<String>,
}

/// Body for `POST /tasks/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// Body for `POST /tasks/{id}/complete`. Every field is optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CompleteRequest {
    /// Defaults to the authenticated user's username.
    #[validate(length(min = 1, max = 100))]
    pub executed_by: Option<String>,
    /// Defaults to now.
    pub executed_at: Option<Timestamp>,
    pub duration_min: Option<i32>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Task", id })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /tasks
///
/// Live tasks joined with their machines in ascending id order, narrowed by
/// the optional `search`, `due_state`, `line`, `kind` and `status` filters.
pub async fn list_tasks(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> AppResult<impl IntoResponse> {
    let today = today();
    let tasks = TaskRepo::list_with_machine(&state.pool).await?;
    let rows: Vec<TaskRow> = if filter.is_empty() {
        tasks.into_iter().map(|t| TaskRow::new(t, today)).collect()
    } else {
        filter_tasks(&tasks, &filter, today)
            .into_iter()
            .map(|t| TaskRow::new(t.clone(), today))
            .collect()
    };
    Ok(Json(DataResponse { data: rows }))
}

/// POST /tasks
pub async fn create_task(
    RequirePlanner(user): RequirePlanner,
    State(state): State<AppState>,
    Json(input): Json<CreateTaskRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    task_rules::validate_task_text(&input.task)?;
    if let Some(minutes) = input.duration_min {
        task_rules::validate_duration_min(minutes)?;
    }
    task_rules::validate_quantity(input.quantity)?;
    if let Some(status) = &input.status {
        task_rules::validate_status(status)?;
    }

    if MachineRepo::find_by_id(&state.pool, input.machine_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Machine",
            id: input.machine_id,
        }));
    }

    let task = TaskRepo::create(
        &state.pool,
        &CreateTask {
            machine_id: input.machine_id,
            section: input.section,
            unit: input.unit,
            task: input.task,
            task_type: input.task_type,
            quantity: input.quantity,
            duration_min: input.duration_min,
            frequency_hours: None,
            due_date: input.due_date,
            status: input.status.map(|s| s.trim().to_string()),
            is_preventive: false,
            is_planned: input.is_planned,
        },
    )
    .await?;

    tracing::info!(
        task_id = task.id,
        machine_id = task.machine_id,
        kind = task.kind().as_str(),
        user_id = user.user_id,
        "Task created",
    );

    let row = TaskRepo::find_with_machine(&state.pool, task.id)
        .await?
        .ok_or_else(|| not_found(task.id))?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: TaskRow::new(row, today()),
        }),
    ))
}

/// PUT /tasks/{id}
pub async fn update_task(
    RequirePlanner(_user): RequirePlanner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTaskRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    if let Some(task) = &input.task {
        task_rules::validate_task_text(task)?;
    }
    if let Some(minutes) = input.duration_min {
        task_rules::validate_duration_min(minutes)?;
    }
    if let Some(hours) = input.frequency_hours {
        task_rules::validate_frequency_hours(hours)?;
    }
    task_rules::validate_quantity(input.quantity)?;
    if let Some(status) = &input.status {
        task_rules::validate_status(status)?;
    }

    let update = UpdateTask {
        section: input.section,
        unit: input.unit,
        task: input.task,
        task_type: input.task_type,
        quantity: input.quantity,
        duration_min: input.duration_min,
        frequency_hours: input.frequency_hours,
        due_date: input.due_date,
        status: input.status.map(|s| s.trim().to_string()),
    };
    let task = TaskRepo::update(&state.pool, id, &update)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: task }))
}

/// DELETE /tasks/{id}
///
/// Soft delete. Executions recorded against the task are kept.
pub async fn delete_task(
    RequirePlanner(user): RequirePlanner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !TaskRepo::soft_delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(task_id = id, user_id = user.user_id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /tasks/{id}/status
pub async fn set_status(
    RequirePlanner(_user): RequirePlanner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<StatusRequest>,
) -> AppResult<impl IntoResponse> {
    task_rules::validate_status(&input.status)?;
    let task = TaskRepo::update_status(&state.pool, id, &input.status)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: task }))
}

/// POST /tasks/{id}/complete
///
/// Records an execution. Preventive tasks are rescheduled from the execution
/// date; every other kind becomes `Done`.
pub async fn complete_task(
    RequireTechnician(user): RequireTechnician,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CompleteRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    if let Some(minutes) = input.duration_min {
        task_rules::validate_duration_min(minutes)?;
    }

    let task = TaskRepo::find_with_machine(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let executed_by = match input.executed_by.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            UserRepo::find_by_id(&state.pool, user.user_id)
                .await?
                .ok_or(AppError::Core(CoreError::NotFound {
                    entity: "User",
                    id: user.user_id,
                }))?
                .username
        }
    };

    let completion = TaskRepo::complete(
        &state.pool,
        &task,
        &CompleteTask {
            executed_by,
            executed_at: input.executed_at.unwrap_or_else(chrono::Utc::now),
            duration_min: input.duration_min,
            notes: input.notes,
        },
    )
    .await?
    .ok_or_else(|| not_found(id))?;

    tracing::info!(
        task_id = id,
        execution_id = completion.execution.id,
        executed_by = %completion.execution.executed_by,
        next_due = ?completion.task.due_date,
        status = %completion.task.status,
        "Task completed",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: completion })))
}
