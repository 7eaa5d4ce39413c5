//! Handlers for preventive rules: listing, creation (optionally across a
//! whole machine model), edits, the model library, workload and rule
//! deletion.

use std::collections::HashSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::due_state::DueState;
use cmms_core::duration::format_minutes;
use cmms_core::error::CoreError;
use cmms_core::library::{self, MachineLoad};
use cmms_core::task as task_rules;
use cmms_core::task_filter::TaskFacts;
use cmms_core::types::{Date, DbId};
use cmms_core::workload::{self, FrequencyBucket, MonthlyLoad};
use cmms_db::models::task::{CreateTask, RuleSelector, TaskWithMachine, UpdateTask};
use cmms_db::repositories::{MachineRepo, TaskRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::today;
use crate::error::{validate_request, AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireAuth, RequirePlanner};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A preventive rule with its display values.
#[derive(Debug, Serialize)]
pub struct RuleRow {
    #[serde(flatten)]
    pub task: TaskWithMachine,
    pub bucket: FrequencyBucket,
    pub runs_per_month: f64,
    pub duration_label: String,
    pub due_state: DueState,
}

impl RuleRow {
    fn new(task: TaskWithMachine, today: Date) -> Self {
        let hours = task.frequency_hours.unwrap_or(0);
        Self {
            bucket: FrequencyBucket::classify(hours),
            runs_per_month: workload::runs_per_month(hours),
            duration_label: format_minutes(task.duration_min),
            due_state: task.due_state(today),
            task,
        }
    }
}

/// Optional `?machine_id=` scope.
#[derive(Debug, Default, Deserialize)]
pub struct MachineScope {
    pub machine_id: Option<DbId>,
}

/// Body for `POST /preventives`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRuleRequest {
    pub machine_id: DbId,
    #[validate(length(max = 200))]
    pub section: Option<String>,
    #[validate(length(max = 200))]
    pub unit: Option<String>,
    pub task: String,
    #[validate(length(max = 100))]
    pub task_type: Option<String>,
    pub quantity: Option<i32>,
    pub frequency_hours: i32,
    pub duration_min: i32,
    /// First due date. Defaults to one interval from today.
    pub due_date: Option<Date>,
    /// Also create the rule on every other machine of the same model.
    #[serde(default)]
    pub apply_to_model: bool,
}

/// Body for `PUT /preventives/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRuleRequest {
    #[validate(length(max = 200))]
    pub section: Option<String>,
    #[validate(length(max = 200))]
    pub unit: Option<String>,
    pub task: Option<String>,
    #[validate(length(max = 100))]
    pub task_type: Option<String>,
    pub quantity: Option<i32>,
    pub frequency_hours: Option<i32>,
    pub duration_min: Option<i32>,
    pub due_date: Option<Date>,
}

/// Monthly load for the selected rules plus the per-machine breakdown.
#[derive(Debug, Serialize)]
pub struct WorkloadResponse {
    pub total: MonthlyLoad,
    pub machines: Vec<MachineLoad>,
}

/// Tasks a rule deletion applies to.
#[derive(Debug, Serialize)]
pub struct RuleDeletionPreview {
    pub count: usize,
    pub tasks: Vec<TaskWithMachine>,
}

/// Result of a rule deletion.
#[derive(Debug, Serialize)]
pub struct RuleDeletion {
    pub deleted: u64,
}

// ---------------------------------------------------------------------------
// Listing and aggregation
// ---------------------------------------------------------------------------

/// GET /preventives
pub async fn list_rules(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    Query(scope): Query<MachineScope>,
) -> AppResult<impl IntoResponse> {
    let today = today();
    let rows: Vec<RuleRow> = TaskRepo::list_preventive(&state.pool, scope.machine_id)
        .await?
        .into_iter()
        .map(|t| RuleRow::new(t, today))
        .collect();
    Ok(Json(DataResponse { data: rows }))
}

/// GET /preventives/library
///
/// Rules grouped by machine model, with the monthly load one machine of each
/// model carries.
pub async fn library(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let rules = TaskRepo::list_preventive(&state.pool, None).await?;
    Ok(Json(DataResponse {
        data: library::group_by_model(&rules),
    }))
}

/// GET /preventives/workload
pub async fn workload(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    Query(scope): Query<MachineScope>,
) -> AppResult<impl IntoResponse> {
    let rules = TaskRepo::list_preventive(&state.pool, scope.machine_id).await?;
    Ok(Json(DataResponse {
        data: workload_for(&rules),
    }))
}

pub(crate) fn workload_for(rules: &[TaskWithMachine]) -> WorkloadResponse {
    WorkloadResponse {
        total: workload::calculate_preventive_monthly_load(rules),
        machines: library::load_by_machine(rules),
    }
}

// ---------------------------------------------------------------------------
// Create / update
// ---------------------------------------------------------------------------

/// POST /preventives
///
/// Creates the rule on one machine, or with `apply_to_model` on every
/// machine sharing its model. Machines that already carry a live rule with
/// the same description and section are skipped. All inserts share one
/// transaction.
pub async fn create_rule(
    RequirePlanner(user): RequirePlanner,
    State(state): State<AppState>,
    Json(input): Json<CreateRuleRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    task_rules::validate_preventive_rule(
        &input.task,
        input.frequency_hours,
        input.duration_min,
        input.quantity,
    )?;

    let machine = MachineRepo::find_by_id(&state.pool, input.machine_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Machine",
            id: input.machine_id,
        }))?;

    let mut targets = vec![machine.id];
    if input.apply_to_model {
        let model = machine.model.as_deref().ok_or_else(|| {
            AppError::BadRequest(format!(
                "Machine '{}' has no model; cannot apply the rule to a model",
                machine.name
            ))
        })?;
        let existing: HashSet<DbId> = TaskRepo::find_rule_matches(
            &state.pool,
            &RuleSelector {
                task: input.task.clone(),
                section: input.section.clone(),
                machine_id: None,
                model: Some(model.to_string()),
            },
        )
        .await?
        .into_iter()
        .map(|t| t.machine_id)
        .collect();
        targets.retain(|id| !existing.contains(id));
        targets.extend(
            MachineRepo::list_by_model(&state.pool, model)
                .await?
                .into_iter()
                .map(|m| m.id)
                .filter(|id| *id != machine.id && !existing.contains(id)),
        );
        if targets.is_empty() {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Every '{model}' machine already carries this rule"
            ))));
        }
    }

    let due_date = input
        .due_date
        .unwrap_or_else(|| task_rules::next_due_date(today(), input.frequency_hours));

    let mut tx = state.pool.begin().await?;
    let mut created = Vec::with_capacity(targets.len());
    for machine_id in targets {
        let task = TaskRepo::create(
            &mut *tx,
            &CreateTask {
                machine_id,
                section: input.section.clone(),
                unit: input.unit.clone(),
                task: input.task.clone(),
                task_type: input.task_type.clone(),
                quantity: input.quantity,
                duration_min: Some(input.duration_min),
                frequency_hours: Some(input.frequency_hours),
                due_date: Some(due_date),
                status: None,
                is_preventive: true,
                is_planned: true,
            },
        )
        .await?;
        created.push(task);
    }
    tx.commit().await?;

    tracing::info!(
        machine_id = machine.id,
        apply_to_model = input.apply_to_model,
        created = created.len(),
        user_id = user.user_id,
        "Preventive rule created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PUT /preventives/{id}
pub async fn update_rule(
    RequirePlanner(_user): RequirePlanner,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRuleRequest>,
) -> AppResult<impl IntoResponse> {
    validate_request(&input)?;
    if let Some(task) = &input.task {
        task_rules::validate_task_text(task)?;
    }
    if let Some(hours) = input.frequency_hours {
        task_rules::validate_frequency_hours(hours)?;
    }
    if let Some(minutes) = input.duration_min {
        task_rules::validate_duration_min(minutes)?;
    }
    task_rules::validate_quantity(input.quantity)?;

    let existing = TaskRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;
    if !existing.is_preventive {
        return Err(AppError::BadRequest(format!(
            "Task {id} is not a preventive rule"
        )));
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
        status: None,
    };
    let task = TaskRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Task", id }))?;
    Ok(Json(DataResponse { data: task }))
}

// ---------------------------------------------------------------------------
// Rule deletion
// ---------------------------------------------------------------------------

/// A deletion must be scoped to a machine or a model, never every machine.
fn check_selector(selector: &RuleSelector) -> AppResult<()> {
    if selector.task.trim().is_empty() {
        return Err(AppError::BadRequest("task is required".into()));
    }
    if selector.machine_id.is_none() && selector.model.is_none() {
        return Err(AppError::BadRequest(
            "machine_id or model is required".into(),
        ));
    }
    Ok(())
}

/// POST /preventives/delete-rule/preview
///
/// Lists the tasks [`delete_rule`] would soft-delete. No writes.
pub async fn preview_rule_deletion(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(selector): Json<RuleSelector>,
) -> AppResult<impl IntoResponse> {
    check_selector(&selector)?;
    let tasks = TaskRepo::find_rule_matches(&state.pool, &selector).await?;
    Ok(Json(DataResponse {
        data: RuleDeletionPreview {
            count: tasks.len(),
            tasks,
        },
    }))
}

/// POST /preventives/delete-rule
///
/// Soft-deletes every task matched by the selector.
pub async fn delete_rule(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(selector): Json<RuleSelector>,
) -> AppResult<impl IntoResponse> {
    check_selector(&selector)?;
    let ids: Vec<DbId> = TaskRepo::find_rule_matches(&state.pool, &selector)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let deleted = TaskRepo::soft_delete_many(&state.pool, &ids).await?;

    tracing::info!(
        task = %selector.task,
        machine_id = ?selector.machine_id,
        model = ?selector.model,
        deleted,
        user_id = admin.user_id,
        "Preventive rule deleted",
    );

    Ok(Json(DataResponse {
        data: RuleDeletion { deleted },
    }))
}
