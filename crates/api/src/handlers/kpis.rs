//! KPI handlers. Rows are fetched per request and passed to the pure
//! aggregations in `cmms_core::kpi`.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use cmms_core::kpi::{self, Breakdowns, Compliance, GroupCount, TaskSummary};
use cmms_core::types::Date;
use cmms_db::models::execution::Execution;
use cmms_db::repositories::{ExecutionRepo, TaskRepo};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::executions::check_range;
use super::preventives::{workload_for, WorkloadResponse};
use super::today;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Optional inclusive execution date range.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct KpiRange {
    pub from: Option<Date>,
    pub to: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct ComplianceResponse {
    #[serde(flatten)]
    pub compliance: Compliance,
    pub by_technician: Vec<GroupCount>,
}

/// One dashboard section: its data, or the error that prevented it.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Data { data: T },
    Error { error: String },
}

impl<T> Section<T> {
    fn from_result(name: &'static str, result: AppResult<T>) -> Self {
        match result {
            Ok(data) => Section::Data { data },
            Err(e) => {
                tracing::error!(section = name, error = %e, "Dashboard section failed");
                Section::Error {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub summary: Section<TaskSummary>,
    pub compliance: Section<ComplianceResponse>,
    pub breakdowns: Section<Breakdowns>,
    pub workload: Section<WorkloadResponse>,
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

async fn load_summary(pool: &PgPool, today: Date) -> AppResult<TaskSummary> {
    let tasks = TaskRepo::list_with_machine(pool).await?;
    Ok(kpi::summarize_tasks(&tasks, today))
}

async fn load_executions(pool: &PgPool, range: KpiRange) -> AppResult<Vec<Execution>> {
    Ok(ExecutionRepo::list_between(pool, range.from, range.to).await?)
}

async fn load_compliance(pool: &PgPool, range: KpiRange) -> AppResult<ComplianceResponse> {
    let executions = load_executions(pool, range).await?;
    let refs: Vec<&Execution> = executions.iter().collect();
    Ok(ComplianceResponse {
        compliance: kpi::compliance(&refs),
        by_technician: kpi::by_technician(&refs),
    })
}

async fn load_breakdowns(pool: &PgPool, range: KpiRange) -> AppResult<Breakdowns> {
    let executions = load_executions(pool, range).await?;
    let refs: Vec<&Execution> = executions.iter().collect();
    Ok(kpi::breakdowns(&refs))
}

async fn load_workload(pool: &PgPool) -> AppResult<WorkloadResponse> {
    let rules = TaskRepo::list_preventive(pool, None).await?;
    Ok(workload_for(&rules))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /kpis/summary
pub async fn summary(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let data = load_summary(&state.pool, today()).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /kpis/compliance
pub async fn compliance(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    Query(range): Query<KpiRange>,
) -> AppResult<impl IntoResponse> {
    check_range(range.from, range.to)?;
    let data = load_compliance(&state.pool, range).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /kpis/breakdowns
pub async fn breakdowns(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    Query(range): Query<KpiRange>,
) -> AppResult<impl IntoResponse> {
    check_range(range.from, range.to)?;
    let data = load_breakdowns(&state.pool, range).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /kpis/workload
pub async fn workload(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let data = load_workload(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /kpis/dashboard
///
/// Runs every KPI concurrently. A failing section carries an `error` entry
/// while the others still return their `data`.
pub async fn dashboard(
    RequireAuth(_auth): RequireAuth,
    State(state): State<AppState>,
    Query(range): Query<KpiRange>,
) -> AppResult<impl IntoResponse> {
    check_range(range.from, range.to)?;
    let pool = &state.pool;
    let (summary, compliance, breakdowns, workload) = tokio::join!(
        load_summary(pool, today()),
        load_compliance(pool, range),
        load_breakdowns(pool, range),
        load_workload(pool),
    );

    Ok(Json(DataResponse {
        data: Dashboard {
            summary: Section::from_result("summary", summary),
            compliance: Section::from_result("compliance", compliance),
            breakdowns: Section::from_result("breakdowns", breakdowns),
            workload: Section::from_result("workload", workload),
        },
    }))
}
