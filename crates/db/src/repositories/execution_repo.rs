//! Repository for the `executions` table.

use cmms_core::types::Date;
use sqlx::{PgExecutor, PgPool};

use crate::models::execution::{CreateExecution, Execution};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, task_id, executed_at, executed_by, line, machine_name, section, \
                       unit, task, is_planned, duration_min, notes, created_at";

/// Provides insert and query operations for execution history.
pub struct ExecutionRepo;

impl ExecutionRepo {
    /// Insert an execution record, returning the created row.
    pub async fn create<'e, E>(executor: E, input: &CreateExecution) -> Result<Execution, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO executions
                (task_id, executed_at, executed_by, line, machine_name, section, unit,
                 task, is_planned, duration_min, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Execution>(&query)
            .bind(input.task_id)
            .bind(input.executed_at)
            .bind(input.executed_by.trim())
            .bind(&input.line)
            .bind(&input.machine_name)
            .bind(&input.section)
            .bind(&input.unit)
            .bind(&input.task)
            .bind(input.is_planned)
            .bind(input.duration_min)
            .bind(&input.notes)
            .fetch_one(executor)
            .await
    }

    /// Executions whose date falls in the inclusive range, newest first.
    /// Either bound may be omitted.
    pub async fn list_between(
        pool: &PgPool,
        from: Option<Date>,
        to: Option<Date>,
    ) -> Result<Vec<Execution>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM executions
             WHERE ($1::DATE IS NULL OR executed_at::DATE >= $1)
               AND ($2::DATE IS NULL OR executed_at::DATE <= $2)
             ORDER BY executed_at DESC, id DESC"
        );
        sqlx::query_as::<_, Execution>(&query)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }

    /// Every execution, oldest first, for export.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Execution>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM executions ORDER BY id");
        sqlx::query_as::<_, Execution>(&query).fetch_all(pool).await
    }
}
