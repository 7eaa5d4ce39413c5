//! Repository for the `tasks` table.

use cmms_core::task::{self as task_rules, TaskKind, STATUS_DONE, STATUS_PLANNED};
use cmms_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use super::ExecutionRepo;
use crate::models::execution::{CompleteTask, Completion, CreateExecution};
use crate::models::task::{CreateTask, RuleSelector, Task, TaskWithMachine, UpdateTask};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, machine_id, section, unit, task, task_type, quantity, \
                       duration_min, frequency_hours, due_date, status, is_preventive, \
                       is_planned, deleted_at, created_at, updated_at";

/// Select list for [`TaskWithMachine`]; expects `tasks t JOIN machines m`.
const JOINED_COLUMNS: &str = "t.id, t.machine_id, m.name AS machine_name, m.model, m.serial, \
                              m.line, t.section, t.unit, t.task, t.task_type, t.quantity, \
                              t.duration_min, t.frequency_hours, t.due_date, t.status, \
                              t.is_preventive, t.is_planned, t.created_at, t.updated_at";

/// Provides CRUD operations for tasks and preventive rules.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a new task, returning the created row.
    pub async fn create<'e, E>(executor: E, input: &CreateTask) -> Result<Task, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO tasks
                (machine_id, section, unit, task, task_type, quantity, duration_min,
                 frequency_hours, due_date, status, is_preventive, is_planned)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.machine_id)
            .bind(&input.section)
            .bind(&input.unit)
            .bind(input.task.trim())
            .bind(&input.task_type)
            .bind(input.quantity)
            .bind(input.duration_min)
            .bind(input.frequency_hours)
            .bind(input.due_date)
            .bind(input.status.as_deref().unwrap_or(STATUS_PLANNED))
            .bind(input.is_preventive)
            .bind(input.is_planned)
            .fetch_one(executor)
            .await
    }

    /// Find a live task by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live task joined with its machine.
    pub async fn find_with_machine(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TaskWithMachine>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM tasks t JOIN machines m ON m.id = t.machine_id
             WHERE t.id = $1 AND t.deleted_at IS NULL"
        );
        sqlx::query_as::<_, TaskWithMachine>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All live tasks joined with their machines, ascending id order.
    pub async fn list_with_machine(pool: &PgPool) -> Result<Vec<TaskWithMachine>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM tasks t JOIN machines m ON m.id = t.machine_id
             WHERE t.deleted_at IS NULL
             ORDER BY t.id"
        );
        sqlx::query_as::<_, TaskWithMachine>(&query)
            .fetch_all(pool)
            .await
    }

    /// Live preventive rules, optionally limited to one machine.
    pub async fn list_preventive(
        pool: &PgPool,
        machine_id: Option<DbId>,
    ) -> Result<Vec<TaskWithMachine>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM tasks t JOIN machines m ON m.id = t.machine_id
             WHERE t.deleted_at IS NULL
               AND t.is_preventive
               AND t.frequency_hours > 0
               AND ($1::BIGINT IS NULL OR t.machine_id = $1)
             ORDER BY m.model NULLS LAST, m.name, t.frequency_hours, t.id"
        );
        sqlx::query_as::<_, TaskWithMachine>(&query)
            .bind(machine_id)
            .fetch_all(pool)
            .await
    }

    /// Live preventive tasks matched by a rule selector.
    ///
    /// Matches on task description (and section when given), scoped to one
    /// machine, to every machine of a model, or both when both are set.
    pub async fn find_rule_matches(
        pool: &PgPool,
        selector: &RuleSelector,
    ) -> Result<Vec<TaskWithMachine>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM tasks t JOIN machines m ON m.id = t.machine_id
             WHERE t.deleted_at IS NULL
               AND t.is_preventive
               AND t.task = $1
               AND ($2::TEXT IS NULL OR t.section = $2)
               AND ($3::BIGINT IS NULL OR t.machine_id = $3)
               AND ($4::TEXT IS NULL OR m.model = $4)
             ORDER BY t.id"
        );
        sqlx::query_as::<_, TaskWithMachine>(&query)
            .bind(selector.task.trim())
            .bind(&selector.section)
            .bind(selector.machine_id)
            .bind(&selector.model)
            .fetch_all(pool)
            .await
    }

    /// Update a task. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no live row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTask,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                section = COALESCE($2, section),
                unit = COALESCE($3, unit),
                task = COALESCE($4, task),
                task_type = COALESCE($5, task_type),
                quantity = COALESCE($6, quantity),
                duration_min = COALESCE($7, duration_min),
                frequency_hours = COALESCE($8, frequency_hours),
                due_date = COALESCE($9, due_date),
                status = COALESCE($10, status)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(&input.section)
            .bind(&input.unit)
            .bind(input.task.as_deref().map(str::trim))
            .bind(&input.task_type)
            .bind(input.quantity)
            .bind(input.duration_min)
            .bind(input.frequency_hours)
            .bind(input.due_date)
            .bind(&input.status)
            .fetch_optional(pool)
            .await
    }

    /// Set a task's status. Returns `None` if no live row matches.
    pub async fn update_status<'e, E>(
        executor: E,
        id: DbId,
        status: &str,
    ) -> Result<Option<Task>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE tasks SET status = $2 WHERE id = $1 AND deleted_at IS NULL RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(status.trim())
            .fetch_optional(executor)
            .await
    }

    /// Record an execution of `task` and advance it, in one transaction.
    ///
    /// Preventive tasks are rescheduled `frequency_hours` after the execution
    /// date and return to `Planned`; every other kind is marked `Done`.
    /// Returns `None` if the task was deleted concurrently.
    pub async fn complete(
        pool: &PgPool,
        task: &TaskWithMachine,
        input: &CompleteTask,
    ) -> Result<Option<Completion>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let execution = ExecutionRepo::create(
            &mut *tx,
            &CreateExecution {
                task_id: Some(task.id),
                executed_at: input.executed_at,
                executed_by: input.executed_by.clone(),
                line: task.line.clone(),
                machine_name: task.machine_name.clone(),
                section: task.section.clone(),
                unit: task.unit.clone(),
                task: task.task.clone(),
                is_planned: task.is_planned,
                duration_min: input.duration_min.or(task.duration_min),
                notes: input.notes.clone(),
            },
        )
        .await?;

        let kind = TaskKind::from_flags(task.is_preventive, task.is_planned, task.frequency_hours);
        let updated = match (kind, task.frequency_hours) {
            (TaskKind::Preventive, Some(hours)) => {
                let next = task_rules::next_due_date(input.executed_at.date_naive(), hours);
                let query = format!(
                    "UPDATE tasks SET due_date = $2, status = $3
                     WHERE id = $1 AND deleted_at IS NULL
                     RETURNING {COLUMNS}"
                );
                sqlx::query_as::<_, Task>(&query)
                    .bind(task.id)
                    .bind(next)
                    .bind(STATUS_PLANNED)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            _ => Self::update_status(&mut *tx, task.id, STATUS_DONE).await?,
        };

        let Some(updated) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };
        tx.commit().await?;
        Ok(Some(Completion {
            execution,
            task: updated,
        }))
    }

    /// Soft-delete a task. Returns `true` if a live row was marked.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE tasks SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a batch of tasks. Returns the number of rows marked.
    pub async fn soft_delete_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = NOW() WHERE id = ANY($1) AND deleted_at IS NULL",
        )
        .bind(ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Every task row, including soft-deleted ones, for export.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks ORDER BY id");
        sqlx::query_as::<_, Task>(&query).fetch_all(pool).await
    }
}
