//! Repository for the `machines` table.

use std::collections::HashSet;

use cmms_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::machine::{CreateMachine, Machine, MachineUpsert, UpdateMachine};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, model, serial, line, created_at, updated_at";

/// Provides CRUD operations for machines.
pub struct MachineRepo;

impl MachineRepo {
    /// Insert a machine or, when the name already exists, fill in any
    /// attributes that were previously missing. Returns the id either way.
    ///
    /// Accepts any executor so imports can run it inside a transaction.
    pub async fn upsert_by_name<'e, E>(
        executor: E,
        input: &CreateMachine,
    ) -> Result<MachineUpsert, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, MachineUpsert>(
            "INSERT INTO machines (name, model, serial, line)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (name) DO UPDATE SET
                model = COALESCE(machines.model, EXCLUDED.model),
                serial = COALESCE(machines.serial, EXCLUDED.serial),
                line = COALESCE(machines.line, EXCLUDED.line)
             RETURNING id, (xmax = 0) AS inserted",
        )
        .bind(input.name.trim())
        .bind(&input.model)
        .bind(&input.serial)
        .bind(&input.line)
        .fetch_one(executor)
        .await
    }

    /// Find a machine by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Machine>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM machines WHERE id = $1");
        sqlx::query_as::<_, Machine>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all machines in ascending id order.
    pub async fn list(pool: &PgPool) -> Result<Vec<Machine>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM machines ORDER BY id");
        sqlx::query_as::<_, Machine>(&query).fetch_all(pool).await
    }

    /// List machines sharing a model, in ascending id order.
    pub async fn list_by_model(pool: &PgPool, model: &str) -> Result<Vec<Machine>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM machines WHERE model = $1 ORDER BY id");
        sqlx::query_as::<_, Machine>(&query)
            .bind(model)
            .fetch_all(pool)
            .await
    }

    /// Every registered machine name.
    pub async fn names(pool: &PgPool) -> Result<HashSet<String>, sqlx::Error> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM machines")
            .fetch_all(pool)
            .await?;
        Ok(names.into_iter().collect())
    }

    /// Update a machine. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMachine,
    ) -> Result<Option<Machine>, sqlx::Error> {
        let query = format!(
            "UPDATE machines SET
                name = COALESCE($2, name),
                model = COALESCE($3, model),
                serial = COALESCE($4, serial),
                line = COALESCE($5, line)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Machine>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.model)
            .bind(&input.serial)
            .bind(&input.line)
            .fetch_optional(pool)
            .await
    }
}
