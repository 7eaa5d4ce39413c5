//! Whole-database export.

use chrono::Utc;
use sqlx::PgPool;

use super::{ExecutionRepo, MachineRepo, TaskRepo};
use crate::models::snapshot::Snapshot;

pub struct SnapshotRepo;

impl SnapshotRepo {
    /// Read every machine, task and execution.
    pub async fn export(pool: &PgPool) -> Result<Snapshot, sqlx::Error> {
        let machines = MachineRepo::list(pool).await?;
        let tasks = TaskRepo::list_all(pool).await?;
        let executions = ExecutionRepo::list_all(pool).await?;
        Ok(Snapshot {
            exported_at: Utc::now(),
            machines,
            tasks,
            executions,
        })
    }
}
