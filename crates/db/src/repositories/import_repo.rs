//! Writes mapped spreadsheet rows: one machine upsert per distinct name and
//! one task per row.

use cmms_core::importer::{ImportRow, ImportSummary, MachineIdCache};
use cmms_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use super::{MachineRepo, TaskRepo};
use crate::models::machine::CreateMachine;
use crate::models::task::CreateTask;

pub struct ImportRepo;

impl ImportRepo {
    /// Write rows one statement at a time, without a surrounding transaction.
    ///
    /// A failure stops the import and leaves earlier rows committed.
    pub async fn import_rows(
        pool: &PgPool,
        rows: &[ImportRow],
    ) -> Result<ImportSummary, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        let mut cache = MachineIdCache::new();
        let mut summary = ImportSummary::default();
        for row in rows {
            write_row(&mut conn, &mut cache, &mut summary, row).await?;
        }
        Ok(summary)
    }

    /// Write rows inside one transaction. Any error rolls back every row.
    pub async fn commit_rows(
        pool: &PgPool,
        rows: &[ImportRow],
    ) -> Result<ImportSummary, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut cache = MachineIdCache::new();
        let mut summary = ImportSummary::default();
        for row in rows {
            write_row(&mut tx, &mut cache, &mut summary, row).await?;
        }
        tx.commit().await?;
        Ok(summary)
    }
}

async fn machine_id(
    conn: &mut PgConnection,
    cache: &mut MachineIdCache,
    summary: &mut ImportSummary,
    row: &ImportRow,
) -> Result<DbId, sqlx::Error> {
    if let Some(id) = cache.get(&row.machine_name) {
        return Ok(id);
    }
    let input = CreateMachine {
        name: row.machine_name.clone(),
        model: row.model.clone(),
        serial: row.serial.clone(),
        line: row.line.clone(),
    };
    let upsert = MachineRepo::upsert_by_name(&mut *conn, &input).await?;
    if upsert.inserted {
        summary.machines_created += 1;
    } else {
        summary.machines_reused += 1;
    }
    cache.insert(&row.machine_name, upsert.id);
    Ok(upsert.id)
}

async fn write_row(
    conn: &mut PgConnection,
    cache: &mut MachineIdCache,
    summary: &mut ImportSummary,
    row: &ImportRow,
) -> Result<(), sqlx::Error> {
    summary.rows_read += 1;
    let machine_id = machine_id(conn, cache, summary, row).await?;
    let input = CreateTask {
        machine_id,
        section: row.section.clone(),
        unit: row.unit.clone(),
        task: row.task.clone(),
        task_type: row.task_type.clone(),
        quantity: row.quantity,
        duration_min: row.duration_min,
        frequency_hours: row.frequency_hours,
        due_date: row.due_date,
        status: Some(row.status.clone()),
        is_preventive: row.is_preventive(),
        is_planned: true,
    };
    TaskRepo::create(&mut *conn, &input).await?;
    summary.tasks_inserted += 1;
    Ok(())
}
