//! Machine (asset) entity model and DTOs.

use cmms_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `machines` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Machine {
    pub id: DbId,
    pub name: String,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub line: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating (upserting) a machine by its unique name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateMachine {
    pub name: String,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub line: Option<String>,
}

/// DTO for updating a machine. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMachine {
    pub name: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub line: Option<String>,
}

/// Result of an upsert: the machine id and whether the row was new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct MachineUpsert {
    pub id: DbId,
    pub inserted: bool,
}
