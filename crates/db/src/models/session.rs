//! Refresh-token sessions. Only the SHA-256 of a refresh token is stored.

use cmms_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    pub expires_at: Timestamp,
}
