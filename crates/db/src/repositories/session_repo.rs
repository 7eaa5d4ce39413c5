//! Refresh-token sessions. Tokens are single use: redeeming one revokes it
//! in the same statement that reads it.

use cmms_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::session::Session;

pub struct SessionRepo;

impl SessionRepo {
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        refresh_token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<Session, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            "INSERT INTO sessions (user_id, refresh_token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, expires_at",
        )
        .bind(user_id)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .fetch_one(pool)
        .await
    }

    /// Revoke and return the live session holding `refresh_token_hash`.
    ///
    /// Returns `None` for unknown, expired or already redeemed tokens, so two
    /// concurrent refreshes with the same token cannot both succeed.
    pub async fn redeem(
        pool: &PgPool,
        refresh_token_hash: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            "UPDATE sessions SET is_revoked = true
             WHERE refresh_token_hash = $1 AND NOT is_revoked AND expires_at > NOW()
             RETURNING id, user_id, expires_at",
        )
        .bind(refresh_token_hash)
        .fetch_optional(pool)
        .await
    }

    /// Revoke every live session of a user. Returns how many were revoked.
    pub async fn revoke_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("UPDATE sessions SET is_revoked = true WHERE user_id = $1 AND NOT is_revoked")
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
