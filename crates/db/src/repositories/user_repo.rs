//! User accounts and login bookkeeping.

use cmms_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Account columns joined with the role name. Expects aliases `u` and `r`.
const JOINED_COLUMNS: &str = "u.id, u.username, u.password_hash, r.name AS role, u.is_active, \
                              u.last_login_at, u.failed_login_count, u.locked_until, u.created_at";

pub struct UserRepo;

impl UserRepo {
    /// Insert an account with the role named in `input`.
    ///
    /// Returns `None` when no role has that name.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "WITH u AS (
                INSERT INTO users (username, password_hash, role_id)
                SELECT $1, $2, id FROM roles WHERE name = $3
                RETURNING *
             )
             SELECT {JOINED_COLUMNS} FROM u JOIN roles r ON r.id = u.role_id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.password_hash)
            .bind(&input.role)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id
             WHERE u.id = $1"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Exact, case-sensitive username match.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id
             WHERE u.username = $1"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    /// Seeded role names in id order.
    pub async fn role_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM roles ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Count a failed password check. Once the counter reaches
    /// `max_attempts` the account is locked until `lock_until`.
    ///
    /// Returns the new failure count.
    pub async fn record_failed_login(
        pool: &PgPool,
        id: DbId,
        max_attempts: i32,
        lock_until: Timestamp,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE users SET
                failed_login_count = failed_login_count + 1,
                locked_until = CASE
                    WHEN failed_login_count + 1 >= $2 THEN $3
                    ELSE locked_until
                END
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .bind(max_attempts)
        .bind(lock_until)
        .fetch_one(pool)
        .await
    }

    /// Reset the failure counter and lock, and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET failed_login_count = 0, locked_until = NULL, last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
