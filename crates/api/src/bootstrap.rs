//! Seeds the first admin account into an empty database.

use cmms_core::error::CoreError;
use cmms_core::roles::ROLE_ADMIN;
use cmms_db::models::user::CreateUser;
use cmms_db::repositories::UserRepo;
use sqlx::PgPool;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::config::ServerConfig;
use crate::error::{AppError, AppResult};

/// Create the configured bootstrap admin when the `users` table is empty.
///
/// Returns `true` when a user was created. Does nothing when users already
/// exist or no bootstrap credentials are configured.
pub async fn ensure_admin(pool: &PgPool, config: &ServerConfig) -> AppResult<bool> {
    let Some(admin) = &config.bootstrap_admin else {
        return Ok(false);
    };
    if UserRepo::count(pool).await? > 0 {
        return Ok(false);
    }

    validate_password_strength(&admin.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: admin.username.clone(),
            password_hash,
            role: ROLE_ADMIN.to_string(),
        },
    )
    .await?
    .ok_or_else(|| AppError::InternalError("admin role is not seeded".into()))?;
    tracing::info!(user_id = user.id, username = %user.username, "Bootstrap admin created");
    Ok(true)
}
