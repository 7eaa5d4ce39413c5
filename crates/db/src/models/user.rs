//! User accounts. Rows are always read joined with `roles`, so a [`User`]
//! carries its role name rather than the foreign key.

use cmms_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A user account with its resolved role name.
///
/// Holds the password hash; handlers answer with [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<Timestamp>,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl User {
    /// Whether a lockout is still running at `now`.
    pub fn is_locked(&self, now: Timestamp) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub role: String,
    pub last_login_at: Option<Timestamp>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            last_login_at: user.last_login_at,
        }
    }
}

/// Input for a new account. `role` is a role name, resolved on insert.
#[derive(Debug)]
pub struct CreateUser {
    pub username: String,
    pub password_hash: String,
    pub role: String,
}
