//! Role-based access control extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cmms_core::error::CoreError;
use cmms_core::roles::{can_execute, can_plan, ROLE_ADMIN};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

fn forbidden(msg: &str) -> AppError {
    AppError::Core(CoreError::Forbidden(msg.into()))
}

/// Requires the `admin` role. Rejects with 403 Forbidden otherwise.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(forbidden("Admin role required"));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires `planner` or `admin`. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn edit_rule(RequirePlanner(user): RequirePlanner) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequirePlanner(pub AuthUser);

impl FromRequestParts<AppState> for RequirePlanner {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !can_plan(&user.role) {
            return Err(forbidden("Planner or Admin role required"));
        }
        Ok(RequirePlanner(user))
    }
}

/// Requires a role allowed to record executions.
pub struct RequireTechnician(pub AuthUser);

impl FromRequestParts<AppState> for RequireTechnician {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !can_execute(&user.role) {
            return Err(forbidden("Technician, Planner or Admin role required"));
        }
        Ok(RequireTechnician(user))
    }
}

/// Requires any authenticated user.
///
/// Functionally equivalent to [`AuthUser`] but named explicitly for routes
/// where the intent "this route requires authentication" should read clearly.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
