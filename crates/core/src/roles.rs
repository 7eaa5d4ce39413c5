//! Well-known role name constants.
//!
//! These must match the seed data in `20250101000004_create_roles_and_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PLANNER: &str = "planner";
pub const ROLE_TECHNICIAN: &str = "technician";

/// Roles allowed to create and edit tasks and preventive rules.
pub fn can_plan(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_PLANNER
}

/// Roles allowed to record task executions.
pub fn can_execute(role: &str) -> bool {
    matches!(role, ROLE_ADMIN | ROLE_PLANNER | ROLE_TECHNICIAN)
}
