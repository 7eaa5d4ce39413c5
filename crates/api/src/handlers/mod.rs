pub mod auth;
pub mod executions;
pub mod import;
pub mod kpis;
pub mod machines;
pub mod preventives;
pub mod reports;
pub mod snapshot;
pub mod tasks;

/// The current UTC calendar date, used for due-state classification.
pub(crate) fn today() -> cmms_core::types::Date {
    chrono::Utc::now().date_naive()
}
