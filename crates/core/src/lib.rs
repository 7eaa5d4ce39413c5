//! Pure domain logic for the maintenance management service.
//!
//! Nothing in this crate touches the database or performs I/O. Handlers and
//! repositories fetch rows, then pass them explicitly into these functions.

pub mod due_state;
pub mod duration;
pub mod error;
pub mod importer;
pub mod kpi;
pub mod library;
pub mod report;
pub mod roles;
pub mod task;
pub mod task_filter;
pub mod types;
pub mod workload;
