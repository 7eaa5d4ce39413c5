//! Task kinds, status names, and validation for task and preventive-rule input.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Date;

// ---------------------------------------------------------------------------
// Status names
// ---------------------------------------------------------------------------

/// Default status for new tasks.
pub const STATUS_PLANNED: &str = "Planned";
/// Status for completed non-recurring tasks.
pub const STATUS_DONE: &str = "Done";
/// Status for work that has started but not finished.
pub const STATUS_IN_PROGRESS: &str = "In progress";

/// Maximum length of any free-text status value.
pub const MAX_STATUS_LEN: usize = 40;

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Upper bound for a rule's recurrence interval (ten years, in hours).
pub const MAX_FREQUENCY_HOURS: i32 = 24 * 365 * 10;

/// Upper bound for a single task's estimated duration (one week, in minutes).
pub const MAX_DURATION_MIN: i32 = 60 * 24 * 7;

/// Maximum length of the free-text task description.
pub const MAX_TASK_TEXT_LEN: usize = 2000;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// How a task came to exist and whether it recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Recurring task generated from a frequency (hours) and duration.
    Preventive,
    /// One-off task with a due date.
    Planned,
    /// Corrective / breakdown work (`is_planned = false`).
    Unplanned,
}

impl TaskKind {
    /// Derive the kind from the persisted flags.
    ///
    /// A row only counts as preventive when it is flagged so *and* carries a
    /// positive recurrence interval.
    pub fn from_flags(is_preventive: bool, is_planned: bool, frequency_hours: Option<i32>) -> Self {
        if !is_planned {
            Self::Unplanned
        } else if is_preventive && frequency_hours.is_some_and(|h| h > 0) {
            Self::Preventive
        } else {
            Self::Planned
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preventive => "preventive",
            Self::Planned => "planned",
            Self::Unplanned => "unplanned",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "preventive" => Some(Self::Preventive),
            "planned" => Some(Self::Planned),
            "unplanned" => Some(Self::Unplanned),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a free-text task description.
pub fn validate_task_text(task: &str) -> Result<(), CoreError> {
    let trimmed = task.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Task description is required".into()));
    }
    if trimmed.len() > MAX_TASK_TEXT_LEN {
        return Err(CoreError::Validation(format!(
            "Task description must be at most {MAX_TASK_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a preventive rule's recurrence interval.
pub fn validate_frequency_hours(hours: i32) -> Result<(), CoreError> {
    if hours <= 0 || hours > MAX_FREQUENCY_HOURS {
        return Err(CoreError::Validation(format!(
            "frequency_hours must be between 1 and {MAX_FREQUENCY_HOURS}, got {hours}"
        )));
    }
    Ok(())
}

/// Validate an estimated duration in minutes.
pub fn validate_duration_min(minutes: i32) -> Result<(), CoreError> {
    if minutes <= 0 || minutes > MAX_DURATION_MIN {
        return Err(CoreError::Validation(format!(
            "duration_min must be between 1 and {MAX_DURATION_MIN}, got {minutes}"
        )));
    }
    Ok(())
}

/// Validate an optional quantity (must be positive when present).
pub fn validate_quantity(quantity: Option<i32>) -> Result<(), CoreError> {
    match quantity {
        Some(q) if q <= 0 => Err(CoreError::Validation(format!(
            "quantity must be positive, got {q}"
        ))),
        _ => Ok(()),
    }
}

/// Validate a status value.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    let trimmed = status.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_STATUS_LEN {
        return Err(CoreError::Validation(format!(
            "status must be 1 to {MAX_STATUS_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate the full set of fields that define a preventive rule.
pub fn validate_preventive_rule(
    task: &str,
    frequency_hours: i32,
    duration_min: i32,
    quantity: Option<i32>,
) -> Result<(), CoreError> {
    validate_task_text(task)?;
    validate_frequency_hours(frequency_hours)?;
    validate_duration_min(duration_min)?;
    validate_quantity(quantity)
}

// ---------------------------------------------------------------------------
// Rescheduling
// ---------------------------------------------------------------------------

/// Next due date for a preventive task completed on `executed_on`.
///
/// The interval is converted to whole days, rounding up, with a minimum of
/// one day so that sub-daily rules still move forward.
pub fn next_due_date(executed_on: Date, frequency_hours: i32) -> Date {
    let days = ((frequency_hours.max(1) as i64) + 23) / 24;
    executed_on + chrono::Duration::days(days.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_requires_positive_frequency_for_preventive() {
        assert_eq!(
            TaskKind::from_flags(true, true, Some(168)),
            TaskKind::Preventive
        );
        assert_eq!(TaskKind::from_flags(true, true, Some(0)), TaskKind::Planned);
        assert_eq!(TaskKind::from_flags(true, true, None), TaskKind::Planned);
    }

    #[test]
    fn unplanned_wins_over_preventive_flag() {
        assert_eq!(
            TaskKind::from_flags(true, false, Some(168)),
            TaskKind::Unplanned
        );
        assert_eq!(TaskKind::from_flags(false, false, None), TaskKind::Unplanned);
    }

    #[test]
    fn rule_validation_rejects_bad_values() {
        assert!(validate_preventive_rule("Grease bearings", 168, 30, Some(1)).is_ok());
        assert!(validate_preventive_rule("  ", 168, 30, None).is_err());
        assert!(validate_preventive_rule("Grease", 0, 30, None).is_err());
        assert!(validate_preventive_rule("Grease", 168, 0, None).is_err());
        assert!(validate_preventive_rule("Grease", 168, 30, Some(0)).is_err());
        assert!(validate_preventive_rule("Grease", MAX_FREQUENCY_HOURS + 1, 30, None).is_err());
    }

    #[test]
    fn status_validation() {
        assert!(validate_status(STATUS_DONE).is_ok());
        assert!(validate_status("").is_err());
        assert!(validate_status(&"x".repeat(MAX_STATUS_LEN + 1)).is_err());
    }

    #[test]
    fn next_due_rounds_up_to_whole_days() {
        let d = Date::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(next_due_date(d, 168), Date::from_ymd_opt(2024, 1, 8).unwrap());
        assert_eq!(next_due_date(d, 30), Date::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(next_due_date(d, 8), Date::from_ymd_opt(2024, 1, 2).unwrap());
    }
}
