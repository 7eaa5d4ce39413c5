//! Due-date bucketing for task lists.
//!
//! The bucket is derived from `due_date`, `status` and the caller-supplied
//! `today`; it is never stored.

use serde::{Deserialize, Serialize};

use crate::task::STATUS_DONE;
use crate::types::Date;

/// Number of days ahead (inclusive) that counts as "due soon".
pub const SOON_WINDOW_DAYS: i64 = 7;

/// Display bucket for a task's due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    Overdue,
    Today,
    Soon,
    Ok,
    Unknown,
}

impl DueState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Today => "today",
            Self::Soon => "soon",
            Self::Ok => "ok",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "overdue" => Some(Self::Overdue),
            "today" => Some(Self::Today),
            "soon" => Some(Self::Soon),
            "ok" => Some(Self::Ok),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Whether the task needs attention now (overdue or due today).
    pub fn is_urgent(self) -> bool {
        matches!(self, Self::Overdue | Self::Today)
    }
}

impl std::fmt::Display for DueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a task's due date relative to `today`.
///
/// - No due date: `Unknown`.
/// - Status `Done`: `Ok`, whatever the date.
/// - Past: `Overdue`; same day: `Today`; within 7 days: `Soon`; later: `Ok`.
pub fn classify(due_date: Option<Date>, status: &str, today: Date) -> DueState {
    let Some(due) = due_date else {
        return DueState::Unknown;
    };
    if status == STATUS_DONE {
        return DueState::Ok;
    }

    let days_ahead = (due - today).num_days();
    if days_ahead < 0 {
        DueState::Overdue
    } else if days_ahead == 0 {
        DueState::Today
    } else if days_ahead <= SOON_WINDOW_DAYS {
        DueState::Soon
    } else {
        DueState::Ok
    }
}
