//! Preventive-rule workload estimation and frequency bucketing.
//!
//! Monthly load assumes a 30-day month: a rule running every `f` hours
//! occurs `(24 * 30) / f` times per month.

use serde::{Deserialize, Serialize};

/// Hours in the nominal 30-day month used for load estimates.
pub const HOURS_PER_MONTH: f64 = 24.0 * 30.0;

/// Monthly load below this many hours is `ok`.
pub const HEAVY_THRESHOLD_HOURS: f64 = 8.0;
/// Monthly load at or above this many hours is `overload`.
pub const OVERLOAD_THRESHOLD_HOURS: f64 = 20.0;

/// Upper bounds (exclusive, hours) of the frequency buckets.
pub const BIWEEKLY_MAX_HOURS: i32 = 720;
pub const MONTHLY_MAX_HOURS: i32 = 1440;
pub const BIMONTHLY_MAX_HOURS: i32 = 2160;
pub const QUARTERLY_MAX_HOURS: i32 = 4320;

// ---------------------------------------------------------------------------
// Rule facts
// ---------------------------------------------------------------------------

/// The two numbers a workload estimate needs from a preventive rule.
pub trait RuleFacts {
    fn frequency_hours(&self) -> Option<i32>;
    fn duration_min(&self) -> Option<i32>;
}

/// Minimal owned rule, used by callers that only have the numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleLoad {
    pub frequency_hours: i32,
    pub duration_min: i32,
}

impl RuleFacts for RuleLoad {
    fn frequency_hours(&self) -> Option<i32> {
        Some(self.frequency_hours)
    }

    fn duration_min(&self) -> Option<i32> {
        Some(self.duration_min)
    }
}

// ---------------------------------------------------------------------------
// Workload status
// ---------------------------------------------------------------------------

/// Classification of aggregate monthly preventive minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadStatus {
    Ok,
    Heavy,
    Overload,
}

impl WorkloadStatus {
    pub fn from_hours(hours: f64) -> Self {
        if hours >= OVERLOAD_THRESHOLD_HOURS {
            Self::Overload
        } else if hours >= HEAVY_THRESHOLD_HOURS {
            Self::Heavy
        } else {
            Self::Ok
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Heavy => "heavy",
            Self::Overload => "overload",
        }
    }
}

/// Aggregate monthly load for a set of preventive rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyLoad {
    pub rule_count: usize,
    pub runs_per_month: f64,
    pub minutes: f64,
    pub hours: f64,
    pub status: WorkloadStatus,
}

/// Occurrences per month for a rule recurring every `frequency_hours`.
///
/// Non-positive intervals contribute nothing.
pub fn runs_per_month(frequency_hours: i32) -> f64 {
    if frequency_hours <= 0 {
        return 0.0;
    }
    HOURS_PER_MONTH / frequency_hours as f64
}

/// Sum monthly occurrences and minutes across `rules` and classify the total.
pub fn calculate_preventive_monthly_load<R: RuleFacts>(rules: &[R]) -> MonthlyLoad {
    let mut runs_total = 0.0;
    let mut minutes = 0.0;
    for rule in rules {
        let runs = runs_per_month(rule.frequency_hours().unwrap_or(0));
        let duration = rule.duration_min().unwrap_or(0).max(0) as f64;
        runs_total += runs;
        minutes += runs * duration;
    }
    let hours = minutes / 60.0;
    MonthlyLoad {
        rule_count: rules.len(),
        runs_per_month: runs_total,
        minutes,
        hours,
        status: WorkloadStatus::from_hours(hours),
    }
}

// ---------------------------------------------------------------------------
// Frequency buckets
// ---------------------------------------------------------------------------

/// Display bucket for a rule's recurrence interval. Ordered from most to
/// least frequent so buckets sort naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyBucket {
    Biweekly,
    Monthly,
    Bimonthly,
    Quarterly,
    Annual,
}

impl FrequencyBucket {
    pub fn classify(frequency_hours: i32) -> Self {
        if frequency_hours < BIWEEKLY_MAX_HOURS {
            Self::Biweekly
        } else if frequency_hours < MONTHLY_MAX_HOURS {
            Self::Monthly
        } else if frequency_hours < BIMONTHLY_MAX_HOURS {
            Self::Bimonthly
        } else if frequency_hours < QUARTERLY_MAX_HOURS {
            Self::Quarterly
        } else {
            Self::Annual
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Bimonthly => "bimonthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }
}
