//! Human-readable formatting of task durations expressed in minutes.

/// Placeholder rendered for missing or non-positive durations.
pub const NO_DURATION: &str = "-";

/// Format a duration in minutes as `"Xh"`, `"Ym"` or `"Xh Ym"`.
///
/// Returns `"-"` for `None`, NaN and values `<= 0`. Fractional minutes are
/// rounded to the nearest whole minute.
///
/// ```
/// use cmms_core::duration::format_duration;
/// assert_eq!(format_duration(Some(90.0)), "1h 30m");
/// assert_eq!(format_duration(Some(120.0)), "2h");
/// assert_eq!(format_duration(None), "-");
/// ```
pub fn format_duration(minutes: Option<f64>) -> String {
    let Some(m) = minutes else {
        return NO_DURATION.to_string();
    };
    if m.is_nan() || m <= 0.0 {
        return NO_DURATION.to_string();
    }

    let total = m.round() as i64;
    if total == 0 {
        return NO_DURATION.to_string();
    }

    let hours = total / 60;
    let mins = total % 60;
    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Convenience wrapper for integer minute columns.
pub fn format_minutes(minutes: Option<i32>) -> String {
    format_duration(minutes.map(f64::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_invalid_renders_dash() {
        assert_eq!(format_duration(None), "-");
        assert_eq!(format_duration(Some(f64::NAN)), "-");
        assert_eq!(format_duration(Some(0.0)), "-");
        assert_eq!(format_duration(Some(-15.0)), "-");
    }

    #[test]
    fn exact_hours() {
        assert_eq!(format_duration(Some(60.0)), "1h");
        assert_eq!(format_duration(Some(180.0)), "3h");
    }

    #[test]
    fn under_an_hour() {
        assert_eq!(format_duration(Some(45.0)), "45m");
        assert_eq!(format_duration(Some(1.0)), "1m");
    }

    #[test]
    fn hours_and_minutes() {
        assert_eq!(format_duration(Some(90.0)), "1h 30m");
        assert_eq!(format_duration(Some(125.0)), "2h 5m");
    }

    #[test]
    fn fractional_minutes_round() {
        assert_eq!(format_duration(Some(128.6)), "2h 9m");
        assert_eq!(format_duration(Some(0.2)), "-");
    }

    #[test]
    fn integer_wrapper() {
        assert_eq!(format_minutes(Some(30)), "30m");
        assert_eq!(format_minutes(None), "-");
    }
}
