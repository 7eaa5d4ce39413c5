//! Spreadsheet row mapping for the machine/task importer.
//!
//! The spreadsheet reader (in the API crate) turns each sheet row into a
//! [`RawRow`] keyed by normalized header name. This module maps those raw
//! rows to typed [`ImportRow`]s, records field-level issues, and parses the
//! `day/month/2-digit-year` due dates found in the source sheets.
//!
//! No DB, no async, no I/O.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::task::STATUS_PLANNED;
use crate::types::{Date, DbId};

/// One spreadsheet row: normalized header name -> trimmed cell text.
pub type RawRow = HashMap<String, String>;

// ── Header aliases ───────────────────────────────────────────────────

pub const COL_MACHINE: &[&str] = &["machine", "machine_name", "asset", "name"];
pub const COL_MODEL: &[&str] = &["model", "machine_model"];
pub const COL_SERIAL: &[&str] = &["serial", "serial_number", "sn"];
pub const COL_LINE: &[&str] = &["line", "production_line"];
pub const COL_SECTION: &[&str] = &["section", "group"];
pub const COL_UNIT: &[&str] = &["unit", "component"];
pub const COL_TASK: &[&str] = &["task", "description", "activity"];
pub const COL_TYPE: &[&str] = &["type", "task_type"];
pub const COL_QUANTITY: &[&str] = &["qty", "quantity"];
pub const COL_DURATION: &[&str] = &["duration", "duration_min", "minutes"];
pub const COL_FREQUENCY: &[&str] = &["frequency", "frequency_hours", "interval_hours"];
pub const COL_DUE_DATE: &[&str] = &["due_date", "due", "date", "next_due"];
pub const COL_STATUS: &[&str] = &["status"];

/// Normalize a header cell: lowercase, trimmed, spaces and dashes to `_`.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// First non-empty value among `aliases`.
fn field<'a>(raw: &'a RawRow, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|a| raw.get(*a))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
}

// ── Types ────────────────────────────────────────────────────────────

/// A spreadsheet row mapped to one (machine, task) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    /// 1-based sheet row number (header is row 1).
    pub row_number: usize,
    pub machine_name: String,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub line: Option<String>,
    pub section: Option<String>,
    pub unit: Option<String>,
    pub task: String,
    pub task_type: Option<String>,
    pub quantity: Option<i32>,
    pub duration_min: Option<i32>,
    pub frequency_hours: Option<i32>,
    pub due_date: Option<Date>,
    pub status: String,
}

impl ImportRow {
    /// Rows with a positive interval become preventive rules.
    pub fn is_preventive(&self) -> bool {
        self.frequency_hours.is_some_and(|h| h > 0)
    }
}

/// A problem with one field of one row. The offending field is left `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    pub row_number: usize,
    pub field: String,
    pub message: String,
}

/// Result of mapping a single raw row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// No machine name: the row is ignored.
    Skipped,
    Mapped {
        row: ImportRow,
        issues: Vec<RowIssue>,
    },
}

// ── Parsing helpers ──────────────────────────────────────────────────

/// Parse a `day/month/year` date, where a 2-digit year means `20yy`.
///
/// Also accepts ISO `yyyy-mm-dd`, which is what native spreadsheet date
/// cells are rendered as. A date is read year-first only when its first
/// part has four digits, so `05-03-24` is the 5th of March 2024. Out-of-range
/// components (e.g. month 13) are rejected rather than rolled over into the
/// next month or year.
///
/// ```
/// use cmms_core::importer::parse_day_month_year;
/// let d = parse_day_month_year("05/03/24").unwrap();
/// assert_eq!(d.to_string(), "2024-03-05");
/// ```
pub fn parse_day_month_year(input: &str) -> Result<Date, String> {
    let s = input.trim();
    let parts: Vec<&str> = s.split(['/', '.', '-']).collect();
    let (d, m, y) = match parts.as_slice() {
        [y, m, d] if y.trim().len() == 4 => (*d, *m, *y),
        [d, m, y] => (*d, *m, *y),
        _ => return Err(format!("'{s}' is not a day/month/year date")),
    };

    let parse = |p: &str, what: &str| -> Result<u32, String> {
        p.trim()
            .parse::<u32>()
            .map_err(|_| format!("'{s}' has a non-numeric {what}"))
    };
    let day = parse(d, "day")?;
    let month = parse(m, "month")?;
    let year = parse(y, "year")?;
    let year = match y.trim().len() {
        2 => 2000 + year,
        4 => year,
        _ => return Err(format!("'{s}' must use a 2- or 4-digit year")),
    };

    Date::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| format!("'{s}' is not a valid calendar date"))
}

/// Parse a numeric cell into a whole number. Accepts `"30"` and `"30.0"`.
pub fn parse_whole_number(input: &str) -> Result<i32, String> {
    let s = input.trim().replace(',', ".");
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{input}' is not a number"))?;
    if !value.is_finite() || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(format!("'{input}' is out of range"));
    }
    Ok(value.round() as i32)
}

// ── Row mapping ──────────────────────────────────────────────────────

/// Map one raw row into an [`ImportRow`].
///
/// Rows without a machine name are skipped. Absent optional fields become
/// `None`; unparseable ones become `None` and add a [`RowIssue`]. A missing
/// status defaults to `Planned`.
pub fn map_row(row_number: usize, raw: &RawRow) -> RowOutcome {
    let Some(machine_name) = field(raw, COL_MACHINE) else {
        return RowOutcome::Skipped;
    };

    let mut issues = Vec::new();
    let text = |aliases: &[&str]| field(raw, aliases).map(str::to_string);

    let number = |aliases: &[&str], name: &str, issues: &mut Vec<RowIssue>| -> Option<i32> {
        let value = field(raw, aliases)?;
        match parse_whole_number(value) {
            Ok(n) if n >= 0 => Some(n),
            Ok(_) => {
                issues.push(RowIssue {
                    row_number,
                    field: name.to_string(),
                    message: format!("{name} must not be negative"),
                });
                None
            }
            Err(message) => {
                issues.push(RowIssue {
                    row_number,
                    field: name.to_string(),
                    message,
                });
                None
            }
        }
    };

    let quantity = number(COL_QUANTITY, "quantity", &mut issues);
    let duration_min = number(COL_DURATION, "duration_min", &mut issues);
    let frequency_hours = number(COL_FREQUENCY, "frequency_hours", &mut issues);

    let due_date = field(raw, COL_DUE_DATE).and_then(|v| match parse_day_month_year(v) {
        Ok(d) => Some(d),
        Err(message) => {
            issues.push(RowIssue {
                row_number,
                field: "due_date".to_string(),
                message,
            });
            None
        }
    });

    let task = text(COL_TASK).unwrap_or_default();
    if task.is_empty() {
        issues.push(RowIssue {
            row_number,
            field: "task".to_string(),
            message: "task description is empty".to_string(),
        });
    }

    RowOutcome::Mapped {
        row: ImportRow {
            row_number,
            machine_name: machine_name.to_string(),
            model: text(COL_MODEL),
            serial: text(COL_SERIAL),
            line: text(COL_LINE),
            section: text(COL_SECTION),
            unit: text(COL_UNIT),
            task,
            task_type: text(COL_TYPE),
            quantity,
            duration_min,
            frequency_hours,
            due_date,
            status: text(COL_STATUS).unwrap_or_else(|| STATUS_PLANNED.to_string()),
        },
        issues,
    }
}

// ── Preview ──────────────────────────────────────────────────────────

/// Dry-run result of mapping a whole sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportPreview {
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub valid: Vec<ImportRow>,
    pub rejected: Vec<RejectedRow>,
    /// Distinct machine names in `valid` that do not exist yet.
    pub new_machines: Vec<String>,
}

/// A row that will not be imported, with every reason found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedRow {
    pub row: ImportRow,
    pub issues: Vec<RowIssue>,
}

/// Map every raw row and split them into valid and rejected sets.
///
/// `machine_exists` reports whether a machine name is already registered.
/// Row numbers start at 2 because row 1 holds the headers.
pub fn build_preview<F>(rows: &[RawRow], machine_exists: F) -> ImportPreview
where
    F: Fn(&str) -> bool,
{
    let mut preview = ImportPreview {
        total_rows: rows.len(),
        ..ImportPreview::default()
    };

    for (idx, raw) in rows.iter().enumerate() {
        match map_row(idx + 2, raw) {
            RowOutcome::Skipped => preview.skipped_rows += 1,
            RowOutcome::Mapped { row, issues } if issues.is_empty() => {
                if !machine_exists(&row.machine_name)
                    && !preview.new_machines.contains(&row.machine_name)
                {
                    preview.new_machines.push(row.machine_name.clone());
                }
                preview.valid.push(row);
            }
            RowOutcome::Mapped { row, issues } => {
                preview.rejected.push(RejectedRow { row, issues });
            }
        }
    }
    preview
}

// ── Machine id cache ─────────────────────────────────────────────────

/// Per-request cache of machine name -> id, so each distinct machine is
/// upserted once per import.
#[derive(Debug, Default)]
pub struct MachineIdCache {
    ids: HashMap<String, DbId>,
}

impl MachineIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<DbId> {
        self.ids.get(name).copied()
    }

    pub fn insert(&mut self, name: &str, id: DbId) {
        self.ids.insert(name.to_string(), id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Counters returned by an import run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub machines_created: usize,
    pub machines_reused: usize,
    pub tasks_inserted: usize,
    pub issues: Vec<RowIssue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (normalize_header(k), v.to_string()))
            .collect()
    }

    // -- dates ---------------------------------------------------------

    #[test]
    fn two_digit_year_date() {
        let d = parse_day_month_year("05/03/24").unwrap();
        assert_eq!(d, Date::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(d.to_string(), "2024-03-05");
    }

    #[test]
    fn four_digit_year_and_iso_dates() {
        assert_eq!(
            parse_day_month_year("5/3/2024").unwrap(),
            Date::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert_eq!(
            parse_day_month_year("2024-03-05").unwrap(),
            Date::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn dash_separated_two_digit_year_is_day_first() {
        assert_eq!(
            parse_day_month_year("05-03-24").unwrap(),
            Date::from_ymd_opt(2024, 3, 5).unwrap()
        );
        assert_eq!(
            parse_day_month_year("13-05-24").unwrap(),
            Date::from_ymd_opt(2024, 5, 13).unwrap()
        );
        assert!(parse_day_month_year("05-13-24").is_err());
    }

    #[test]
    fn out_of_range_components_are_rejected() {
        assert!(parse_day_month_year("31/13/24").is_err());
        assert!(parse_day_month_year("30/02/24").is_err());
        assert!(parse_day_month_year("05/03/124").is_err());
        assert!(parse_day_month_year("tomorrow").is_err());
    }

    // -- numbers -------------------------------------------------------

    #[test]
    fn whole_numbers_accept_float_cells() {
        assert_eq!(parse_whole_number("30"), Ok(30));
        assert_eq!(parse_whole_number("30.0"), Ok(30));
        assert_eq!(parse_whole_number("7,5"), Ok(8));
        assert!(parse_whole_number("abc").is_err());
    }

    // -- headers -------------------------------------------------------

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header(" Due Date "), "due_date");
        assert_eq!(normalize_header("Serial-Number"), "serial_number");
    }

    // -- map_row -------------------------------------------------------

    #[test]
    fn row_without_machine_is_skipped() {
        let r = raw(&[("Machine", "  "), ("Task", "Oil")]);
        assert_eq!(map_row(2, &r), RowOutcome::Skipped);
    }

    #[test]
    fn full_row_maps_cleanly() {
        let r = raw(&[
            ("Machine", "Press 1"),
            ("Model", "HP-200"),
            ("Line", "L1"),
            ("Task", "Grease bearings"),
            ("Qty", "2"),
            ("Duration", "30"),
            ("Frequency", "168"),
            ("Due Date", "05/03/24"),
        ]);
        let RowOutcome::Mapped { row, issues } = map_row(2, &r) else {
            panic!("row should map");
        };
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
        assert_eq!(row.machine_name, "Press 1");
        assert_eq!(row.model.as_deref(), Some("HP-200"));
        assert_eq!(row.serial, None);
        assert_eq!(row.quantity, Some(2));
        assert_eq!(row.frequency_hours, Some(168));
        assert_eq!(row.due_date, Date::from_ymd_opt(2024, 3, 5));
        assert_eq!(row.status, STATUS_PLANNED);
        assert!(row.is_preventive());
    }

    #[test]
    fn bad_fields_are_nulled_and_reported() {
        let r = raw(&[
            ("Machine", "Press 1"),
            ("Task", "Inspect"),
            ("Duration", "half an hour"),
            ("Due Date", "31/13/24"),
        ]);
        let RowOutcome::Mapped { row, issues } = map_row(7, &r) else {
            panic!("row should map");
        };
        assert_eq!(row.duration_min, None);
        assert_eq!(row.due_date, None);
        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["duration_min", "due_date"]);
        assert!(issues.iter().all(|i| i.row_number == 7));
    }

    #[test]
    fn negative_numbers_are_nulled() {
        let r = raw(&[("Machine", "Press 1"), ("Task", "Oil"), ("Qty", "-2")]);
        let RowOutcome::Mapped { row, issues } = map_row(3, &r) else {
            panic!("row should map");
        };
        assert_eq!(row.quantity, None);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "quantity");
    }

    #[test]
    fn empty_task_is_an_issue() {
        let r = raw(&[("Machine", "Press 1")]);
        let RowOutcome::Mapped { issues, .. } = map_row(3, &r) else {
            panic!("row should map");
        };
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "task");
    }

    // -- preview -------------------------------------------------------

    #[test]
    fn preview_splits_rows_and_lists_new_machines() {
        let rows = vec![
            raw(&[("Machine", "Press 1"), ("Task", "Oil")]),
            raw(&[("Machine", "Press 2"), ("Task", "Clean")]),
            raw(&[("Machine", "Press 2"), ("Task", "Inspect")]),
            raw(&[("Machine", "Press 3"), ("Task", "")]),
            raw(&[("Machine", ""), ("Task", "Orphan")]),
        ];
        let preview = build_preview(&rows, |name| name == "Press 1");

        assert_eq!(preview.total_rows, 5);
        assert_eq!(preview.skipped_rows, 1);
        assert_eq!(preview.valid.len(), 3);
        assert_eq!(preview.rejected.len(), 1);
        assert_eq!(preview.rejected[0].row.row_number, 5);
        assert_eq!(preview.new_machines, vec!["Press 2".to_string()]);
    }

    // -- cache ---------------------------------------------------------

    #[test]
    fn cache_reuses_ids() {
        let mut cache = MachineIdCache::new();
        assert!(cache.is_empty());
        cache.insert("Press 1", 10);
        assert_eq!(cache.get("Press 1"), Some(10));
        assert_eq!(cache.get("Press 2"), None);
        cache.insert("Press 1", 10);
        assert_eq!(cache.len(), 1);
    }
}
