//! Reads the first worksheet of an `.xlsx`/`.xls`/`.ods` workbook into
//! [`RawRow`]s keyed by normalized header name.
//!
//! Parsing is CPU-bound and synchronous; async callers wrap these functions
//! in `tokio::task::spawn_blocking`.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use cmms_core::importer::{normalize_header, RawRow};

#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("could not read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no worksheets")]
    NoSheet,
}

/// Read rows from an in-memory workbook (e.g. a multipart upload).
pub fn read_rows_from_bytes(bytes: Vec<u8>) -> Result<Vec<RawRow>, SpreadsheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::NoSheet)??;
    Ok(rows_from_range(&range))
}

/// Read rows from a workbook on disk.
pub fn read_rows_from_path(path: &Path) -> Result<Vec<RawRow>, SpreadsheetError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::NoSheet)??;
    Ok(rows_from_range(&range))
}

/// First row is the header. Blank rows stay in place as empty maps so that
/// index `i` is always sheet row `i + 2`.
fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| normalize_header(&cell_text(c)))
        .collect();

    rows.map(|cells| {
        headers
            .iter()
            .zip(cells)
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, c)| (h.clone(), cell_text(c)))
            .filter(|(_, v)| !v.is_empty())
            .collect::<RawRow>()
    })
    .collect()
}

/// Render one cell as text. Whole floats lose their `.0`; date cells become
/// ISO `yyyy-mm-dd`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (*f as i64).to_string()
        }
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DurationIso(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    fn workbook_bytes(build: impl FnOnce(&mut rust_xlsxwriter::Worksheet)) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        build(sheet);
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn headers_are_normalized_and_numbers_trimmed() {
        let bytes = workbook_bytes(|ws| {
            ws.write_string(0, 0, "Machine Name").unwrap();
            ws.write_string(0, 1, "Frequency-Hours").unwrap();
            ws.write_string(0, 2, "Duration").unwrap();
            ws.write_string(1, 0, "Press 1").unwrap();
            ws.write_number(1, 1, 168.0).unwrap();
            ws.write_number(1, 2, 7.5).unwrap();
        });
        let rows = read_rows_from_bytes(bytes).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["machine_name"], "Press 1");
        assert_eq!(rows[0]["frequency_hours"], "168");
        assert_eq!(rows[0]["duration"], "7.5");
    }

    #[test]
    fn date_cells_render_as_iso() {
        let bytes = workbook_bytes(|ws| {
            let format = Format::new().set_num_format("dd/mm/yy");
            let date = ExcelDateTime::from_ymd(2024, 3, 5).unwrap();
            ws.write_string(0, 0, "Due Date").unwrap();
            ws.write_datetime_with_format(1, 0, &date, &format).unwrap();
        });
        let rows = read_rows_from_bytes(bytes).unwrap();
        assert_eq!(rows[0]["due_date"], "2024-03-05");
    }

    #[test]
    fn blank_rows_keep_their_position() {
        let bytes = workbook_bytes(|ws| {
            ws.write_string(0, 0, "Machine").unwrap();
            ws.write_string(1, 0, "Press 1").unwrap();
            ws.write_string(3, 0, "Press 2").unwrap();
        });
        let rows = read_rows_from_bytes(bytes).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2]["machine"], "Press 2");
    }

    #[test]
    fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.xlsx");
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        ws.write_string(0, 0, "Machine").unwrap();
        ws.write_string(1, 0, "Lathe").unwrap();
        workbook.save(&path).unwrap();

        let rows = read_rows_from_path(&path).unwrap();
        assert_eq!(rows[0]["machine"], "Lathe");
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        let err = read_rows_from_bytes(b"not a workbook".to_vec()).unwrap_err();
        assert_matches!(err, SpreadsheetError::Workbook(_));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_rows_from_path(Path::new("/nonexistent/plan.xlsx")).is_err());
    }
}
