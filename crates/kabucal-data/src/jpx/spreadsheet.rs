//! Parsing of the JPX announcement-schedule workbooks.
//!
//! Layout of the first worksheet (0-based columns):
//!
//! | col | content                          |
//! |-----|----------------------------------|
//! | 0   | announcement date                |
//! | 1   | securities code                  |
//! | 2   | company name (Japanese)          |
//! | 3   | issue name (English)             |
//! | 4   | fiscal period end                |
//! | 5-6 | industry (Japanese / English)    |
//! | 7   | fiscal quarter label (Japanese)  |
//! | 8   | fiscal year/quarter (English)    |
//! | 9-10| market segment                   |
//!
//! Row 4 holds the column headers; data starts below it.

use crate::error::{DataError, Result};
use crate::records::{AnnouncementRecord, SourceTag};
use calamine::{Data, DataType, Range, Reader, Xlsx};
use chrono::{Datelike, NaiveDate};
use std::io::Cursor;
use tracing::{debug, info};

/// 0-based index of the header row.
pub const HEADER_ROW: usize = 4;

const COL_DATE: usize = 0;
const COL_CODE: usize = 1;
const COL_NAME: usize = 2;
const COL_FISCAL_YEAR_END: usize = 4;
const COL_FISCAL_QUARTER: usize = 7;

/// Open workbook bytes and return the first worksheet.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Range<Data>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(DataError::from)
}

/// Parse workbook bytes into announcement records.
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<AnnouncementRecord>> {
    let sheet = read_first_sheet(bytes)?;
    let records = parse_sheet(&sheet);
    if !records.is_empty() {
        info!(rows = records.len(), "parsed announcement spreadsheet");
    }
    Ok(records)
}

/// Parse a worksheet range, skipping the header block and unusable rows.
pub fn parse_sheet(sheet: &Range<Data>) -> Vec<AnnouncementRecord> {
    let (start_row, start_col) = sheet
        .start()
        .map_or((0, 0), |(r, c)| (r as usize, c as usize));

    let mut records = Vec::new();
    for (offset, row) in sheet.rows().enumerate() {
        let absolute_row = start_row + offset;
        if absolute_row <= HEADER_ROW {
            continue;
        }
        let cell = |col: usize| col.checked_sub(start_col).and_then(|i| row.get(i));

        match parse_row(cell) {
            Some(record) => records.push(record),
            None => debug!(row = absolute_row, "skipping spreadsheet row"),
        }
    }
    records
}

fn parse_row<'a>(cell: impl Fn(usize) -> Option<&'a Data>) -> Option<AnnouncementRecord> {
    let date = cell(COL_DATE).and_then(cell_date)?;
    let code = cell(COL_CODE).and_then(cell_code)?;
    let company_name = cell(COL_NAME).and_then(cell_text).unwrap_or_default();
    let fiscal_quarter = cell(COL_FISCAL_QUARTER).and_then(cell_text);
    let (fiscal_year_end, fiscal_year) = cell(COL_FISCAL_YEAR_END)
        .map(fiscal_period)
        .unwrap_or((None, None));

    Some(AnnouncementRecord {
        code,
        company_name,
        date,
        fiscal_quarter,
        fiscal_year,
        fiscal_year_end,
        source: SourceTag::Fallback,
    })
}

/// Date cells, or text written as `YYYY-MM-DD` / `YYYY/MM/DD`.
fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(_) | Data::DateTimeIso(_) => cell.as_date(),
        Data::String(s) => parse_text_date(s),
        _ => None,
    }
}

fn parse_text_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .ok()
}

/// Numeric codes are zero-padded to four characters; others are trimmed.
fn cell_code(cell: &Data) -> Option<String> {
    match cell {
        Data::Int(i) => Some(format!("{i:04}")),
        Data::Float(f) if f.is_finite() => Some(format!("{:04}", *f as i64)),
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else if s.chars().all(|c| c.is_ascii_digit()) {
                Some(format!("{s:0>4}"))
            } else {
                Some(s.to_string())
            }
        }
        _ => None,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        other => Some(other.to_string()),
    }
}

/// `(fiscal_year_end, fiscal_year)` from the fiscal-period-end cell.
fn fiscal_period(cell: &Data) -> (Option<String>, Option<String>) {
    if let Some(date) = cell_date(cell) {
        return (
            Some(date.format("%Y-%m-%d").to_string()),
            Some(date.year().to_string()),
        );
    }
    let Some(text) = cell_text(cell) else {
        return (None, None);
    };
    let year = text
        .get(..4)
        .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string);
    (Some(text), year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_with(rows: &[Vec<Data>]) -> Range<Data> {
        let height = (HEADER_ROW + 1 + rows.len()) as u32;
        let mut range = Range::new((0, 0), (height - 1, 10));
        range.set_value((HEADER_ROW as u32, 0), Data::String("決算発表予定日".into()));
        range.set_value((HEADER_ROW as u32, 1), Data::String("コード".into()));
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                range.set_value(((HEADER_ROW + 1 + i) as u32, j as u32), value.clone());
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn test_parses_rows_below_header() {
        let sheet = sheet_with(&[vec![
            text("2024/05/08"),
            Data::Float(7203.0),
            text(" トヨタ自動車 "),
            text("TOYOTA MOTOR CORPORATION"),
            text("2024/03/31"),
            text("輸送用機器"),
            text("Transportation Equipment"),
            text("本決算"),
            text("Annual"),
            text("プライム"),
            text("Prime"),
        ]]);

        let records = parse_sheet(&sheet);

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.code, "7203");
        assert_eq!(r.company_name, "トヨタ自動車");
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 5, 8).unwrap());
        assert_eq!(r.fiscal_year_end.as_deref(), Some("2024-03-31"));
        assert_eq!(r.fiscal_year.as_deref(), Some("2024"));
        assert_eq!(r.fiscal_quarter.as_deref(), Some("本決算"));
        assert_eq!(r.source, SourceTag::Fallback);
    }

    #[test]
    fn test_header_rows_are_never_data() {
        let mut sheet = sheet_with(&[]);
        sheet.set_value((0, 0), text("2024-05-08"));
        sheet.set_value((0, 1), Data::Int(1301));
        assert!(parse_sheet(&sheet).is_empty());
    }

    #[test]
    fn test_rows_without_date_or_code_are_skipped() {
        let sheet = sheet_with(&[
            vec![text("未定"), Data::Int(1301), text("極洋")],
            vec![Data::Empty, Data::Int(1332), text("ニッスイ")],
            vec![text("2024-05-14"), Data::Empty, text("コードなし")],
            vec![text("2024-05-14"), Data::Int(1333), text("マルハニチロ")],
        ]);
        let records = parse_sheet(&sheet);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "1333");
    }

    #[test]
    fn test_code_padding() {
        assert_eq!(cell_code(&Data::Int(25)).as_deref(), Some("0025"));
        assert_eq!(cell_code(&Data::Float(130.0)).as_deref(), Some("0130"));
        assert_eq!(cell_code(&text("130")).as_deref(), Some("0130"));
        assert_eq!(cell_code(&text(" 130A ")).as_deref(), Some("130A"));
        assert_eq!(cell_code(&text("  ")), None);
        assert_eq!(cell_code(&Data::Bool(true)), None);
    }

    #[test]
    fn test_fiscal_period_text_without_year() {
        assert_eq!(fiscal_period(&text("3月")), (Some("3月".to_string()), None));
        assert_eq!(
            fiscal_period(&text("2025年3月")),
            (Some("2025年3月".to_string()), Some("2025".to_string()))
        );
        assert_eq!(fiscal_period(&Data::Empty), (None, None));
    }

    #[test]
    fn test_missing_optional_columns() {
        let sheet = sheet_with(&[vec![text("2024-05-08"), Data::Int(7203)]]);
        let records = parse_sheet(&sheet);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company_name, "");
        assert!(records[0].fiscal_quarter.is_none());
        assert!(records[0].fiscal_year.is_none());
    }

    #[test]
    fn test_garbage_bytes_are_an_error() {
        assert!(read_first_sheet(b"not a workbook").is_err());
    }
}
