//! Conversion of rows and records into polars DataFrames.

use crate::dates::format_market_date;
use crate::jquants::rows::{AnnouncementRow, DailyQuoteRow, ListedInfoRow, TradingCalendarRow};
use crate::records::{AnnouncementRecord, TradingDayRecord};
use polars::prelude::*;

/// Types that can be laid out as one DataFrame row each.
pub trait IntoFrame: Sized {
    /// Build a DataFrame from a slice of rows.
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame>;
}

fn text<T>(rows: &[T], f: impl Fn(&T) -> Option<String>) -> Vec<Option<String>> {
    rows.iter().map(f).collect()
}

fn number<T>(rows: &[T], f: impl Fn(&T) -> Option<f64>) -> Vec<Option<f64>> {
    rows.iter().map(f).collect()
}

fn source_column(len: usize) -> Column {
    Series::new("source".into(), vec!["j-quants"; len]).into()
}

impl IntoFrame for AnnouncementRow {
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Series::new("Date".into(), text(rows, |r| r.date.clone())).into(),
            Series::new(
                "AnnouncementDate".into(),
                text(rows, |r| r.announcement_date.clone()),
            )
            .into(),
            Series::new("Code".into(), text(rows, |r| r.code.clone())).into(),
            Series::new("CompanyName".into(), text(rows, |r| r.company_name.clone())).into(),
            Series::new("FiscalYear".into(), text(rows, |r| r.fiscal_year.clone())).into(),
            Series::new("FiscalQuarter".into(), text(rows, |r| r.fiscal_quarter.clone())).into(),
            Series::new("SectorName".into(), text(rows, |r| r.sector_name.clone())).into(),
            Series::new("Section".into(), text(rows, |r| r.section.clone())).into(),
            source_column(rows.len()),
        ])
    }
}

impl IntoFrame for TradingCalendarRow {
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        let divisions: Vec<Option<i64>> = rows.iter().map(|r| r.holiday_division).collect();
        let trading: Vec<Option<bool>> = rows.iter().map(|r| r.is_trading_day).collect();
        DataFrame::new(vec![
            Series::new("Date".into(), text(rows, |r| r.date.clone())).into(),
            Series::new("HolidayDivision".into(), divisions).into(),
            Series::new("IsTradingDay".into(), trading).into(),
            source_column(rows.len()),
        ])
    }
}

impl IntoFrame for ListedInfoRow {
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Series::new("Date".into(), text(rows, |r| r.date.clone())).into(),
            Series::new("Code".into(), text(rows, |r| r.code.clone())).into(),
            Series::new("CompanyName".into(), text(rows, |r| r.company_name.clone())).into(),
            Series::new(
                "CompanyNameEnglish".into(),
                text(rows, |r| r.company_name_english.clone()),
            )
            .into(),
            Series::new(
                "Sector17CodeName".into(),
                text(rows, |r| r.sector17_code_name.clone()),
            )
            .into(),
            Series::new(
                "Sector33CodeName".into(),
                text(rows, |r| r.sector33_code_name.clone()),
            )
            .into(),
            Series::new("ScaleCategory".into(), text(rows, |r| r.scale_category.clone())).into(),
            Series::new(
                "MarketCodeName".into(),
                text(rows, |r| r.market_code_name.clone()),
            )
            .into(),
            source_column(rows.len()),
        ])
    }
}

impl IntoFrame for DailyQuoteRow {
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Series::new("Date".into(), text(rows, |r| r.date.clone())).into(),
            Series::new("Code".into(), text(rows, |r| r.code.clone())).into(),
            Series::new("Open".into(), number(rows, |r| r.open)).into(),
            Series::new("High".into(), number(rows, |r| r.high)).into(),
            Series::new("Low".into(), number(rows, |r| r.low)).into(),
            Series::new("Close".into(), number(rows, |r| r.close)).into(),
            Series::new("UpperLimit".into(), number(rows, |r| r.upper_limit)).into(),
            Series::new("LowerLimit".into(), number(rows, |r| r.lower_limit)).into(),
            Series::new("Volume".into(), number(rows, |r| r.volume)).into(),
            Series::new("TurnoverValue".into(), number(rows, |r| r.turnover_value)).into(),
            Series::new(
                "AdjustmentFactor".into(),
                number(rows, |r| r.adjustment_factor),
            )
            .into(),
            Series::new("AdjustmentOpen".into(), number(rows, |r| r.adjustment_open)).into(),
            Series::new("AdjustmentHigh".into(), number(rows, |r| r.adjustment_high)).into(),
            Series::new("AdjustmentLow".into(), number(rows, |r| r.adjustment_low)).into(),
            Series::new("AdjustmentClose".into(), number(rows, |r| r.adjustment_close)).into(),
            Series::new(
                "AdjustmentVolume".into(),
                number(rows, |r| r.adjustment_volume),
            )
            .into(),
            source_column(rows.len()),
        ])
    }
}

impl IntoFrame for AnnouncementRecord {
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        let dates: Vec<String> = rows.iter().map(|r| format_market_date(r.date)).collect();
        let codes: Vec<String> = rows.iter().map(|r| r.code.clone()).collect();
        let names: Vec<String> = rows.iter().map(|r| r.company_name.clone()).collect();
        let sources: Vec<&str> = rows.iter().map(|r| r.source.label()).collect();
        DataFrame::new(vec![
            Series::new("Date".into(), dates).into(),
            Series::new("Code".into(), codes).into(),
            Series::new("CompanyName".into(), names).into(),
            Series::new("FiscalQuarter".into(), text(rows, |r| r.fiscal_quarter.clone())).into(),
            Series::new("FiscalYear".into(), text(rows, |r| r.fiscal_year.clone())).into(),
            Series::new("FiscalYearEnd".into(), text(rows, |r| r.fiscal_year_end.clone())).into(),
            Series::new("source".into(), sources).into(),
        ])
    }
}

impl IntoFrame for TradingDayRecord {
    fn to_frame(rows: &[Self]) -> PolarsResult<DataFrame> {
        let dates: Vec<String> = rows.iter().map(|r| format_market_date(r.date)).collect();
        let divisions: Vec<i64> = rows.iter().map(|r| r.holiday_division).collect();
        let trading: Vec<bool> = rows.iter().map(|r| r.is_trading_day).collect();
        let holiday: Vec<bool> = rows.iter().map(|r| r.is_holiday()).collect();
        DataFrame::new(vec![
            Series::new("Date".into(), dates).into(),
            Series::new("HolidayDivision".into(), divisions).into(),
            Series::new("IsTradingDay".into(), trading).into(),
            Series::new("IsHoliday".into(), holiday).into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SourceTag;
    use chrono::NaiveDate;

    #[test]
    fn test_announcement_rows_frame_shape() {
        let rows = vec![
            AnnouncementRow {
                date: Some("2024-05-08".into()),
                code: Some("72030".into()),
                ..Default::default()
            },
            AnnouncementRow::default(),
        ];
        let df = AnnouncementRow::to_frame(&rows).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 9);
        assert!(df.column("source").is_ok());
    }

    #[test]
    fn test_empty_rows_give_empty_frame() {
        let df = TradingCalendarRow::to_frame(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 4);
    }

    #[test]
    fn test_record_frame_carries_source_labels() {
        let records = vec![AnnouncementRecord {
            code: "1301".into(),
            company_name: "極洋".into(),
            date: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            fiscal_quarter: None,
            fiscal_year: None,
            fiscal_year_end: Some("2024-03-31".into()),
            source: SourceTag::Fallback,
        }];
        let df = AnnouncementRecord::to_frame(&records).unwrap();
        let sources = df.column("source").unwrap().as_materialized_series();
        assert_eq!(sources.str().unwrap().get(0), Some("jpx-excel"));
    }
}
