//! Typed J-Quants response rows.
//!
//! Every field is optional because the API omits keys freely. Defaults are
//! applied when a row is normalized into a record, not at decode time.

use crate::dates::parse_market_date;
use crate::records::{AnnouncementRecord, SourceTag, TradingDayRecord};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Row of `/v1/fins/announcement`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnnouncementRow {
    /// Scheduled announcement date.
    pub date: Option<String>,
    /// Alternate key some payloads use for the date.
    pub announcement_date: Option<String>,
    /// Securities code.
    pub code: Option<String>,
    /// Company name.
    pub company_name: Option<String>,
    /// Fiscal year label.
    pub fiscal_year: Option<String>,
    /// Fiscal quarter label.
    pub fiscal_quarter: Option<String>,
    /// Sector name.
    pub sector_name: Option<String>,
    /// Market section.
    pub section: Option<String>,
}

impl AnnouncementRow {
    /// Normalize into a record; `None` when the date or code is unusable.
    pub fn into_record(self) -> Option<AnnouncementRecord> {
        let raw_date = non_empty(self.date).or_else(|| non_empty(self.announcement_date))?;
        let Some(date) = parse_market_date(&raw_date) else {
            warn!(date = %raw_date, "skipping announcement with unparseable date");
            return None;
        };
        let Some(code) = non_empty(self.code) else {
            warn!(date = %raw_date, "skipping announcement without a code");
            return None;
        };

        Some(AnnouncementRecord {
            code,
            company_name: self.company_name.unwrap_or_default(),
            date,
            fiscal_quarter: non_empty(self.fiscal_quarter),
            fiscal_year: non_empty(self.fiscal_year),
            fiscal_year_end: None,
            source: SourceTag::Primary,
        })
    }
}

/// Row of `/v1/markets/trading_calendar`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TradingCalendarRow {
    /// Calendar date.
    pub date: Option<String>,
    /// Holiday division; the API sends it as a numeric string.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub holiday_division: Option<i64>,
    /// Explicit trading flag, when present. Accepts `true`, `"true"`, `1`
    /// and `"1"` (and their negatives); anything else is treated as absent.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_trading_day: Option<bool>,
}

impl TradingCalendarRow {
    /// Normalize into a record.
    ///
    /// A missing `HolidayDivision` means a trading day (`1`); a missing
    /// `IsTradingDay` means `true`.
    pub fn into_record(self) -> Option<TradingDayRecord> {
        let raw_date = non_empty(self.date)?;
        let Some(date) = parse_market_date(&raw_date) else {
            warn!(date = %raw_date, "skipping trading day with unparseable date");
            return None;
        };
        Some(TradingDayRecord {
            date,
            holiday_division: self
                .holiday_division
                .unwrap_or(TradingDayRecord::DEFAULT_HOLIDAY_DIVISION),
            is_trading_day: self.is_trading_day.unwrap_or(true),
        })
    }
}

/// Row of `/v1/listed/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListedInfoRow {
    /// Reference date.
    pub date: Option<String>,
    /// Securities code.
    pub code: Option<String>,
    /// Company name.
    pub company_name: Option<String>,
    /// Company name in English.
    pub company_name_english: Option<String>,
    /// 17-sector classification name.
    pub sector17_code_name: Option<String>,
    /// 33-sector classification name.
    pub sector33_code_name: Option<String>,
    /// TOPIX scale category.
    pub scale_category: Option<String>,
    /// Market segment name.
    pub market_code_name: Option<String>,
}

/// Row of `/v1/prices/daily_quotes`.
///
/// Numeric fields are coerced leniently: anything that is not a number or a
/// numeric string becomes `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct DailyQuoteRow {
    pub date: Option<String>,
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub upper_limit: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lower_limit: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub turnover_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub adjustment_factor: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub adjustment_open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub adjustment_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub adjustment_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub adjustment_close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub adjustment_volume: Option<f64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Bool(b) => Some(b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}
