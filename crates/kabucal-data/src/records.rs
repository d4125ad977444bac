//! Normalized records produced by both data sources.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an announcement record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    /// J-Quants `/fins/announcement`.
    Primary,
    /// JPX announcement-schedule spreadsheets.
    Fallback,
}

impl SourceTag {
    /// Short label used in logs and tables.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Primary => "j-quants",
            Self::Fallback => "jpx-excel",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A scheduled earnings announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementRecord {
    /// Securities code, e.g. "7203" or "130A".
    pub code: String,
    /// Company name as published.
    pub company_name: String,
    /// Announcement day.
    pub date: NaiveDate,
    /// Fiscal quarter label, e.g. "第２四半期".
    pub fiscal_quarter: Option<String>,
    /// Fiscal year label.
    pub fiscal_year: Option<String>,
    /// Fiscal period end, when the source publishes it.
    pub fiscal_year_end: Option<String>,
    /// Originating source.
    pub source: SourceTag,
}

impl AnnouncementRecord {
    /// Deduplication key.
    pub fn identity_key(&self) -> (&str, NaiveDate) {
        (self.code.as_str(), self.date)
    }
}

/// One day of the exchange trading calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingDayRecord {
    /// Calendar day.
    pub date: NaiveDate,
    /// J-Quants holiday division; `0` is a non-business day.
    pub holiday_division: i64,
    /// Whether the exchange trades on this day.
    pub is_trading_day: bool,
}

impl TradingDayRecord {
    /// Holiday division assumed when the upstream row omits it.
    pub const DEFAULT_HOLIDAY_DIVISION: i64 = 1;

    /// True when the exchange is closed on this day.
    pub const fn is_holiday(&self) -> bool {
        self.holiday_division == 0 || !self.is_trading_day
    }
}
