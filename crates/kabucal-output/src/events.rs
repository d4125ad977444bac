//! Calendar events built from normalized records.

use chrono::NaiveDate;
use kabucal_data::dates::format_market_date;
use kabucal_data::{AnnouncementRecord, TradingDayRecord};
use serde::{Deserialize, Serialize};

/// Title prefix of announcement events.
pub const ANNOUNCEMENT_PREFIX: &str = "[決算]";

/// Fixed title of exchange-holiday events.
pub const HOLIDAY_TITLE: &str = "[休場日] 取引所休場";

/// What an event represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Earnings announcement.
    Announcement,
    /// Exchange closed.
    Holiday,
}

/// A whole-day calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// SUMMARY line.
    pub title: String,
    /// Day of the event; no time-of-day.
    pub date: NaiveDate,
    /// Stable UID derived from kind and identity key.
    pub uid: String,
    /// Event kind.
    pub kind: EventKind,
}

/// UID of an announcement: `{code}-announcement-{YYYY-MM-DD}`.
pub fn announcement_uid(code: &str, date: NaiveDate) -> String {
    format!("{code}-announcement-{}", format_market_date(date))
}

/// UID of a holiday: `holiday-{YYYY-MM-DD}`.
pub fn holiday_uid(date: NaiveDate) -> String {
    format!("holiday-{}", format_market_date(date))
}

/// `[決算] {name} ({code})`, then quarter and year when present.
pub fn build_announcement_event(record: &AnnouncementRecord) -> CalendarEvent {
    let mut title = format!(
        "{ANNOUNCEMENT_PREFIX} {} ({})",
        record.company_name, record.code
    );
    for part in [&record.fiscal_quarter, &record.fiscal_year]
        .into_iter()
        .flatten()
    {
        title.push(' ');
        title.push_str(part);
    }

    CalendarEvent {
        title,
        date: record.date,
        uid: announcement_uid(&record.code, record.date),
        kind: EventKind::Announcement,
    }
}

/// Holiday event, only for days the exchange is closed.
pub fn build_holiday_event(record: &TradingDayRecord) -> Option<CalendarEvent> {
    record.is_holiday().then(|| CalendarEvent {
        title: HOLIDAY_TITLE.to_string(),
        date: record.date,
        uid: holiday_uid(record.date),
        kind: EventKind::Holiday,
    })
}

/// Announcement events followed by holiday events.
pub fn build_events(
    announcements: &[AnnouncementRecord],
    trading_days: &[TradingDayRecord],
) -> Vec<CalendarEvent> {
    announcements
        .iter()
        .map(build_announcement_event)
        .chain(trading_days.iter().filter_map(build_holiday_event))
        .collect()
}
