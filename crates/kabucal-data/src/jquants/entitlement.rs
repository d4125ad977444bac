//! Subscription-window recovery for the trading calendar.
//!
//! When a plan does not cover the requested dates, J-Quants answers with an
//! error such as `"Your subscription covers the following dates:
//! 2023-09-10 ~ 2025-09-10."`. The window is read out of that message and the
//! request is retried once. The match is tied to the upstream wording; if it
//! changes, extraction returns `None` and the message is logged.

use crate::dates::{DateRange, parse_market_date};
use crate::jquants::rows::TradingCalendarRow;
use crate::records::TradingDayRecord;
use crate::source::TradingCalendarSource;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

static PERMITTED_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2})\s*~\s*(\d{4}-\d{2}-\d{2})").expect("valid regex")
});

/// Find `YYYY-MM-DD ~ YYYY-MM-DD` in an error message.
///
/// ```
/// use kabucal_data::jquants::extract_permitted_range;
///
/// let msg = "Your subscription covers the following dates: 2023-09-10 ~ 2025-09-10.";
/// assert_eq!(extract_permitted_range(msg), Some(("2023-09-10", "2025-09-10")));
/// assert_eq!(extract_permitted_range("Some other error message"), None);
/// ```
pub fn extract_permitted_range(message: &str) -> Option<(&str, &str)> {
    let caps = PERMITTED_RANGE.captures(message)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Like [`extract_permitted_range`], parsed into a valid [`DateRange`].
pub fn permitted_range(message: &str) -> Option<DateRange> {
    let (from, to) = extract_permitted_range(message)?;
    DateRange::new(parse_market_date(from)?, parse_market_date(to)?).ok()
}

/// Fetch the trading calendar, retrying once inside the subscription window.
///
/// An empty first answer is treated as a possible entitlement error. The raw
/// error body is requested, a permitted window extracted, and the structured
/// call repeated exactly once with that window in place of `range`. Rows with
/// bad dates are dropped.
pub async fn fetch_trading_calendar<S>(source: &S, range: DateRange) -> Vec<TradingDayRecord>
where
    S: TradingCalendarSource,
{
    let rows = source.trading_calendar(range).await;
    if !rows.is_empty() {
        return normalize(rows);
    }

    let Some(body) = source.trading_calendar_error(range).await else {
        warn!(%range, "trading calendar empty and no error body available");
        return Vec::new();
    };

    let Some(permitted) = permitted_range(&body) else {
        warn!(%range, message = %body, "trading calendar empty; no permitted range in response");
        return Vec::new();
    };

    info!(requested = %range, %permitted, "retrying trading calendar within subscription window");
    normalize(source.trading_calendar(permitted).await)
}

fn normalize(rows: Vec<TradingCalendarRow>) -> Vec<TradingDayRecord> {
    rows.into_iter()
        .filter_map(TradingCalendarRow::into_record)
        .collect()
}
