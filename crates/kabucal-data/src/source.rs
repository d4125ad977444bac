//! Source traits the pipeline is written against.
//!
//! The concrete J-Quants and JPX clients implement these; tests substitute
//! in-memory fakes.

use crate::dates::DateRange;
use crate::jquants::client::JQuantsClient;
use crate::jquants::rows::{AnnouncementRow, TradingCalendarRow};
use crate::jpx::JpxFetcher;
use crate::records::AnnouncementRecord;
use std::future::Future;
use tracing::warn;

/// Anything that yields normalized announcement records.
pub trait AnnouncementSource {
    /// Fetch and normalize every available announcement.
    ///
    /// Failures are logged by the implementation and yield an empty vector.
    fn announcements(&self) -> impl Future<Output = Vec<AnnouncementRecord>>;
}

/// Trading-calendar access with a raw-error escape hatch.
pub trait TradingCalendarSource {
    /// Structured call; empty on error.
    fn trading_calendar(&self, range: DateRange) -> impl Future<Output = Vec<TradingCalendarRow>>;

    /// Re-issue the same request and return the raw response body, if any.
    fn trading_calendar_error(&self, range: DateRange) -> impl Future<Output = Option<String>>;
}

impl AnnouncementSource for JQuantsClient<'_> {
    async fn announcements(&self) -> Vec<AnnouncementRecord> {
        Self::announcements(self)
            .await
            .rows
            .into_iter()
            .filter_map(AnnouncementRow::into_record)
            .collect()
    }
}

impl TradingCalendarSource for JQuantsClient<'_> {
    async fn trading_calendar(&self, range: DateRange) -> Vec<TradingCalendarRow> {
        Self::trading_calendar(self, range).await.rows
    }

    async fn trading_calendar_error(&self, range: DateRange) -> Option<String> {
        if !self.session().is_enabled() {
            return None;
        }
        match self.trading_calendar_raw(range).await {
            Ok(raw) => Some(raw.body),
            Err(e) => {
                warn!(error = %e, "raw trading calendar request failed");
                None
            }
        }
    }
}

impl AnnouncementSource for JpxFetcher {
    async fn announcements(&self) -> Vec<AnnouncementRecord> {
        self.fetch_announcements().await
    }
}
