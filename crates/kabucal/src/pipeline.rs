//! End-to-end calendar generation.
//!
//! Fetches announcements from the primary source and (optionally) the
//! spreadsheet fallback, fetches the trading calendar with the subscription
//! window retry, merges everything and writes one ICS file. Fetch failures
//! only shrink the output; writing the file is the only fatal step.

use crate::config::PipelineConfig;
use chrono::NaiveDate;
use kabucal_data::dates::DateRange;
use kabucal_data::jquants::fetch_trading_calendar;
use kabucal_data::{
    AnnouncementRecord, AnnouncementSource, DataError, TradingCalendarSource, TradingDayRecord,
    merge_announcements,
};
use kabucal_output::{OutputError, build_events, write_calendar};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Error type for pipeline runs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] DataError),
    /// Writing the calendar failed.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),
    /// Neither announcement source is usable.
    #[error("No announcement source available: primary disabled and fallback turned off")]
    NoSource,
}

/// The sources one run draws from.
///
/// `primary` is `None` when the J-Quants session is disabled.
#[derive(Debug)]
pub struct Sources<'a, P, F, C> {
    /// Primary announcement source.
    pub primary: Option<&'a P>,
    /// Spreadsheet fallback.
    pub fallback: Option<&'a F>,
    /// Trading calendar.
    pub calendar: &'a C,
}

// Derive would require `P: Clone` etc.
impl<P, F, C> Clone for Sources<'_, P, F, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, F, C> Copy for Sources<'_, P, F, C> {}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Announcements after merging.
    pub announcements: usize,
    /// Non-trading days in the window.
    pub holidays: usize,
    /// Events in the written file.
    pub events: usize,
    /// Output path.
    pub path: PathBuf,
}

/// Primary records first, then fallback records, deduplicated by `(code, date)`.
pub async fn collect_announcements<P, F>(
    primary: Option<&P>,
    fallback: Option<&F>,
) -> Vec<AnnouncementRecord>
where
    P: AnnouncementSource,
    F: AnnouncementSource,
{
    let primary_records = match primary {
        Some(source) => source.announcements().await,
        None => Vec::new(),
    };
    let fallback_records = match fallback {
        Some(source) => source.announcements().await,
        None => Vec::new(),
    };
    info!(
        primary = primary_records.len(),
        fallback = fallback_records.len(),
        "fetched announcements"
    );

    merge_announcements(primary_records, fallback_records)
}

/// Trading days in the window that the exchange is closed.
pub async fn collect_holidays<C>(calendar: &C, window: DateRange) -> Vec<TradingDayRecord>
where
    C: TradingCalendarSource,
{
    let days = fetch_trading_calendar(calendar, window).await;
    let total = days.len();
    let holidays: Vec<_> = days.into_iter().filter(TradingDayRecord::is_holiday).collect();
    info!(%window, days = total, holidays = holidays.len(), "fetched trading calendar");
    holidays
}

/// Run the whole pipeline and write the calendar.
///
/// # Errors
///
/// Returns an error if no announcement source is usable, if the holiday
/// window is invalid, or if the output file cannot be written. Upstream
/// failures are logged and never returned.
pub async fn generate<P, F, C>(
    sources: Sources<'_, P, F, C>,
    config: &PipelineConfig,
    today: NaiveDate,
) -> Result<RunSummary, PipelineError>
where
    P: AnnouncementSource,
    F: AnnouncementSource,
    C: TradingCalendarSource,
{
    let fallback = sources.fallback.filter(|_| config.use_fallback);
    if sources.primary.is_none() && fallback.is_none() {
        error!("primary source disabled and fallback turned off; nothing written");
        return Err(PipelineError::NoSource);
    }
    if sources.primary.is_none() {
        warn!("primary source disabled; using the spreadsheet fallback only");
    }

    let window = config.holiday_window(today)?;
    let announcements = collect_announcements(sources.primary, fallback).await;
    let holidays = collect_holidays(sources.calendar, window).await;

    let events = build_events(&announcements, &holidays);
    let written = write_calendar(&events, &config.output)?;

    Ok(RunSummary {
        announcements: announcements.len(),
        holidays: holidays.len(),
        events: written,
        path: config.output.clone(),
    })
}
