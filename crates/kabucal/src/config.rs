//! Run configuration for the calendar pipeline.

use chrono::NaiveDate;
use kabucal_data::Result;
use kabucal_data::dates::DateRange;
use kabucal_output::DEFAULT_OUTPUT;
use std::path::PathBuf;

/// Default length of the holiday window, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 365;

/// Configuration for one `generate` run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Where the calendar is written.
    pub output: PathBuf,
    /// Holiday window length when `to` is not given.
    pub days: u32,
    /// First day of the holiday window; today when absent.
    pub from: Option<NaiveDate>,
    /// Last day of the holiday window.
    pub to: Option<NaiveDate>,
    /// Whether the JPX spreadsheets are consulted.
    pub use_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            days: DEFAULT_WINDOW_DAYS,
            from: None,
            to: None,
            use_fallback: true,
        }
    }
}

impl PipelineConfig {
    /// Holiday window relative to `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `to` falls before the start, or if
    /// `days` runs past the last representable date.
    pub fn holiday_window(&self, today: NaiveDate) -> Result<DateRange> {
        let from = self.from.unwrap_or(today);
        match self.to {
            Some(to) => DateRange::new(from, to),
            None => DateRange::forward(from, self.days),
        }
    }
}
