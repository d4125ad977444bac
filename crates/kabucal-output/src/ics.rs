//! ICS serialization of calendar events.

use crate::events::CalendarEvent;
use icalendar::{Calendar, Component, Event, EventLike};
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "japan-all-stocks.ics";

/// Calendar display name (`X-WR-CALNAME`).
pub const CALENDAR_NAME: &str = "日本株 決算発表・休場日";

/// Errors that can occur while writing a calendar.
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialization of a set of events into one calendar document.
pub trait CalendarExport {
    /// Render the document as text.
    fn to_ics_string(&self) -> String;

    /// Write the document to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn write_ics(&self, path: &Path) -> Result<(), OutputError> {
        let content = self.to_ics_string();
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

impl CalendarExport for [CalendarEvent] {
    fn to_ics_string(&self) -> String {
        build_calendar(self).to_string()
    }
}

impl CalendarExport for Vec<CalendarEvent> {
    fn to_ics_string(&self) -> String {
        self.as_slice().to_ics_string()
    }
}

/// Build the calendar, dropping any event whose uid was already used.
pub fn build_calendar(events: &[CalendarEvent]) -> Calendar {
    let mut calendar = Calendar::new();
    calendar.name(CALENDAR_NAME);

    let mut seen = HashSet::with_capacity(events.len());
    for event in events {
        if !seen.insert(event.uid.as_str()) {
            warn!(uid = %event.uid, "duplicate uid, keeping the first event");
            continue;
        }
        calendar.push(
            Event::new()
                .uid(&event.uid)
                .summary(&event.title)
                .all_day(event.date)
                .done(),
        );
    }
    calendar.done()
}

/// Serialize `events` and write them to `path`; returns the event count.
pub fn write_calendar(events: &[CalendarEvent], path: &Path) -> Result<usize, OutputError> {
    events.write_ics(path)?;
    let written = events
        .iter()
        .map(|e| e.uid.as_str())
        .collect::<HashSet<_>>()
        .len();
    info!(path = %path.display(), events = written, "calendar written");
    Ok(written)
}
