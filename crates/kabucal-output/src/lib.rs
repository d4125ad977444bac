#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kabucal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod events;
pub mod ics;

pub use events::{
    CalendarEvent, EventKind, build_announcement_event, build_events, build_holiday_event,
};
pub use ics::{CalendarExport, DEFAULT_OUTPUT, OutputError, build_calendar, write_calendar};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
