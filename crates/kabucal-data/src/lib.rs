#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/kabucal/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod dates;
pub mod error;
pub mod frame;
pub mod jpx;
pub mod jquants;
pub mod merge;
pub mod records;
pub mod source;

pub use error::{DataError, Result};
pub use frame::IntoFrame;
pub use merge::{dedupe_announcements, merge_announcements};
pub use records::{AnnouncementRecord, SourceTag, TradingDayRecord};
pub use source::{AnnouncementSource, TradingCalendarSource};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
