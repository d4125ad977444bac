//! Cross-source deduplication of announcement records.

use crate::records::AnnouncementRecord;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;

/// Drop later records whose `(code, date)` was already seen.
pub fn dedupe_announcements(records: Vec<AnnouncementRecord>) -> Vec<AnnouncementRecord> {
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::with_capacity(records.len());
    let before = records.len();
    let kept: Vec<_> = records
        .into_iter()
        .filter(|r| seen.insert((r.code.clone(), r.date)))
        .collect();
    if kept.len() < before {
        debug!(dropped = before - kept.len(), "removed duplicate announcements");
    }
    kept
}

/// Concatenate primary then fallback records and deduplicate.
///
/// Primary rows are seen first, so they win over fallback rows with the
/// same `(code, date)`.
pub fn merge_announcements(
    primary: Vec<AnnouncementRecord>,
    fallback: Vec<AnnouncementRecord>,
) -> Vec<AnnouncementRecord> {
    let mut all = primary;
    all.extend(fallback);
    dedupe_announcements(all)
}
