//! Spreadsheet link discovery on the JPX announcement page.

use crate::error::{DataError, Result};
use scraper::{Html, Selector};
use std::collections::HashSet;

/// File extension of the published schedules.
pub const SPREADSHEET_EXTENSION: &str = ".xlsx";

/// Collect every `.xlsx` link in `html`, resolved against `base_url`.
///
/// Order follows the page; repeated links are dropped.
pub fn extract_spreadsheet_links(html: &str, base_url: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let anchors =
        Selector::parse("a[href]").map_err(|e| DataError::Parse(format!("selector error: {e:?}")))?;

    let mut seen = HashSet::new();
    let links = document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| href.ends_with(SPREADSHEET_EXTENSION))
        .map(|href| resolve_link(href, base_url))
        .filter(|url| seen.insert(url.clone()))
        .collect();

    Ok(links)
}

/// Turn an href into an absolute URL.
pub fn resolve_link(href: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}
