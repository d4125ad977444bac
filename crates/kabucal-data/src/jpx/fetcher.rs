//! Download and merge every published announcement spreadsheet.

use super::scrape::extract_spreadsheet_links;
use super::spreadsheet::parse_workbook;
use crate::error::{DataError, Result};
use crate::merge::dedupe_announcements;
use crate::records::AnnouncementRecord;
use std::time::Duration;
use tracing::{error, info, warn};

/// JPX site root, used to resolve relative links.
pub const JPX_BASE_URL: &str = "https://www.jpx.co.jp";

/// Page listing the announcement-schedule spreadsheets.
pub const ANNOUNCEMENT_PAGE_URL: &str =
    "https://www.jpx.co.jp/listing/event-schedules/financial-announcement/index.html";

/// JPX serves the files to browsers only.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Fallback announcement source backed by the JPX spreadsheets.
pub struct JpxFetcher {
    client: reqwest::Client,
    page_url: String,
    base_url: String,
}

impl JpxFetcher {
    /// Fetcher pointed at the public JPX page.
    pub fn new() -> Result<Self> {
        Self::with_urls(ANNOUNCEMENT_PAGE_URL, JPX_BASE_URL)
    }

    /// Fetcher pointed at a custom listing page.
    ///
    /// Relative links resolve against the page's own scheme and host.
    pub fn with_page_url(page_url: &str) -> Result<Self> {
        let base_url = site_root(page_url)?;
        Self::with_urls(page_url, &base_url)
    }

    /// Fetcher pointed at a custom listing page and link base.
    pub fn with_urls(page_url: &str, base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;

        Ok(Self {
            client,
            page_url: page_url.to_string(),
            base_url: base_url.to_string(),
        })
    }

    /// Every announcement found across all spreadsheets.
    ///
    /// Never fails: an unreachable page or a broken file is logged and the
    /// rest of the batch continues. Duplicate `(code, date)` pairs keep their
    /// first occurrence.
    pub async fn fetch_announcements(&self) -> Vec<AnnouncementRecord> {
        let urls = match self.spreadsheet_urls().await {
            Ok(urls) => urls,
            Err(e) => {
                error!(error = %e, "failed to list JPX spreadsheets");
                return Vec::new();
            }
        };
        info!(count = urls.len(), "found JPX spreadsheets");
        if urls.is_empty() {
            warn!("no spreadsheet links on the JPX page");
            return Vec::new();
        }

        let mut files = Vec::with_capacity(urls.len());
        for url in urls {
            info!(%url, "processing spreadsheet");
            let bytes = self.download(&url).await;
            files.push((url, bytes));
        }
        collect_workbooks(files, parse_workbook)
    }

    /// Spreadsheet URLs linked from the listing page.
    pub async fn spreadsheet_urls(&self) -> Result<Vec<String>> {
        let response = self.client.get(&self.page_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let html = response.text().await?;
        extract_spreadsheet_links(&html, &self.base_url)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// `scheme://host[:port]` of an absolute URL.
pub fn site_root(url: &str) -> Result<String> {
    let parsed =
        reqwest::Url::parse(url).map_err(|e| DataError::Parse(format!("invalid URL {url}: {e}")))?;
    if !parsed.has_host() {
        return Err(DataError::Parse(format!("URL has no host: {url}")));
    }
    Ok(parsed.origin().ascii_serialization())
}

/// Parse each downloaded file, skipping the ones that failed to download or
/// parse, then dedupe across files.
fn collect_workbooks<I, P>(files: I, parse: P) -> Vec<AnnouncementRecord>
where
    I: IntoIterator<Item = (String, Result<Vec<u8>>)>,
    P: Fn(&[u8]) -> Result<Vec<AnnouncementRecord>>,
{
    let mut all = Vec::new();
    for (url, bytes) in files {
        match bytes.and_then(|bytes| parse(&bytes)) {
            Ok(records) => all.extend(records),
            Err(e) => error!(%url, error = %e, "failed to load spreadsheet"),
        }
    }

    if all.is_empty() {
        warn!("no usable rows in any JPX spreadsheet");
        return all;
    }
    let merged = dedupe_announcements(all);
    info!(rows = merged.len(), "JPX announcements ready");
    merged
}

impl std::fmt::Debug for JpxFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JpxFetcher")
            .field("page_url", &self.page_url)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
