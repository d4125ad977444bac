//! JPX announcement-schedule spreadsheets (fallback source).

pub mod fetcher;
pub mod scrape;
pub mod spreadsheet;

pub use fetcher::{ANNOUNCEMENT_PAGE_URL, JPX_BASE_URL, JpxFetcher, site_root};
pub use scrape::extract_spreadsheet_links;
pub use spreadsheet::{HEADER_ROW, parse_sheet, parse_workbook};
