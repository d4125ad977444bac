//! J-Quants API access (primary source).
//!
//! # Example
//!
//! ```no_run
//! use kabucal_data::dates::DateRange;
//! use kabucal_data::jquants::{Credentials, JQuantsClient, Session, fetch_trading_calendar};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> kabucal_data::Result<()> {
//!     let session = Session::initialize(&Credentials::from_env()).await?;
//!     let client = JQuantsClient::new(&session);
//!
//!     let announcements = client.announcements().await;
//!     println!("{} announcements", announcements.len());
//!
//!     let today = chrono::Local::now().date_naive();
//!     let days = fetch_trading_calendar(&client, DateRange::forward(today, 30)?).await;
//!     println!("{} holidays", days.iter().filter(|d| d.is_holiday()).count());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod entitlement;
pub mod rows;
pub mod session;

pub use client::{Fetched, JQuantsClient, RawResponse};
pub use entitlement::{extract_permitted_range, fetch_trading_calendar, permitted_range};
pub use rows::{AnnouncementRow, DailyQuoteRow, ListedInfoRow, TradingCalendarRow};
pub use session::{Credentials, JQUANTS_BASE_URL, Session, SessionState};
