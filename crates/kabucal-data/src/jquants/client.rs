//! J-Quants REST client with cursor pagination.

use super::rows::{AnnouncementRow, DailyQuoteRow, ListedInfoRow, TradingCalendarRow};
use super::session::Session;
use crate::dates::DateRange;
use crate::error::{DataError, Result};
use crate::frame::IntoFrame;
use polars::prelude::{DataFrame, PolarsResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, error, info};

/// Response field carrying the next-page cursor.
const PAGINATION_KEY: &str = "pagination_key";

/// Rows accumulated across every page of one resource call.
///
/// An empty value means "unknown": either the API had nothing, or the call
/// failed and the failure was logged.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    /// Decoded rows in API order.
    pub rows: Vec<T>,
}

impl<T> Fetched<T> {
    /// No rows.
    pub const fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows were fetched.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: IntoFrame> Fetched<T> {
    /// The same rows as a DataFrame.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        T::to_frame(&self.rows)
    }
}

impl<T> Default for Fetched<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Raw HTTP outcome, used when the error body itself is the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body text, verbatim.
    pub body: String,
}

/// Thin client over the J-Quants v1 resources.
///
/// Borrows the run's single [`Session`]; every call checks token freshness
/// first and is skipped outright when the session is disabled.
#[derive(Debug, Clone, Copy)]
pub struct JQuantsClient<'a> {
    session: &'a Session,
}

impl<'a> JQuantsClient<'a> {
    /// Create a client bound to a session.
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// The session this client uses.
    pub const fn session(&self) -> &'a Session {
        self.session
    }

    /// Earnings announcement schedule (`/v1/fins/announcement`).
    pub async fn announcements(&self) -> Fetched<AnnouncementRow> {
        self.fetch_resource("/v1/fins/announcement", "announcement", Vec::new())
            .await
    }

    /// Trading calendar (`/v1/markets/trading_calendar`).
    pub async fn trading_calendar(&self, range: DateRange) -> Fetched<TradingCalendarRow> {
        self.trading_calendar_filtered(None, range).await
    }

    /// Trading calendar restricted to one holiday division.
    pub async fn trading_calendar_filtered(
        &self,
        holiday_division: Option<i64>,
        range: DateRange,
    ) -> Fetched<TradingCalendarRow> {
        self.fetch_resource(
            "/v1/markets/trading_calendar",
            "trading_calendar",
            trading_calendar_params(holiday_division, range),
        )
        .await
    }

    /// Listed issue information (`/v1/listed/info`).
    pub async fn listed_info(&self, code: Option<&str>, date: Option<&str>) -> Fetched<ListedInfoRow> {
        let mut params = Vec::new();
        if let Some(code) = code.filter(|c| !c.is_empty()) {
            params.push(("code", code.to_string()));
        }
        if let Some(date) = date.filter(|d| !d.is_empty()) {
            params.push(("date", date.to_string()));
        }
        self.fetch_resource("/v1/listed/info", "info", params).await
    }

    /// Daily OHLCV quotes (`/v1/prices/daily_quotes`).
    pub async fn daily_quotes(&self, code: &str, range: Option<DateRange>) -> Fetched<DailyQuoteRow> {
        let mut params = vec![("code", code.to_string())];
        if let Some(range) = range {
            params.push(("from", range.from_param()));
            params.push(("to", range.to_param()));
        }
        self.fetch_resource("/v1/prices/daily_quotes", "daily_quotes", params)
            .await
    }

    /// Re-issue a trading-calendar request and return the raw response.
    ///
    /// Used to read the server's error message when the structured call came
    /// back empty.
    pub async fn trading_calendar_raw(&self, range: DateRange) -> Result<RawResponse> {
        self.get_raw(
            "/v1/markets/trading_calendar",
            &trading_calendar_params(None, range),
        )
        .await
    }

    async fn fetch_resource<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        params: Vec<(&'static str, String)>,
    ) -> Fetched<T> {
        if !self.session.is_enabled() {
            debug!(path, "session disabled, skipping request");
            return Fetched::empty();
        }

        match self.get_paginated(path, key, params).await {
            Ok(rows) => {
                info!(path, rows = rows.len(), "fetched");
                Fetched { rows }
            }
            Err(DataError::Http { status, body }) => {
                error!(path, status, %body, "API error");
                Fetched::empty()
            }
            Err(e) => {
                error!(path, error = %e, "request failed");
                Fetched::empty()
            }
        }
    }

    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        key: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<Vec<T>> {
        collect_pages(key, params, |params| async move {
            self.get_raw(path, &params).await
        })
        .await
    }

    async fn get_raw(&self, path: &str, params: &[(&'static str, String)]) -> Result<RawResponse> {
        self.session.ensure_fresh().await;
        let headers = self.session.authorized_headers().await.unwrap_or_default();

        let url = format!("{}{}", self.session.base_url(), path);
        let response = self
            .session
            .http()
            .get(&url)
            .headers(headers)
            .query(params)
            .send()
            .await
            .map_err(DataError::Network)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(DataError::Network)?;
        Ok(RawResponse { status, body })
    }
}

/// Follow `pagination_key` until the server stops returning one.
///
/// `fetch` performs one request with the given query; the cursor from each
/// page is written back into the query for the next call.
async fn collect_pages<T, F, Fut>(
    key: &str,
    mut params: Vec<(&'static str, String)>,
    mut fetch: F,
) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: FnMut(Vec<(&'static str, String)>) -> Fut,
    Fut: Future<Output = Result<RawResponse>>,
{
    let mut rows = Vec::new();
    loop {
        let raw = fetch(params.clone()).await?;
        if raw.status != 200 {
            return Err(DataError::Http {
                status: raw.status,
                body: raw.body,
            });
        }

        let page: Value = serde_json::from_str(&raw.body)?;
        let (mut page_rows, cursor) = split_page::<T>(page, key)?;
        debug!(key, page_rows = page_rows.len(), "page received");
        rows.append(&mut page_rows);

        match cursor {
            Some(cursor) => set_param(&mut params, PAGINATION_KEY, cursor),
            None => break,
        }
    }
    Ok(rows)
}

fn trading_calendar_params(
    holiday_division: Option<i64>,
    range: DateRange,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(3);
    if let Some(division) = holiday_division {
        params.push(("holidaydivision", division.to_string()));
    }
    params.push(("from", range.from_param()));
    params.push(("to", range.to_param()));
    params
}

fn set_param(params: &mut Vec<(&'static str, String)>, name: &'static str, value: String) {
    match params.iter_mut().find(|(k, _)| *k == name) {
        Some(entry) => entry.1 = value,
        None => params.push((name, value)),
    }
}

/// Pull the row array and the next cursor out of one page.
fn split_page<T: DeserializeOwned>(page: Value, key: &str) -> Result<(Vec<T>, Option<String>)> {
    let Value::Object(mut map) = page else {
        return Err(DataError::Parse("page is not a JSON object".to_string()));
    };
    let rows = match map.remove(key) {
        Some(items) => serde_json::from_value(items)?,
        None => {
            return Err(DataError::Api(format!("response has no `{key}` field")));
        }
    };
    let cursor = match map.remove(PAGINATION_KEY) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    Ok((rows, cursor))
}
