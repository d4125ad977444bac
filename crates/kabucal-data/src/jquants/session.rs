//! J-Quants authentication: refresh token and short-lived id token.

use crate::error::{DataError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// J-Quants API base URL
pub const JQUANTS_BASE_URL: &str = "https://api.jquants.com";

/// Environment variable holding the account email address.
pub const EMAIL_ENV: &str = "JQuants_EMAIL_ADDRESS";

/// Environment variable holding the account password.
pub const PASSWORD_ENV: &str = "JQuants_PASSWORD";

/// Validity window of an id token, in hours.
const ID_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Account credentials; either field may be missing.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Account email address.
    pub email: Option<String>,
    /// Account password.
    pub password: Option<String>,
}

impl Credentials {
    /// Build credentials from explicit values.
    pub fn new(email: Option<String>, password: Option<String>) -> Self {
        Self { email, password }
    }

    /// Read credentials from `JQuants_EMAIL_ADDRESS` / `JQuants_PASSWORD`.
    pub fn from_env() -> Self {
        Self {
            email: std::env::var(EMAIL_ENV).ok(),
            password: std::env::var(PASSWORD_ENV).ok(),
        }
    }

    /// Both values, when both are present and non-empty.
    pub fn pair(&self) -> Option<(&str, &str)> {
        let email = self.email.as_deref().filter(|s| !s.is_empty())?;
        let password = self.password.as_deref().filter(|s| !s.is_empty())?;
        Some((email, password))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Whether the primary source can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Tokens were obtained; API calls are attempted.
    Enabled,
    /// No credentials or authentication failed; API calls are skipped.
    Disabled,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenResponse {
    refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdTokenResponse {
    id_token: String,
}

/// Mutable token record, refreshed in place.
#[derive(Clone)]
pub(crate) struct TokenState {
    refresh_token: String,
    id_token: String,
    expires_at: DateTime<Utc>,
}

impl TokenState {
    fn issued(refresh_token: String, id_token: String, now: DateTime<Utc>) -> Self {
        Self {
            refresh_token,
            id_token,
            expires_at: now + Duration::hours(ID_TOKEN_LIFETIME_HOURS),
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Authenticated J-Quants session.
///
/// Build exactly one per run and lend it to every client that needs it.
/// A session in the [`SessionState::Disabled`] state never touches the
/// network.
pub struct Session {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<Mutex<TokenState>>,
}

impl Session {
    /// Authenticate against the default J-Quants endpoint.
    ///
    /// Missing credentials are not an error: the session comes back
    /// disabled. Only failing to build the HTTP client is reported.
    pub async fn initialize(credentials: &Credentials) -> Result<Self> {
        Self::initialize_with_base_url(credentials, JQUANTS_BASE_URL).await
    }

    /// Authenticate against a custom base URL.
    pub async fn initialize_with_base_url(
        credentials: &Credentials,
        base_url: &str,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(DataError::Network)?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let Some((email, password)) = credentials.pair() else {
            warn!("J-Quants credentials are not set; primary source disabled");
            return Ok(Self {
                http,
                base_url,
                tokens: None,
            });
        };

        let tokens = match authenticate(&http, &base_url, email, password).await {
            Ok(tokens) => {
                info!("J-Quants session ready");
                Some(Mutex::new(tokens))
            }
            Err(e) => {
                error!(error = %e, "J-Quants authentication failed; primary source disabled");
                None
            }
        };

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// A session that never calls the API.
    pub fn disabled() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: JQUANTS_BASE_URL.to_string(),
            tokens: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_tokens(tokens: TokenState) -> Self {
        Self::with_tokens_at(tokens, JQUANTS_BASE_URL)
    }

    #[cfg(test)]
    pub(crate) fn with_tokens_at(tokens: TokenState, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: Some(Mutex::new(tokens)),
        }
    }

    /// Current state.
    pub const fn state(&self) -> SessionState {
        if self.tokens.is_some() {
            SessionState::Enabled
        } else {
            SessionState::Disabled
        }
    }

    /// Shorthand for `state() == Enabled`.
    pub const fn is_enabled(&self) -> bool {
        matches!(self.state(), SessionState::Enabled)
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Refresh the id token if it has expired.
    ///
    /// Returns `false` only when a refresh was needed and failed; the caller
    /// proceeds anyway and lets the next request fail on its own.
    pub async fn ensure_fresh(&self) -> bool {
        let Some(tokens) = &self.tokens else {
            return true;
        };
        let mut tokens = tokens.lock().await;
        let now = Utc::now();
        if !tokens.is_expired(now) {
            return true;
        }

        info!("id token expired, refreshing");
        match fetch_id_token(&self.http, &self.base_url, &tokens.refresh_token).await {
            Ok(id_token) => {
                *tokens = TokenState::issued(tokens.refresh_token.clone(), id_token, now);
                info!("id token refreshed");
                true
            }
            Err(e) => {
                error!(error = %e, "id token refresh failed");
                false
            }
        }
    }

    /// `Authorization: Bearer …` header, if the session is enabled.
    pub async fn authorized_headers(&self) -> Option<HeaderMap> {
        let tokens = self.tokens.as_ref()?.lock().await;
        let value = HeaderValue::from_str(&format!("Bearer {}", tokens.id_token)).ok()?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Some(headers)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn authenticate(
    http: &reqwest::Client,
    base_url: &str,
    email: &str,
    password: &str,
) -> Result<TokenState> {
    let refresh_token = fetch_refresh_token(http, base_url, email, password).await?;
    let id_token = fetch_id_token(http, base_url, &refresh_token).await?;
    Ok(TokenState::issued(refresh_token, id_token, Utc::now()))
}

async fn fetch_refresh_token(
    http: &reqwest::Client,
    base_url: &str,
    email: &str,
    password: &str,
) -> Result<String> {
    let body = serde_json::json!({
        "mailaddress": email,
        "password": password,
    });
    let response = http
        .post(format!("{base_url}/v1/token/auth_user"))
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DataError::Auth(format!(
            "refresh token request failed: HTTP {status}: {body}"
        )));
    }

    let token: RefreshTokenResponse = response.json().await?;
    Ok(token.refresh_token)
}

async fn fetch_id_token(
    http: &reqwest::Client,
    base_url: &str,
    refresh_token: &str,
) -> Result<String> {
    let response = http
        .post(format!("{base_url}/v1/token/auth_refresh"))
        .query(&[("refreshtoken", refresh_token)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DataError::Auth(format!(
            "id token request failed: HTTP {status}: {body}"
        )));
    }

    let token: IdTokenResponse = response.json().await?;
    Ok(token.id_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_expiring(at: DateTime<Utc>) -> TokenState {
        TokenState {
            refresh_token: "refresh".to_string(),
            id_token: "id-token".to_string(),
            expires_at: at,
        }
    }

    #[test]
    fn test_credentials_pair_requires_both() {
        assert!(Credentials::new(None, None).pair().is_none());
        assert!(Credentials::new(Some("a@b.jp".into()), None).pair().is_none());
        assert!(
            Credentials::new(Some(String::new()), Some("pw".into()))
                .pair()
                .is_none()
        );
        assert_eq!(
            Credentials::new(Some("a@b.jp".into()), Some("pw".into())).pair(),
            Some(("a@b.jp", "pw"))
        );
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials::new(Some("a@b.jp".into()), Some("secret".into()));
        let shown = format!("{creds:?}");
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_token_lifetime() {
        let now = Utc::now();
        let tokens = TokenState::issued("r".into(), "i".into(), now);
        assert!(!tokens.is_expired(now));
        assert!(!tokens.is_expired(now + Duration::hours(23)));
        assert!(tokens.is_expired(now + Duration::hours(24)));
    }

    #[tokio::test]
    async fn test_missing_credentials_disable_session() {
        let session = Session::initialize(&Credentials::default()).await.unwrap();
        assert_eq!(session.state(), SessionState::Disabled);
        assert!(session.authorized_headers().await.is_none());
        assert!(session.ensure_fresh().await);
    }

    #[tokio::test]
    async fn test_authorized_headers_carry_bearer_token() {
        let session = Session::with_tokens(tokens_expiring(Utc::now() + Duration::hours(1)));
        assert!(session.is_enabled());
        let headers = session.authorized_headers().await.unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer id-token");
    }

    #[tokio::test]
    async fn test_fresh_token_skips_refresh() {
        let session = Session::with_tokens(tokens_expiring(Utc::now() + Duration::hours(1)));
        assert!(session.ensure_fresh().await);
        let headers = session.authorized_headers().await.unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer id-token");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_old_token() {
        // Nothing listens on port 9, so the refresh request fails to connect.
        let session = Session::with_tokens_at(
            tokens_expiring(Utc::now() - Duration::hours(1)),
            "http://127.0.0.1:9/",
        );
        assert_eq!(session.base_url(), "http://127.0.0.1:9");

        assert!(!session.ensure_fresh().await);

        assert!(session.is_enabled());
        let headers = session.authorized_headers().await.unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer id-token");
        // Still expired, so the next call tries again.
        assert!(!session.ensure_fresh().await);
    }
}
