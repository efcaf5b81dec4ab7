//! HTTP client for the identity endpoint. The session token is attached as the
//! workspace cookie and never logged; error bodies are trimmed before they are
//! surfaced.

use super::{Identity, IdentityClient};
use async_trait::async_trait;
use reqwest::{Client, header::COOKIE};
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, time::Duration};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::APP_USER_AGENT;

/// Path of the identity endpoint relative to the API base URL.
pub const IDENTITY_PATH: &str = "/api/auth/me";
/// Default request timeout applied to identity lookups.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error body characters kept in [`IdentityError::Http`].
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
}

/// Fetches `/api/auth/me` with an optional session cookie.
#[derive(Clone)]
pub struct HttpIdentityClient {
    client: Client,
    endpoint: Url,
    session: Option<(String, SecretString)>,
}

impl HttpIdentityClient {
    /// Build a client for the API at `base_url` with the default timeout.
    ///
    /// # Errors
    /// Returns an error if the base URL is empty or invalid, or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str) -> Result<Self, IdentityError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    /// Same as [`HttpIdentityClient::new`].
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, IdentityError> {
        let endpoint = build_endpoint(base_url)?;
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| IdentityError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            endpoint,
            session: None,
        })
    }

    /// Send `cookie_name=<token>` with every lookup.
    #[must_use]
    pub fn with_session(mut self, cookie_name: impl Into<String>, token: SecretString) -> Self {
        self.session = Some((cookie_name.into(), token));
        self
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl fmt::Debug for HttpIdentityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpIdentityClient")
            .field("endpoint", &self.endpoint.as_str())
            .field(
                "session_cookie",
                &self.session.as_ref().map(|(name, _)| name.as_str()),
            )
            .field("session_token", &"***")
            .finish()
    }
}

#[async_trait]
impl IdentityClient for HttpIdentityClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_identity(&self) -> Result<Identity, IdentityError> {
        let mut request = self.client.get(self.endpoint.clone());
        if let Some((name, token)) = &self.session {
            request = request.header(COOKIE, format!("{name}={}", token.expose_secret()));
        }

        let response = request.send().await.map_err(map_request_error)?;
        let status = response.status();
        debug!("identity endpoint responded with {status}");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Http {
                status: status.as_u16(),
                message: sanitize_body(&body),
            });
        }

        response
            .json::<Identity>()
            .await
            .map_err(|err| IdentityError::Parse(format!("Failed to decode response: {err}")))
    }
}

/// Join the API base URL with [`IDENTITY_PATH`].
fn build_endpoint(base_url: &str) -> Result<Url, IdentityError> {
    let base = base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(IdentityError::Config(
            "identity base URL must not be empty".to_string(),
        ));
    }

    Url::parse(&format!("{base}{IDENTITY_PATH}"))
        .map_err(|err| IdentityError::Config(format!("Invalid identity base URL {base}: {err}")))
}

/// Maps transport errors into timeout or network errors.
fn map_request_error(err: reqwest::Error) -> IdentityError {
    if err.is_timeout() {
        IdentityError::Timeout("Identity lookup timed out.".to_string())
    } else {
        IdentityError::Network(format!("Unable to reach the identity endpoint: {err}"))
    }
}

/// Trims and truncates error bodies.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_path() {
        let client = HttpIdentityClient::new("https://api.example.com/").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://api.example.com/api/auth/me"
        );

        let client = HttpIdentityClient::new(" http://127.0.0.1:8080 ").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://127.0.0.1:8080/api/auth/me"
        );
    }

    #[test]
    fn endpoint_rejects_empty_or_invalid_base() {
        assert!(matches!(
            HttpIdentityClient::new("  "),
            Err(IdentityError::Config(_))
        ));
        assert!(matches!(
            HttpIdentityClient::new("not a url"),
            Err(IdentityError::Config(_))
        ));
    }

    #[test]
    fn debug_output_hides_token() {
        let client = HttpIdentityClient::new("https://api.example.com")
            .unwrap()
            .with_session("client_session", SecretString::from("super-secret"));
        let debug = format!("{client:?}");
        assert!(debug.contains("client_session"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn sanitize_body_trims_and_truncates() {
        assert_eq!(sanitize_body("   "), "Request failed.");
        assert_eq!(sanitize_body("  nope \n"), "nope");
        assert_eq!(sanitize_body(&"x".repeat(500)).len(), MAX_ERROR_CHARS);
    }
}
