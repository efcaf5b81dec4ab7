//! Forwarding of gated requests to the upstream workspace.
//!
//! Method, path, query, headers and body are passed through. Hop-by-hop headers
//! are dropped in both directions and upstream redirects are returned to the
//! browser instead of being followed.

use anyhow::{Context, Result, anyhow};
use axum::{
    body::{Body, to_bytes},
    extract::{Extension, Request},
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{CONTENT_LENGTH, HOST},
        uri::PathAndQuery,
    },
    response::{IntoResponse, Response},
};
use reqwest::{Client, redirect::Policy};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, instrument};
use url::Url;

use crate::APP_USER_AGENT;

/// Largest request body forwarded upstream.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// The workspace application behind the gate.
#[derive(Clone, Debug)]
pub struct Upstream {
    client: Client,
    base_url: Url,
}

impl Upstream {
    /// # Errors
    /// Returns an error if `base_url` is not an absolute http(s) URL or the HTTP
    /// client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim())
            .with_context(|| format!("Invalid upstream URL: {base_url}"))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.host_str().is_none() {
            return Err(anyhow!(
                "Upstream URL must be an http(s) URL with a host: {base_url}"
            ));
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .redirect(Policy::none())
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Upstream URL for an inbound `path?query`, keeping any base path prefix.
    ///
    /// # Errors
    /// Returns an error if the joined URL is invalid.
    pub fn target(&self, path_and_query: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let joined = format!("{base}{path_and_query}");
        Url::parse(&joined).with_context(|| format!("Invalid upstream target: {joined}"))
    }
}

// axum fallback handler: forward everything the gate let through
#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn forward(
    Extension(upstream): Extension<Arc<Upstream>>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or("/", PathAndQuery::as_str);

    let target = match upstream.target(path_and_query) {
        Ok(target) => target,
        Err(err) => {
            error!("Failed to build upstream URL: {err:#}");
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(err) => {
            debug!("Rejecting request body: {err}");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let mut headers = parts.headers;
    let original_host = headers.remove(HOST);
    strip_hop_by_hop(&mut headers);
    headers.remove(CONTENT_LENGTH);
    if let Some(host) = original_host {
        headers.insert(X_FORWARDED_HOST, host);
    }

    let response = match upstream
        .client
        .request(parts.method, target)
        .headers(headers)
        .body(body)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            error!("Upstream request failed: {err}");
            let status = if err.is_timeout() {
                StatusCode::GATEWAY_TIMEOUT
            } else {
                StatusCode::BAD_GATEWAY
            };
            return status.into_response();
        }
    };

    let status = response.status();
    let mut response_headers = response.headers().clone();
    strip_hop_by_hop(&mut response_headers);
    response_headers.remove(CONTENT_LENGTH);

    debug!("upstream responded with {status}");

    // Chunks are relayed as they arrive; the response body is never buffered.
    (
        status,
        response_headers,
        Body::from_stream(response.bytes_stream()),
    )
        .into_response()
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named in `Connection` are hop-by-hop as well.
    let named: Vec<HeaderName> = headers
        .get_all("connection")
        .iter()
        .filter_map(|value: &HeaderValue| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upstream_requires_http_url() {
        assert!(Upstream::new("http://127.0.0.1:3000", Duration::from_secs(1)).is_ok());
        assert!(Upstream::new("ftp://example.com", Duration::from_secs(1)).is_err());
        assert!(Upstream::new("/relative", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn target_keeps_base_path_and_query() {
        let upstream = Upstream::new("http://web:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            upstream.target("/client/projects?tab=2").unwrap().as_str(),
            "http://web:3000/client/projects?tab=2"
        );

        let upstream = Upstream::new("http://web:3000/app", Duration::from_secs(1)).unwrap();
        assert_eq!(
            upstream.target("/login").unwrap().as_str(),
            "http://web:3000/app/login"
        );
    }

    #[test]
    fn hop_by_hop_headers_are_removed() {
        let mut headers = HeaderMap::new();
        headers.insert("connection", HeaderValue::from_static("keep-alive, x-debug"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-debug", HeaderValue::from_static("1"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("cookie", HeaderValue::from_static("client_session=abc"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key("cookie"));
    }
}
