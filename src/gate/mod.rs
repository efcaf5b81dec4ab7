//! Edge session gate.
//!
//! Flow Overview:
//! 1) Classify the request path against the public allow-list (fail-closed).
//! 2) Protected path without a session cookie: redirect to login with `next`.
//! 3) Login path with a session cookie: redirect to the sanitized `next` target.
//! 4) Anything else continues to the workspace.
//!
//! The gate never validates the token itself. It only decides whether it is
//! worth rendering a protected page; the API re-authorizes every call.

pub mod config;
pub mod cookie;
pub mod rules;
pub mod sanitize;

pub use config::{GateConfig, Workspace};
pub use cookie::extract_cookie;
pub use rules::PathRule;
pub use sanitize::sanitize_next_path;

use axum::http::HeaderMap;
use thiserror::Error;
use tracing::debug;
use url::form_urlencoded;

/// Query parameter carrying the post-login target.
pub const NEXT_PARAM: &str = "next";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateConfigError {
    #[error("unknown workspace: {0}")]
    UnknownWorkspace(String),
    #[error("invalid path rule {0:?}: rules must start with '/' (use '/prefix*' or '/subtree/**')")]
    InvalidRule(String),
    #[error("invalid login path {0:?}: must be a same-origin relative path")]
    InvalidLoginPath(String),
    #[error("invalid default landing path {0:?}: must be a same-origin relative path")]
    InvalidLandingPath(String),
    #[error("invalid session cookie name {0:?}")]
    InvalidCookieName(String),
}

/// The parts of an inbound request the gate looks at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub path: String,
    pub query: Option<String>,
    pub session_token: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Raw query string, without the leading `?`. Empty queries are dropped.
    #[must_use]
    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query.filter(|q| !q.is_empty()).map(str::to_string);
        self
    }

    /// Session token, if any. Empty tokens are treated as absent.
    #[must_use]
    pub fn with_session_token(mut self, token: Option<String>) -> Self {
        self.session_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Build a context from request parts, reading the token from `cookie_name`.
    #[must_use]
    pub fn from_parts(
        path: &str,
        query: Option<&str>,
        headers: &HeaderMap,
        cookie_name: &str,
    ) -> Self {
        Self::new(path)
            .with_query(query)
            .with_session_token(extract_cookie(headers, cookie_name))
    }

    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.session_token.is_some()
    }

    /// First value of query parameter `name`, percent-decoded.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Path plus query string, as the browser requested it.
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{query}", self.path),
            None => self.path.clone(),
        }
    }
}

/// Outcome of a gate decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateAction {
    Continue,
    RedirectTo(String),
}

/// Stateless per-workspace gate.
#[derive(Clone, Debug)]
pub struct SessionGate {
    config: GateConfig,
}

impl SessionGate {
    #[must_use]
    pub const fn new(config: GateConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &GateConfig {
        &self.config
    }

    /// True when the gate should not run for `path` at all.
    #[must_use]
    pub fn is_excluded(&self, path: &str) -> bool {
        rules::any_match(self.config.excluded_rules(), path)
    }

    /// True when `path` is on the public allow-list. Unknown paths are protected.
    #[must_use]
    pub fn is_public(&self, path: &str) -> bool {
        rules::any_match(self.config.public_rules(), path)
    }

    #[must_use]
    pub fn decide(&self, request: &RequestContext) -> GateAction {
        let path = request.path.as_str();

        if !request.has_session() && !self.is_public(path) {
            let target = self.login_redirect(request);
            debug!(path, workspace = %self.config.workspace(), "no session, redirecting to login");
            return GateAction::RedirectTo(target);
        }

        if request.has_session() && path == self.config.login_path() {
            let next = request.query_param(NEXT_PARAM);
            let target = sanitize_next_path(next.as_deref(), self.config.default_landing());
            debug!(target = %target, "session present on login page, redirecting");
            return GateAction::RedirectTo(target);
        }

        GateAction::Continue
    }

    /// `login?next=<path+query>` for the current request.
    #[must_use]
    pub fn login_redirect(&self, request: &RequestContext) -> String {
        let next: String = form_urlencoded::Serializer::new(String::new())
            .append_pair(NEXT_PARAM, &request.path_and_query())
            .finish();
        format!("{}?{next}", self.config.login_path())
    }
}
