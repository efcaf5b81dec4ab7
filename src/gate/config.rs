//! Per-workspace gate configuration.
//!
//! Each workspace instance builds its own [`GateConfig`] (usually from a
//! [`Workspace`] preset plus CLI overrides) and hands it to
//! [`SessionGate::new`](super::SessionGate::new). Nothing here is global.

use std::{fmt, str::FromStr};

use super::{GateConfigError, rules::PathRule, sanitize::is_same_origin_path};

pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Framework and static-asset prefixes that are always public.
const FRAMEWORK_PUBLIC_PREFIXES: [&str; 3] = ["/_next", "/static", "/favicon"];

/// The browser-facing workspaces served behind the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Workspace {
    Admin,
    Client,
    ProjectManager,
}

impl Workspace {
    pub const ALL: [Self; 3] = [Self::Admin, Self::Client, Self::ProjectManager];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Client => "client",
            Self::ProjectManager => "project-manager",
        }
    }

    #[must_use]
    pub const fn session_cookie(self) -> &'static str {
        match self {
            Self::Admin => "admin_session",
            Self::Client => "client_session",
            Self::ProjectManager => "pm_session",
        }
    }

    #[must_use]
    pub const fn default_landing(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Client => "/client/projects",
            Self::ProjectManager => "/pm/projects",
        }
    }

    /// Public rules specific to this workspace, on top of the shared ones.
    #[must_use]
    pub fn extra_public_rules(self) -> Vec<PathRule> {
        match self {
            // Signing links are shared with people who have not logged in yet;
            // the signing actions themselves are authorized by the API.
            Self::Client => vec![PathRule::subtree("/sign")],
            Self::Admin | Self::ProjectManager => Vec::new(),
        }
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Workspace {
    type Err = GateConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "client" => Ok(Self::Client),
            "project-manager" | "project_manager" | "pm" => Ok(Self::ProjectManager),
            _ => Err(GateConfigError::UnknownWorkspace(value.to_string())),
        }
    }
}

/// Gate settings for one workspace instance.
#[derive(Clone, Debug)]
pub struct GateConfig {
    workspace: Workspace,
    login_path: String,
    default_landing: String,
    session_cookie: String,
    public_rules: Vec<PathRule>,
    excluded_rules: Vec<PathRule>,
}

impl GateConfig {
    /// Preset for `workspace` with the shared framework rules.
    #[must_use]
    pub fn for_workspace(workspace: Workspace) -> Self {
        let mut public_rules = vec![PathRule::exact(DEFAULT_LOGIN_PATH)];
        public_rules.extend(FRAMEWORK_PUBLIC_PREFIXES.into_iter().map(PathRule::prefix));
        public_rules.extend(workspace.extra_public_rules());

        Self {
            workspace,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            default_landing: workspace.default_landing().to_string(),
            session_cookie: workspace.session_cookie().to_string(),
            public_rules,
            excluded_rules: vec![
                PathRule::prefix("/_next/static"),
                PathRule::prefix("/_next/image"),
                PathRule::exact("/favicon.ico"),
                PathRule::exact("/health"),
            ],
        }
    }

    /// Override the login path. The login path is always public.
    #[must_use]
    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        let login_path = login_path.into();
        let previous = PathRule::exact(self.login_path.as_str());
        self.public_rules.retain(|rule| rule != &previous);
        self.public_rules.insert(0, PathRule::exact(login_path.as_str()));
        self.login_path = login_path;
        self
    }

    #[must_use]
    pub fn with_default_landing(mut self, default_landing: impl Into<String>) -> Self {
        self.default_landing = default_landing.into();
        self
    }

    #[must_use]
    pub fn with_session_cookie(mut self, session_cookie: impl Into<String>) -> Self {
        self.session_cookie = session_cookie.into();
        self
    }

    #[must_use]
    pub fn with_public_rule(mut self, rule: PathRule) -> Self {
        if !self.public_rules.contains(&rule) {
            self.public_rules.push(rule);
        }
        self
    }

    #[must_use]
    pub fn with_excluded_rule(mut self, rule: PathRule) -> Self {
        if !self.excluded_rules.contains(&rule) {
            self.excluded_rules.push(rule);
        }
        self
    }

    /// Check the settings that would otherwise turn into broken redirects.
    ///
    /// # Errors
    /// Returns an error when the login or landing path is not a same-origin
    /// relative path, or when the cookie name is empty or malformed.
    pub fn validate(&self) -> Result<(), GateConfigError> {
        if !is_same_origin_path(&self.login_path) {
            return Err(GateConfigError::InvalidLoginPath(self.login_path.clone()));
        }
        if !is_same_origin_path(&self.default_landing) {
            return Err(GateConfigError::InvalidLandingPath(
                self.default_landing.clone(),
            ));
        }
        let cookie = self.session_cookie.trim();
        if cookie.is_empty()
            || cookie
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, ';' | '=' | ','))
        {
            return Err(GateConfigError::InvalidCookieName(
                self.session_cookie.clone(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub const fn workspace(&self) -> Workspace {
        self.workspace
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn default_landing(&self) -> &str {
        &self.default_landing
    }

    #[must_use]
    pub fn session_cookie(&self) -> &str {
        &self.session_cookie
    }

    #[must_use]
    pub fn public_rules(&self) -> &[PathRule] {
        &self.public_rules
    }

    #[must_use]
    pub fn excluded_rules(&self) -> &[PathRule] {
        &self.excluded_rules
    }
}
