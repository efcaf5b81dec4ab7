//! Path rules used for the public allow-list and the gate exclusion set.

use std::{fmt, str::FromStr};

use super::GateConfigError;

/// A single path matcher.
///
/// Textual form: `/exact`, `/prefix*` or `/subtree/**`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathRule {
    /// Matches the path exactly.
    Exact(String),
    /// Matches any path starting with the prefix (`/_next` also matches `/_next2`).
    Prefix(String),
    /// Matches the path itself and anything below it (`/sign`, `/sign/42`).
    Subtree(String),
}

impl PathRule {
    #[must_use]
    pub fn exact(path: impl Into<String>) -> Self {
        Self::Exact(path.into())
    }

    #[must_use]
    pub fn prefix(path: impl Into<String>) -> Self {
        Self::Prefix(path.into())
    }

    #[must_use]
    pub fn subtree(path: impl Into<String>) -> Self {
        Self::Subtree(path.into())
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(rule) => path == rule,
            Self::Prefix(rule) => path.starts_with(rule.as_str()),
            Self::Subtree(rule) => path
                .strip_prefix(rule.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        }
    }
}

impl FromStr for PathRule {
    type Err = GateConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if !trimmed.starts_with('/') {
            return Err(GateConfigError::InvalidRule(value.to_string()));
        }

        let rule = if let Some(base) = trimmed.strip_suffix("/**") {
            // `/**` alone would be a subtree of the empty path, i.e. everything.
            if base.is_empty() {
                return Err(GateConfigError::InvalidRule(value.to_string()));
            }
            Self::Subtree(base.to_string())
        } else if let Some(base) = trimmed.strip_suffix('*') {
            if base.is_empty() || base.ends_with('*') {
                return Err(GateConfigError::InvalidRule(value.to_string()));
            }
            Self::Prefix(base.to_string())
        } else {
            Self::Exact(trimmed.to_string())
        };

        Ok(rule)
    }
}

impl fmt::Display for PathRule {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(path) => write!(formatter, "{path}"),
            Self::Prefix(path) => write!(formatter, "{path}*"),
            Self::Subtree(path) => write!(formatter, "{path}/**"),
        }
    }
}

/// True when any rule in `rules` matches `path`.
#[must_use]
pub fn any_match(rules: &[PathRule], path: &str) -> bool {
    rules.iter().any(|rule| rule.matches(path))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn exact_matches_only_itself() {
        let rule = PathRule::exact("/login");
        assert!(rule.matches("/login"));
        assert!(!rule.matches("/login/"));
        assert!(!rule.matches("/login2"));
        assert!(!rule.matches("/"));
    }

    #[test]
    fn prefix_is_a_raw_string_prefix() {
        let rule = PathRule::prefix("/_next");
        assert!(rule.matches("/_next"));
        assert!(rule.matches("/_next/static/chunk.js"));
        assert!(rule.matches("/_nextish"));
        assert!(!rule.matches("/api/_next"));
    }

    #[test]
    fn subtree_respects_segment_boundaries() {
        let rule = PathRule::subtree("/sign");
        assert!(rule.matches("/sign"));
        assert!(rule.matches("/sign/"));
        assert!(rule.matches("/sign/abc/def"));
        assert!(!rule.matches("/signup"));
        assert!(!rule.matches("/client/sign"));
    }

    #[test]
    fn parse_textual_forms() {
        assert_eq!(
            "/login".parse::<PathRule>().unwrap(),
            PathRule::exact("/login")
        );
        assert_eq!(
            "/_next*".parse::<PathRule>().unwrap(),
            PathRule::prefix("/_next")
        );
        assert_eq!(
            " /sign/** ".parse::<PathRule>().unwrap(),
            PathRule::subtree("/sign")
        );
    }

    #[test]
    fn parse_rejects_invalid_rules() {
        for value in ["", "login", "*", "/**", "https://evil.com", "/a**"] {
            assert!(
                value.parse::<PathRule>().is_err(),
                "expected {value:?} to be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_through_parse() {
        for rule in [
            PathRule::exact("/login"),
            PathRule::prefix("/static"),
            PathRule::subtree("/sign"),
        ] {
            assert_eq!(rule.to_string().parse::<PathRule>().unwrap(), rule);
        }
    }

    #[test]
    fn any_match_over_rule_set() {
        let rules = vec![PathRule::exact("/login"), PathRule::prefix("/static")];
        assert!(any_match(&rules, "/static/logo.svg"));
        assert!(!any_match(&rules, "/dashboard"));
        assert!(!any_match(&[], "/login"));
    }
}
