use crate::gate::{GateConfig, PathRule, Workspace};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, builder::ValueParser};

pub const ARG_WORKSPACE: &str = "workspace";
pub const ARG_LOGIN_PATH: &str = "login-path";
pub const ARG_LANDING_PATH: &str = "landing-path";
pub const ARG_SESSION_COOKIE: &str = "session-cookie";
pub const ARG_PUBLIC_PATH: &str = "public-path";
pub const ARG_EXCLUDED_PATH: &str = "excluded-path";

#[derive(Debug, Clone)]
pub struct Options {
    pub workspace: Workspace,
    pub login_path: Option<String>,
    pub landing_path: Option<String>,
    pub session_cookie: Option<String>,
    pub public_rules: Vec<PathRule>,
    pub excluded_rules: Vec<PathRule>,
}

impl Options {
    /// Parse gate arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the workspace argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let workspace = matches
            .get_one::<Workspace>(ARG_WORKSPACE)
            .copied()
            .context("missing required argument: --workspace")?;

        let read_optional = |id: &str| {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let read_rules = |id: &str| -> Vec<PathRule> {
            matches
                .get_many::<PathRule>(id)
                .map(|rules| rules.cloned().collect())
                .unwrap_or_default()
        };

        Ok(Self {
            workspace,
            login_path: read_optional(ARG_LOGIN_PATH),
            landing_path: read_optional(ARG_LANDING_PATH),
            session_cookie: read_optional(ARG_SESSION_COOKIE),
            public_rules: read_rules(ARG_PUBLIC_PATH),
            excluded_rules: read_rules(ARG_EXCLUDED_PATH),
        })
    }

    /// Workspace preset with the overrides applied.
    ///
    /// # Errors
    /// Returns an error if the resulting configuration is invalid.
    pub fn into_config(self) -> Result<GateConfig> {
        let mut config = GateConfig::for_workspace(self.workspace);
        if let Some(login_path) = self.login_path {
            config = config.with_login_path(login_path);
        }
        if let Some(landing_path) = self.landing_path {
            config = config.with_default_landing(landing_path);
        }
        if let Some(session_cookie) = self.session_cookie {
            config = config.with_session_cookie(session_cookie);
        }
        for rule in self.public_rules {
            config = config.with_public_rule(rule);
        }
        for rule in self.excluded_rules {
            config = config.with_excluded_rule(rule);
        }

        config.validate().context("invalid gate configuration")?;
        Ok(config)
    }
}

fn workspace_parser() -> ValueParser {
    ValueParser::from(|value: &str| value.parse::<Workspace>().map_err(|e| e.to_string()))
}

fn path_rule_parser() -> ValueParser {
    ValueParser::from(|value: &str| value.parse::<PathRule>().map_err(|e| e.to_string()))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_WORKSPACE)
                .short('w')
                .long(ARG_WORKSPACE)
                .help("Workspace served behind the gate: admin, client, project-manager")
                .env("PORTAL_GATE_WORKSPACE")
                .required(true)
                .value_parser(workspace_parser()),
        )
        .arg(
            Arg::new(ARG_LOGIN_PATH)
                .long(ARG_LOGIN_PATH)
                .help("Login page path (default: /login)")
                .env("PORTAL_GATE_LOGIN_PATH"),
        )
        .arg(
            Arg::new(ARG_LANDING_PATH)
                .long(ARG_LANDING_PATH)
                .help("Default post-login landing path (default: per workspace)")
                .env("PORTAL_GATE_LANDING_PATH"),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE)
                .long(ARG_SESSION_COOKIE)
                .help("Session cookie name (default: per workspace)")
                .env("PORTAL_GATE_SESSION_COOKIE"),
        )
        .arg(
            Arg::new(ARG_PUBLIC_PATH)
                .long(ARG_PUBLIC_PATH)
                .help("Extra public path rule: /exact, /prefix* or /subtree/** (repeatable)")
                .env("PORTAL_GATE_PUBLIC_PATHS")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .value_parser(path_rule_parser()),
        )
        .arg(
            Arg::new(ARG_EXCLUDED_PATH)
                .long(ARG_EXCLUDED_PATH)
                .help("Extra path rule the gate does not run for (repeatable)")
                .env("PORTAL_GATE_EXCLUDED_PATHS")
                .action(ArgAction::Append)
                .value_delimiter(',')
                .value_parser(path_rule_parser()),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn command() -> Command {
        with_args(Command::new("portal-gate"))
    }

    #[test]
    fn parses_workspace_and_overrides() {
        temp_env::with_vars_unset(
            [
                "PORTAL_GATE_WORKSPACE",
                "PORTAL_GATE_LOGIN_PATH",
                "PORTAL_GATE_LANDING_PATH",
                "PORTAL_GATE_SESSION_COOKIE",
                "PORTAL_GATE_PUBLIC_PATHS",
                "PORTAL_GATE_EXCLUDED_PATHS",
            ],
            || {
                let matches = command().get_matches_from(vec![
                    "portal-gate",
                    "--workspace",
                    "client",
                    "--landing-path",
                    "/client/home",
                    "--public-path",
                    "/status",
                    "--public-path",
                    "/docs/**,/assets*",
                ]);
                let options = Options::parse(&matches).unwrap();
                assert_eq!(options.workspace, Workspace::Client);
                assert_eq!(options.landing_path.as_deref(), Some("/client/home"));
                assert_eq!(
                    options.public_rules,
                    vec![
                        PathRule::exact("/status"),
                        PathRule::subtree("/docs"),
                        PathRule::prefix("/assets"),
                    ]
                );

                let config = options.into_config().unwrap();
                assert_eq!(config.default_landing(), "/client/home");
                assert_eq!(config.session_cookie(), "client_session");
                assert!(config.public_rules().contains(&PathRule::subtree("/sign")));
            },
        );
    }

    #[test]
    fn reads_env() {
        temp_env::with_vars(
            [
                ("PORTAL_GATE_WORKSPACE", Some("project-manager")),
                ("PORTAL_GATE_SESSION_COOKIE", Some("pm_sid")),
                ("PORTAL_GATE_EXCLUDED_PATHS", Some("/metrics,/ready")),
                ("PORTAL_GATE_LOGIN_PATH", None),
                ("PORTAL_GATE_LANDING_PATH", None),
                ("PORTAL_GATE_PUBLIC_PATHS", None),
            ],
            || {
                let matches = command().get_matches_from(vec!["portal-gate"]);
                let config = Options::parse(&matches).unwrap().into_config().unwrap();
                assert_eq!(config.workspace(), Workspace::ProjectManager);
                assert_eq!(config.session_cookie(), "pm_sid");
                assert!(config.excluded_rules().contains(&PathRule::exact("/metrics")));
                assert!(config.excluded_rules().contains(&PathRule::exact("/ready")));
            },
        );
    }

    #[test]
    fn rejects_invalid_values() {
        temp_env::with_vars_unset(["PORTAL_GATE_WORKSPACE", "PORTAL_GATE_PUBLIC_PATHS"], || {
            assert!(
                command()
                    .try_get_matches_from(vec!["portal-gate", "--workspace", "backoffice"])
                    .is_err()
            );
            assert!(
                command()
                    .try_get_matches_from(vec![
                        "portal-gate",
                        "--workspace",
                        "admin",
                        "--public-path",
                        "status"
                    ])
                    .is_err()
            );
            assert!(
                command()
                    .try_get_matches_from(vec!["portal-gate"])
                    .is_err()
            );
        });
    }

    #[test]
    fn invalid_landing_path_fails_validation() {
        temp_env::with_vars_unset(["PORTAL_GATE_WORKSPACE", "PORTAL_GATE_LANDING_PATH"], || {
            let matches = command().get_matches_from(vec![
                "portal-gate",
                "--workspace",
                "admin",
                "--landing-path",
                "//evil.com",
            ]);
            assert!(Options::parse(&matches).unwrap().into_config().is_err());
        });
    }
}
