use crate::gate::Workspace;
use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, builder::ValueParser};
use secrecy::SecretString;

pub const ARG_IDENTITY_URL: &str = "identity-url";
pub const ARG_SESSION_TOKEN: &str = "session-token";
pub const ARG_WORKSPACE: &str = "workspace";
pub const ARG_TIMEOUT: &str = "timeout-seconds";

#[derive(Debug)]
pub struct Options {
    pub identity_url: String,
    pub session_token: SecretString,
    pub workspace: Workspace,
    pub timeout_seconds: u64,
}

impl Options {
    /// Parse identity lookup arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the identity URL or session token is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let identity_url = matches
            .get_one::<String>(ARG_IDENTITY_URL)
            .cloned()
            .context("missing required argument: --identity-url")?;
        let session_token = matches
            .get_one::<String>(ARG_SESSION_TOKEN)
            .cloned()
            .filter(|token| !token.trim().is_empty())
            .map(SecretString::from)
            .context("missing required argument: --session-token")?;
        let workspace = matches
            .get_one::<Workspace>(ARG_WORKSPACE)
            .copied()
            .unwrap_or(Workspace::Admin);
        let timeout_seconds = matches.get_one::<u64>(ARG_TIMEOUT).copied().unwrap_or(10);

        Ok(Self {
            identity_url,
            session_token,
            workspace,
            timeout_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDENTITY_URL)
                .long(ARG_IDENTITY_URL)
                .help("Base URL of the API serving /api/auth/me")
                .env("PORTAL_GATE_IDENTITY_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TOKEN)
                .long(ARG_SESSION_TOKEN)
                .help("Session token sent as the workspace cookie")
                .env("PORTAL_GATE_SESSION_TOKEN")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_WORKSPACE)
                .short('w')
                .long(ARG_WORKSPACE)
                .help("Workspace whose session cookie carries the token")
                .env("PORTAL_GATE_WORKSPACE")
                .default_value("admin")
                .value_parser(ValueParser::from(|value: &str| {
                    value.parse::<Workspace>().map_err(|e| e.to_string())
                })),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Identity request timeout in seconds")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
