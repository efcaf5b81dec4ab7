use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

pub const ARG_PORT: &str = "port";
pub const ARG_UPSTREAM_URL: &str = "upstream-url";
pub const ARG_UPSTREAM_TIMEOUT: &str = "upstream-timeout-seconds";

const DEFAULT_UPSTREAM_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Options {
    pub port: u16,
    pub upstream_url: String,
    pub upstream_timeout_seconds: u64,
}

impl Options {
    /// Parse listener and upstream arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the upstream URL is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
        let upstream_url = matches
            .get_one::<String>(ARG_UPSTREAM_URL)
            .cloned()
            .context("missing required argument: --upstream-url")?;
        let upstream_timeout_seconds = matches
            .get_one::<u64>(ARG_UPSTREAM_TIMEOUT)
            .copied()
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECONDS);

        Ok(Self {
            port,
            upstream_url,
            upstream_timeout_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("PORTAL_GATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_URL)
                .short('u')
                .long(ARG_UPSTREAM_URL)
                .help("Workspace application that allowed requests are forwarded to")
                .env("PORTAL_GATE_UPSTREAM_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT)
                .long(ARG_UPSTREAM_TIMEOUT)
                .help("Upstream connect and idle read timeout in seconds")
                .default_value("30")
                .env("PORTAL_GATE_UPSTREAM_TIMEOUT_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
