//! Maps parsed subcommands to actions.

use crate::cli::actions::{Action, serve, whoami};
use crate::cli::commands::{self, gate};
use anyhow::{Result, anyhow};

/// # Errors
/// Returns an error if required arguments are missing or the gate
/// configuration is invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((commands::CMD_SERVE, sub)) => {
            let gate = gate::Options::parse(sub)?.into_config()?;
            let options = commands::serve::Options::parse(sub)?;

            Ok(Action::Serve(serve::Args {
                port: options.port,
                gate,
                upstream_url: options.upstream_url,
                upstream_timeout_seconds: options.upstream_timeout_seconds,
            }))
        }
        Some((commands::CMD_WHOAMI, sub)) => {
            let options = commands::whoami::Options::parse(sub)?;

            Ok(Action::Whoami(whoami::Args {
                identity_url: options.identity_url,
                session_token: options.session_token,
                workspace: options.workspace,
                timeout_seconds: options.timeout_seconds,
            }))
        }
        Some((name, _)) => Err(anyhow!("unknown command: {name}")),
        None => Err(anyhow!("missing command")),
    }
}
