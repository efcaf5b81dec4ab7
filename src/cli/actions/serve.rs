use crate::{
    api::{self, Upstream},
    gate::{GateConfig, SessionGate},
};
use anyhow::Result;
use std::time::Duration;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub gate: GateConfig,
    pub upstream_url: String,
    pub upstream_timeout_seconds: u64,
}

/// Execute the serve action.
/// # Errors
/// Returns an error if the upstream URL is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let upstream = Upstream::new(
        &args.upstream_url,
        Duration::from_secs(args.upstream_timeout_seconds),
    )?;

    debug!(
        login_path = args.gate.login_path(),
        default_landing = args.gate.default_landing(),
        session_cookie = args.gate.session_cookie(),
        "gate configuration"
    );

    api::new(args.port, SessionGate::new(args.gate), upstream).await
}
