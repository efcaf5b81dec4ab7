use crate::{
    gate::Workspace,
    identity::{HttpIdentityClient, RoleResolver, RoleSnapshot},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub identity_url: String,
    pub session_token: SecretString,
    pub workspace: Workspace,
    pub timeout_seconds: u64,
}

/// Resolve the role for the configured session.
///
/// # Errors
/// Returns an error if the identity client cannot be built.
pub async fn resolve(args: Args) -> Result<RoleSnapshot> {
    let client = HttpIdentityClient::with_timeout(
        &args.identity_url,
        Duration::from_secs(args.timeout_seconds),
    )
    .context("invalid identity client configuration")?
    .with_session(args.workspace.session_cookie(), args.session_token);

    debug!(endpoint = %client.endpoint(), workspace = %args.workspace, "resolving role");

    let resolver = RoleResolver::activate(Arc::new(client));
    let snapshot = resolver.resolved().await;
    if let Some(task) = resolver.deactivate() {
        let _ = task.await;
    }

    Ok(snapshot)
}

/// Execute the whoami action: print the resolved snapshot as JSON.
/// # Errors
/// Returns an error if the client cannot be built or the output cannot be
/// serialized.
pub async fn execute(args: Args) -> Result<()> {
    let snapshot = resolve(args).await?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    println!("{json}");
    Ok(())
}
