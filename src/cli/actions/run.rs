use crate::cli::actions::{Action, serve, whoami};
use anyhow::Result;

/// Single dispatch point for CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Serve(args) => serve::execute(args).await,
        Action::Whoami(args) => whoami::execute(args).await,
    }
}
