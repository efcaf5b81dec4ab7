pub mod serve;
pub mod whoami;

mod run;

#[derive(Debug)]
pub enum Action {
    Serve(serve::Args),
    Whoami(whoami::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
