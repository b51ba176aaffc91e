pub mod mask;
pub mod ping;
pub mod redact;
pub mod resolve;
pub mod root;

use anyhow::Result;

#[derive(Debug)]
pub enum Action {
    Resolve(resolve::Args),
    Mask { value: String },
    Redact { text: Option<String> },
    Root { migrations: bool },
    Ping(ping::Args),
}

impl Action {
    /// Execute the action.
    ///
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> Result<()> {
        match self {
            Self::Resolve(args) => resolve::execute(&args),
            Self::Mask { value } => {
                mask::execute(&value);
                Ok(())
            }
            Self::Redact { text } => redact::execute(text),
            Self::Root { migrations } => root::execute(migrations),
            Self::Ping(args) => ping::execute(args).await,
        }
    }
}
