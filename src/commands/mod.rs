use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::{constants, credentials::CredentialsStore, error};

pub mod assume_role;
pub mod clean;
pub mod completions;
mod exchange;
pub mod list;
pub mod session_token;

pub use assume_role::AssumeRoleCommand;
pub use clean::CleanCommand;
pub use completions::CompletionsCommand;
pub use exchange::ExchangeArgs;
pub use list::ListCommand;
pub use session_token::SessionTokenCommand;

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct Context {
    pub profile: String,
    pub credentials_path: PathBuf,
}

impl Context {
    /// Falls back to the conventional credentials file location when no
    /// path was given
    pub fn resolve(profile: String, credentials_path: Option<PathBuf>) -> Result<Self> {
        let credentials_path = match credentials_path {
            Some(path) => path,
            None => constants::get_aws_credentials_path()
                .context("Failed to determine AWS credentials path")?,
        };

        Ok(Self {
            profile,
            credentials_path,
        })
    }
}

/// What a command left for the caller to write back
#[derive(Debug)]
pub enum Outcome {
    Unchanged,
    Modified(CredentialsStore),
}

impl Outcome {
    pub fn is_modified(&self) -> bool {
        matches!(self, Outcome::Modified(_))
    }

    /// Writes a modified store; returns whether anything was written
    pub async fn persist(self) -> error::Result<bool> {
        match self {
            Outcome::Unchanged => Ok(false),
            Outcome::Modified(store) => {
                store.persist().await?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_explicit_path() {
        let context =
            Context::resolve("dev".to_string(), Some(PathBuf::from("/tmp/credentials"))).unwrap();
        assert_eq!(context.profile, "dev");
        assert_eq!(context.credentials_path, PathBuf::from("/tmp/credentials"));
    }

    #[tokio::test]
    async fn test_unchanged_outcome_writes_nothing() {
        let outcome = Outcome::Unchanged;
        assert!(!outcome.is_modified());
        assert!(!outcome.persist().await.unwrap());
    }
}
