use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{Context, Outcome};
use crate::{
    credentials::CredentialsStore,
    prompt::{Prompt, TerminalPrompt},
};

#[derive(Debug, Clone, Default, Args)]
pub struct CleanCommand {}

impl CleanCommand {
    pub async fn execute(self, context: &Context) -> Result<()> {
        let store = CredentialsStore::load(&context.credentials_path).await?;

        self.run(store, &mut TerminalPrompt, &mut io::stdout())?
            .persist()
            .await?;

        Ok(())
    }

    /// Finding nothing to delete, or a negative answer, is not an error
    pub fn run<P, W>(
        &self,
        mut store: CredentialsStore,
        prompt: &mut P,
        out: &mut W,
    ) -> Result<Outcome>
    where
        P: Prompt,
        W: Write,
    {
        let names: Vec<String> = store
            .list_short_term_profiles()
            .iter()
            .map(|profile| profile.name().to_string())
            .collect();

        if names.is_empty() {
            writeln!(out, "No short-term profiles found")?;
            return Ok(Outcome::Unchanged);
        }

        writeln!(out, "Do you want to delete the following short-term profiles?")?;
        for name in &names {
            writeln!(out, "{name}")?;
        }

        if !prompt.confirm("Confirm deletion")? {
            info!("Deletion aborted by user");
            writeln!(
                out,
                "Aborted deletion; kept short-term profiles: {}",
                names.join(", ")
            )?;
            return Ok(Outcome::Unchanged);
        }

        let deleted = store.delete_short_term_profiles();
        writeln!(out, "Successfully deleted {deleted} short-term profiles")?;

        Ok(Outcome::Modified(store))
    }
}
