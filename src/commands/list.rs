use std::{
    io::{self, Write},
    time::SystemTime,
};

use anyhow::Result;
use clap::Args;

use super::Context;
use crate::credentials::{CredentialsStore, profile::format_duration};

#[derive(Debug, Clone, Default, Args)]
pub struct ListCommand {}

impl ListCommand {
    pub async fn execute(self, context: &Context) -> Result<()> {
        let store = CredentialsStore::load(&context.credentials_path).await?;
        self.run(&store, &mut io::stdout())
    }

    /// Read-only: never writes the store and never calls STS
    pub fn run<W: Write>(&self, store: &CredentialsStore, out: &mut W) -> Result<()> {
        let profiles = store.list_base_profiles();
        writeln!(out, "Found {} AWS credential profiles:", profiles.len())?;
        for name in &profiles {
            writeln!(out, "{name}")?;
        }

        let short_term = store.list_short_term_profiles();
        if short_term.is_empty() {
            return Ok(());
        }

        let now = SystemTime::now();
        writeln!(out)?;
        writeln!(out, "Found {} short-term profiles:", short_term.len())?;
        for profile in short_term {
            let status = match (profile.expiration(), profile.remaining_validity(now)) {
                (None, _) => "unknown expiration".to_string(),
                (Some(_), Some(remaining)) => format!("valid for {}", format_duration(remaining)),
                (Some(_), None) => "expired".to_string(),
            };
            writeln!(out, "{} ({})", profile.name(), status)?;
        }

        Ok(())
    }
}
