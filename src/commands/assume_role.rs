use std::io::{self, Write};

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use tracing::info;

use super::{
    Context, Outcome,
    exchange::{self, ExchangeArgs, Request},
};
use crate::{
    aws::{TokenExchange, sts::StsTokenExchange},
    constants::ROLE_SESSION_NAME_PREFIX,
    credentials::CredentialsStore,
    prompt::{Prompt, TerminalPrompt},
};

#[derive(Debug, Clone, Args)]
pub struct AssumeRoleCommand {
    #[arg(long = "role-arn", help = "ARN of the IAM role to assume")]
    pub role_arn: String,

    #[arg(
        long = "role-session-name",
        help = "Session name sent to STS [default: mfaws-<UTC timestamp>]"
    )]
    pub role_session_name: Option<String>,

    #[command(flatten)]
    pub exchange: ExchangeArgs,
}

impl AssumeRoleCommand {
    pub async fn execute(self, context: &Context) -> Result<()> {
        info!(
            "Assuming role {} with profile: {}",
            self.role_arn, context.profile
        );

        let store = CredentialsStore::load(&context.credentials_path).await?;
        let sts = StsTokenExchange::new(&context.profile, self.exchange.region.clone());

        self.run(context, store, &sts, &mut TerminalPrompt, &mut io::stdout())
            .await?
            .persist()
            .await?;

        Ok(())
    }

    /// The session name only affects the STS request; the result is always
    /// stored as `<profile>-short-term`
    pub async fn run<E, P, W>(
        &self,
        context: &Context,
        store: CredentialsStore,
        exchange: &E,
        prompt: &mut P,
        out: &mut W,
    ) -> Result<Outcome>
    where
        E: TokenExchange,
        P: Prompt,
        W: Write,
    {
        let role_session_name = self
            .role_session_name
            .clone()
            .unwrap_or_else(generate_session_name);

        exchange::derive_short_term(
            store,
            &context.profile,
            &self.exchange,
            Request::AssumeRole {
                role_arn: &self.role_arn,
                role_session_name: &role_session_name,
            },
            exchange,
            prompt,
            out,
        )
        .await
    }
}

fn generate_session_name() -> String {
    format!(
        "{}-{}",
        ROLE_SESSION_NAME_PREFIX,
        Utc::now().format("%Y%m%dT%H%M%SZ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_session_name() {
        let name = generate_session_name();
        assert!(name.starts_with("mfaws-"));
        assert!(name.ends_with('Z'));
        // STS limits session names to 64 characters of [\w+=,.@-]
        assert!(name.len() <= 64);
        assert!(
            name.chars()
                .all(|c| c.is_ascii_alphanumeric() || "_+=,.@-".contains(c))
        );
    }
}
