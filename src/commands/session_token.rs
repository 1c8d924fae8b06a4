use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{
    Context, Outcome,
    exchange::{self, ExchangeArgs, Request},
};
use crate::{
    aws::{TokenExchange, sts::StsTokenExchange},
    credentials::CredentialsStore,
    prompt::{Prompt, TerminalPrompt},
};

#[derive(Debug, Clone, Default, Args)]
pub struct SessionTokenCommand {
    #[command(flatten)]
    pub exchange: ExchangeArgs,
}

impl SessionTokenCommand {
    pub async fn execute(self, context: &Context) -> Result<()> {
        info!(
            "Requesting session token for profile: {}",
            context.profile
        );

        let store = CredentialsStore::load(&context.credentials_path).await?;
        let sts = StsTokenExchange::new(&context.profile, self.exchange.region.clone());

        self.run(context, store, &sts, &mut TerminalPrompt, &mut io::stdout())
            .await?
            .persist()
            .await?;

        Ok(())
    }

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
        exchange::derive_short_term(
            store,
            &context.profile,
            &self.exchange,
            Request::SessionToken,
            exchange,
            prompt,
            out,
        )
        .await
    }
}
