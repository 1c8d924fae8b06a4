//! Steps shared by `session-token` and `assume-role`.

use std::{io::Write, time::SystemTime};

use anyhow::{Result, bail};
use clap::Args;
use tracing::info;

use super::Outcome;
use crate::{
    aws::{AssumeRoleRequest, SessionTokenRequest, TokenExchange},
    constants::{DEFAULT_ASSUME_ROLE_DURATION_SECS, DEFAULT_SESSION_TOKEN_DURATION_SECS},
    credentials::{
        CredentialsStore, find_mfa_serial, long_term_credentials,
        profile::{format_duration, short_term_name, validate_base_name},
    },
    prompt::Prompt,
};

#[derive(Debug, Clone, Default, Args)]
pub struct ExchangeArgs {
    #[arg(
        long,
        env = "MFA_DEVICE",
        help = "MFA device ARN; overrides the profile's mfa_serial"
    )]
    pub device: Option<String>,

    #[arg(
        long,
        help = "One-time code from the MFA device; prompted for when omitted"
    )]
    pub otp: Option<String>,

    #[arg(
        long,
        env = "MFA_STS_DURATION",
        help = "Lifetime of the temporary credentials in seconds",
        long_help = "Lifetime of the temporary credentials in seconds. Defaults to 43200 (12 hours) for session tokens and 3600 (one hour) when assuming a role."
    )]
    pub duration: Option<i32>,

    #[arg(long, env = "AWS_REGION", help = "AWS region used for STS requests")]
    pub region: Option<String>,

    #[arg(
        long,
        help = "Keep an existing short-term profile that has not expired yet"
    )]
    pub keep_valid: bool,
}

/// Which STS operation produces the temporary credentials
#[derive(Debug, Clone, Copy)]
pub(crate) enum Request<'a> {
    SessionToken,
    AssumeRole {
        role_arn: &'a str,
        role_session_name: &'a str,
    },
}

/// Validates the base profile, obtains the MFA code, exchanges it and
/// stores the result as `<profile>-short-term`.
///
/// Every check runs before the code is requested and before the exchange
/// is called; on any error the store is dropped unmodified.
pub(crate) async fn derive_short_term<E, P, W>(
    mut store: CredentialsStore,
    profile_name: &str,
    args: &ExchangeArgs,
    request: Request<'_>,
    exchange: &E,
    prompt: &mut P,
    out: &mut W,
) -> Result<Outcome>
where
    E: TokenExchange,
    P: Prompt,
    W: Write,
{
    validate_base_name(profile_name)?;
    let profile = store.resolve(profile_name)?;
    let mfa_serial = find_mfa_serial(&profile, args.device.as_deref())?;
    let credentials = long_term_credentials(&profile)?;

    info!("Using long-term profile \"{}\"", profile_name);

    let short_term = short_term_name(profile_name);
    if args.keep_valid {
        let remaining = store
            .resolve(&short_term)
            .ok()
            .and_then(|existing| existing.remaining_validity(SystemTime::now()));
        if let Some(remaining) = remaining {
            writeln!(
                out,
                "Short-term profile \"{}\" is still valid for {}",
                short_term,
                format_duration(remaining)
            )?;
            return Ok(Outcome::Unchanged);
        }
    }

    let token_code = match args.otp.as_deref().map(str::trim) {
        Some("") => bail!("No MFA code provided"),
        Some(code) => code.to_string(),
        None => prompt.read_one_time_code()?,
    };

    let temporary = match request {
        Request::SessionToken => {
            info!("Requesting session token with MFA device {}", mfa_serial);
            exchange
                .get_session_token(SessionTokenRequest {
                    credentials: &credentials,
                    mfa_serial: &mfa_serial,
                    token_code: &token_code,
                    duration_seconds: Some(
                        args.duration.unwrap_or(DEFAULT_SESSION_TOKEN_DURATION_SECS),
                    ),
                })
                .await?
        }
        Request::AssumeRole {
            role_arn,
            role_session_name,
        } => {
            info!("Assuming role {} as {}", role_arn, role_session_name);
            exchange
                .assume_role(AssumeRoleRequest {
                    credentials: &credentials,
                    role_arn,
                    role_session_name,
                    mfa_serial: &mfa_serial,
                    token_code: &token_code,
                    duration_seconds: Some(
                        args.duration.unwrap_or(DEFAULT_ASSUME_ROLE_DURATION_SECS),
                    ),
                })
                .await?
        }
    };

    store.upsert_short_term(profile_name, &temporary);

    writeln!(
        out,
        "Successfully added short-term credentials \"{}\"",
        short_term
    )?;
    writeln!(
        out,
        "Credentials will expire at: {}",
        temporary.format_expiration()
    )?;

    Ok(Outcome::Modified(store))
}
