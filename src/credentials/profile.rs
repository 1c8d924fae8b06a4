//! Read-only view of a credentials file profile, plus the naming rules that
//! link a base profile to its short-term counterpart.

use std::time::{Duration, SystemTime};

use aws_smithy_types::{DateTime, date_time::Format};

use super::codec::Section;
use crate::{
    constants::SHORT_TERM_SUFFIX,
    error::{Error, Result},
};

pub const ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
pub const SESSION_TOKEN: &str = "aws_session_token";
pub const MFA_SERIAL: &str = "mfa_serial";
/// Older spelling of `mfa_serial`, still found in existing files
pub const LEGACY_MFA_DEVICE: &str = "aws_mfa_device";
pub const EXPIRATION: &str = "expiration";
pub const ASSUMED_ROLE_ARN: &str = "assumed_role_arn";
pub const ASSUMED_ROLE_ID: &str = "assumed_role_id";

/// Name of the short-term profile derived from `base`
pub fn short_term_name(base: &str) -> String {
    format!("{base}{SHORT_TERM_SUFFIX}")
}

pub fn is_short_term(name: &str) -> bool {
    name.ends_with(SHORT_TERM_SUFFIX)
}

/// Rejects base profile names that already carry the short-term suffix
pub fn validate_base_name(name: &str) -> Result<()> {
    if is_short_term(name) {
        return Err(Error::InvalidProfileName(name.to_string()));
    }
    Ok(())
}

/// Formats a duration as `1h 2m 3s`, leaving out zero components
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    [(secs / 3600, 'h'), (secs % 3600 / 60, 'm'), (secs % 60, 's')]
        .into_iter()
        .filter(|(amount, _)| *amount > 0)
        .map(|(amount, unit)| format!("{amount}{unit}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A named profile and its attributes, in file order
#[derive(Debug, Clone, Copy)]
pub struct Profile<'a> {
    section: &'a Section,
}

impl<'a> Profile<'a> {
    pub(crate) fn new(section: &'a Section) -> Self {
        Self { section }
    }

    pub fn name(&self) -> &'a str {
        self.section.name()
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.section.get(key)
    }

    /// All attributes, recognized or not
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> + use<'a> {
        self.section.entries()
    }

    pub fn is_short_term(&self) -> bool {
        is_short_term(self.name())
    }

    pub fn access_key_id(&self) -> Option<&'a str> {
        self.non_empty(ACCESS_KEY_ID)
    }

    pub fn secret_access_key(&self) -> Option<&'a str> {
        self.non_empty(SECRET_ACCESS_KEY)
    }

    pub fn mfa_serial(&self) -> Option<&'a str> {
        self.non_empty(MFA_SERIAL)
            .or_else(|| self.non_empty(LEGACY_MFA_DEVICE))
    }

    pub fn expiration(&self) -> Option<DateTime> {
        let value = self.get(EXPIRATION)?;
        DateTime::from_str(value, Format::DateTime).ok()
    }

    /// Time left before the stored credentials expire; `None` when expired
    /// or when the profile has no readable expiration
    pub fn remaining_validity(&self, now: SystemTime) -> Option<Duration> {
        let expiration = SystemTime::try_from(self.expiration()?).ok()?;
        expiration
            .duration_since(now)
            .ok()
            .filter(|remaining| !remaining.is_zero())
    }

    fn non_empty(&self, key: &str) -> Option<&'a str> {
        self.get(key).filter(|value| !value.is_empty())
    }
}
