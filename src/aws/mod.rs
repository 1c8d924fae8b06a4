use std::{fmt, future::Future};

use aws_smithy_types::{DateTime, date_time::Format};

use crate::error::Result;

pub mod sts;

/// Static key pair of a long-term profile
#[derive(Clone)]
pub struct LongTermCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for LongTermCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LongTermCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// AWS temporary credentials structure
#[derive(Debug, Clone)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime,
    /// Present when the credentials belong to an assumed role
    pub assumed_role: Option<AssumedRole>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumedRole {
    /// Role ARN as requested
    pub arn: String,
    /// Role ID reported by STS
    pub id: Option<String>,
}

impl TemporaryCredentials {
    pub fn format_expiration(&self) -> String {
        self.expiration
            .fmt(Format::DateTime)
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionTokenRequest<'a> {
    pub credentials: &'a LongTermCredentials,
    pub mfa_serial: &'a str,
    pub token_code: &'a str,
    pub duration_seconds: Option<i32>,
}

#[derive(Debug, Clone, Copy)]
pub struct AssumeRoleRequest<'a> {
    pub credentials: &'a LongTermCredentials,
    pub role_arn: &'a str,
    pub role_session_name: &'a str,
    pub mfa_serial: &'a str,
    pub token_code: &'a str,
    pub duration_seconds: Option<i32>,
}

/// Exchanges long-term credentials plus an MFA code for temporary credentials.
///
/// Failures are reported as [`crate::error::Error::RemoteExchangeFailed`]
/// carrying the service's own message. Implementations never retry.
pub trait TokenExchange {
    fn get_session_token(
        &self,
        request: SessionTokenRequest<'_>,
    ) -> impl Future<Output = Result<TemporaryCredentials>> + Send;

    fn assume_role(
        &self,
        request: AssumeRoleRequest<'_>,
    ) -> impl Future<Output = Result<TemporaryCredentials>> + Send;
}
