use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::{
    Client as StsClient,
    config::{Builder as StsConfigBuilder, Credentials as StaticCredentials},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::Credentials as StsCredentials,
};
use tracing::{debug, info};

use super::{
    AssumeRoleRequest, AssumedRole, LongTermCredentials, SessionTokenRequest,
    TemporaryCredentials, TokenExchange,
};
use crate::{
    constants::DEFAULT_AWS_REGION,
    error::{Error, Result},
};

/// Provider name attached to the static long-term keys
const PROVIDER_NAME: &str = "mfaws";

/// Token exchange backed by AWS STS
#[derive(Debug, Clone)]
pub struct StsTokenExchange {
    profile: String,
    region: Option<String>,
}

impl StsTokenExchange {
    /// Nothing is loaded until the first request, so validation failures
    /// never touch the network
    pub fn new(profile: impl Into<String>, region: Option<String>) -> Self {
        Self {
            profile: profile.into(),
            region,
        }
    }

    /// Load AWS config with automatic region fallback
    /// Priority: --region -> ENV vars -> Config file -> DEFAULT_AWS_REGION
    async fn sdk_config(&self) -> SdkConfig {
        let loader = || aws_config::defaults(BehaviorVersion::latest()).profile_name(&self.profile);

        if let Some(region) = &self.region {
            info!("Using region: {}", region);
            return loader().region(Region::new(region.clone())).load().await;
        }

        let loaded = loader().load().await;
        match loaded.region() {
            Some(region) => {
                info!("Using region: {}", region);
                loaded
            }
            None => {
                info!(
                    "No region configured, using default {} for STS",
                    DEFAULT_AWS_REGION
                );
                loader()
                    .region(Region::new(DEFAULT_AWS_REGION))
                    .load()
                    .await
            }
        }
    }

    async fn client(&self, credentials: &LongTermCredentials) -> StsClient {
        let provider = StaticCredentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            PROVIDER_NAME,
        );
        let config = StsConfigBuilder::from(&self.sdk_config().await)
            .credentials_provider(provider)
            .build();
        StsClient::from_conf(config)
    }
}

impl TokenExchange for StsTokenExchange {
    async fn get_session_token(
        &self,
        request: SessionTokenRequest<'_>,
    ) -> Result<TemporaryCredentials> {
        info!("Calling AWS STS GetSessionToken");
        debug!("MFA serial: {}", request.mfa_serial);
        debug!("Duration: {:?} seconds", request.duration_seconds);

        let response = self
            .client(request.credentials)
            .await
            .get_session_token()
            .serial_number(request.mfa_serial)
            .token_code(request.token_code)
            .set_duration_seconds(request.duration_seconds)
            .send()
            .await
            .map_err(remote_error)?;

        let sts_creds = response.credentials().ok_or_else(missing_credentials)?;

        info!("Successfully obtained AWS credentials");
        Ok(temporary_credentials(sts_creds, None))
    }

    async fn assume_role(&self, request: AssumeRoleRequest<'_>) -> Result<TemporaryCredentials> {
        info!("Calling AWS STS AssumeRole");
        debug!("Role ARN: {}", request.role_arn);
        debug!("Role session name: {}", request.role_session_name);
        debug!("MFA serial: {}", request.mfa_serial);
        debug!("Duration: {:?} seconds", request.duration_seconds);

        let response = self
            .client(request.credentials)
            .await
            .assume_role()
            .role_arn(request.role_arn)
            .role_session_name(request.role_session_name)
            .serial_number(request.mfa_serial)
            .token_code(request.token_code)
            .set_duration_seconds(request.duration_seconds)
            .send()
            .await
            .map_err(remote_error)?;

        let sts_creds = response.credentials().ok_or_else(missing_credentials)?;

        // the stored ARN is the requested one, the ID is what STS reports
        let assumed_role = AssumedRole {
            arn: request.role_arn.to_string(),
            id: response
                .assumed_role_user()
                .map(|user| user.assumed_role_id().to_string()),
        };

        info!("Successfully assumed role {}", request.role_arn);
        Ok(temporary_credentials(sts_creds, Some(assumed_role)))
    }
}

fn temporary_credentials(
    sts_creds: &StsCredentials,
    assumed_role: Option<AssumedRole>,
) -> TemporaryCredentials {
    TemporaryCredentials {
        access_key_id: sts_creds.access_key_id().to_string(),
        secret_access_key: sts_creds.secret_access_key().to_string(),
        session_token: sts_creds.session_token().to_string(),
        expiration: *sts_creds.expiration(),
        assumed_role,
    }
}

fn missing_credentials() -> Error {
    Error::RemoteExchangeFailed("AWS STS returned no credentials".to_string())
}

/// Prefer the service's own message (e.g. an MFA failure) over the SDK's
/// generic description
fn remote_error<E, R>(err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = err.message().map(String::from).unwrap_or_else(|| {
        format!(
            "Failed to get STS credentials: {}",
            DisplayErrorContext(&err)
        )
    });
    Error::RemoteExchangeFailed(message)
}
