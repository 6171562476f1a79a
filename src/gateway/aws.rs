//! # AWS Systems Manager Backend
//!
//! [`AwsParameterStore`] implements [`ParameterStore`] over `aws-sdk-ssm`, and
//! [`StsIdentityVerifier`] performs the configure-time identity check over
//! `aws-sdk-sts`. Both clients are built from one shared `SdkConfig` so they
//! inherit the same HTTP client, credentials and retry settings.

use super::store::{ErrorFault, ParameterFilter, ParameterStore, PutParameterInput, StoreError};
use crate::config::{CredentialSource, ProviderConfig, RetryMode};
use crate::models::{DataType, ParameterMetadata, RemoteParameter, ValueKind};
use crate::provider::{CallerIdentity, FastSsmProvider, IdentityVerifier, ProviderError, ProviderHandle};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_sdk_ssm::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::types::{ParameterStringFilter, ParameterType};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

const STATIC_CREDENTIALS_PROVIDER: &str = "fastssm-static";
const INTERNAL_SERVER_ERROR_CODE: &str = "InternalServerError";

/// Load the shared SDK configuration from provider settings
pub async fn load_sdk_config(config: &ProviderConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    match config.credential_source() {
        CredentialSource::Static {
            access_key,
            secret_key,
            token,
        } => {
            debug!("🔑 Using static credentials");
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                token,
                None,
                STATIC_CREDENTIALS_PROVIDER,
            ));
        }
        CredentialSource::Profile(profile) => {
            debug!(profile = %profile, "🔑 Using shared config profile");
            loader = loader.profile_name(profile);
        }
        CredentialSource::DefaultChain => debug!("🔑 Using default credential chain"),
    }

    if let Some(max_attempts) = config.effective_max_attempts() {
        let retry = match config.retry_mode {
            Some(RetryMode::Adaptive) => RetryConfig::adaptive(),
            _ => RetryConfig::standard(),
        };
        loader = loader.retry_config(retry.with_max_attempts(max_attempts));
    }

    loader.load().await
}

/// Parameter store client backed by AWS Systems Manager
#[derive(Debug, Clone)]
pub struct AwsParameterStore {
    client: aws_sdk_ssm::Client,
}

impl AwsParameterStore {
    pub fn new(sdk_config: &SdkConfig, config: &ProviderConfig) -> Self {
        let mut builder = aws_sdk_ssm::config::Builder::from(sdk_config);
        if let Some(endpoint) = &config.endpoints.ssm {
            builder = builder.endpoint_url(endpoint);
        }
        Self::from_client(aws_sdk_ssm::Client::from_conf(builder.build()))
    }

    /// Create from a pre-built client
    pub fn from_client(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for AwsParameterStore {
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<RemoteParameter>, StoreError> {
        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await
            .map_err(|err| {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|service| service.is_parameter_not_found());
                if not_found {
                    StoreError::parameter_not_found(name)
                } else {
                    map_sdk_error(err)
                }
            })?;

        let Some(parameter) = output.parameter() else {
            return Ok(None);
        };

        Ok(Some(RemoteParameter {
            name: parameter.name().unwrap_or(name).to_string(),
            arn: parameter.arn().unwrap_or_default().to_string(),
            value_kind: parse_value_kind(parameter.r#type())?,
            version: parameter.version(),
            value: parameter.value().unwrap_or_default().to_string(),
            data_type: parse_data_type(parameter.data_type())?,
            last_modified: parameter.last_modified_date().and_then(to_chrono),
        }))
    }

    async fn put_parameter(&self, input: &PutParameterInput) -> Result<i64, StoreError> {
        let output = self
            .client
            .put_parameter()
            .name(&input.name)
            .value(&input.value)
            .r#type(ParameterType::from(input.value_kind.as_str()))
            .data_type(input.data_type.as_str())
            .set_allowed_pattern(input.allowed_pattern.clone())
            .set_description(input.description.clone())
            .overwrite(input.overwrite)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(output.version())
    }

    async fn describe_parameters(
        &self,
        filter: &ParameterFilter,
    ) -> Result<Vec<ParameterMetadata>, StoreError> {
        let ParameterFilter::NameEquals(name) = filter;
        let string_filter = ParameterStringFilter::builder()
            .key("Name")
            .option("Equals")
            .values(name)
            .build()
            .map_err(|err| StoreError::transport(err.to_string()))?;

        let mut results = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let output = self
                .client
                .describe_parameters()
                .parameter_filters(string_filter.clone())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(map_sdk_error)?;

            for metadata in output.parameters() {
                results.push(ParameterMetadata {
                    name: metadata.name().unwrap_or_default().to_string(),
                    value_kind: parse_value_kind(metadata.r#type())?,
                    data_type: parse_data_type(metadata.data_type())?,
                    version: metadata.version(),
                    description: metadata.description().map(str::to_string),
                    allowed_pattern: metadata.allowed_pattern().map(str::to_string),
                    key_id: metadata.key_id().map(str::to_string),
                    tier: metadata.tier().map(|tier| tier.as_str().to_string()),
                    last_modified_user: metadata.last_modified_user().map(str::to_string),
                    last_modified: metadata.last_modified_date().and_then(to_chrono),
                });
            }

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(results)
    }

    async fn delete_parameter(&self, name: &str) -> Result<(), StoreError> {
        self.client
            .delete_parameter()
            .name(name)
            .send()
            .await
            .map_err(|err| {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|service| service.is_parameter_not_found());
                if not_found {
                    StoreError::parameter_not_found(name)
                } else {
                    map_sdk_error(err)
                }
            })?;
        Ok(())
    }
}

/// Map an SDK failure onto the store's error shape, keeping the API code
fn map_sdk_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            let code = inner.code().unwrap_or("Unknown").to_string();
            let message = inner.message().unwrap_or_default().to_string();
            let fault = if code == INTERNAL_SERVER_ERROR_CODE {
                ErrorFault::Server
            } else {
                ErrorFault::Client
            };
            StoreError::api(code, message, fault)
        }
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            StoreError::transport(format!("{err:?}"))
        }
        _ => match err.code() {
            Some(code) => StoreError::api(
                code,
                err.message().unwrap_or_default(),
                ErrorFault::Unknown,
            ),
            None => StoreError::transport(format!("{err:?}")),
        },
    }
}

fn parse_value_kind(kind: Option<&ParameterType>) -> Result<ValueKind, StoreError> {
    let raw = kind.map(ParameterType::as_str).unwrap_or_default();
    raw.parse().map_err(StoreError::transport)
}

fn parse_data_type(data_type: Option<&str>) -> Result<DataType, StoreError> {
    match data_type {
        None | Some("") => Ok(DataType::default()),
        Some(raw) => raw.parse().map_err(StoreError::transport),
    }
}

fn to_chrono(timestamp: &aws_sdk_ssm::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

/// Identity check over STS `GetCallerIdentity`
#[derive(Debug, Clone)]
pub struct StsIdentityVerifier {
    client: aws_sdk_sts::Client,
}

impl StsIdentityVerifier {
    pub fn new(sdk_config: &SdkConfig, config: &ProviderConfig) -> Self {
        let mut builder = aws_sdk_sts::config::Builder::from(sdk_config);
        if let Some(region) = &config.sts_region {
            builder = builder.region(aws_sdk_sts::config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoints.sts {
            builder = builder.endpoint_url(endpoint);
        }
        Self {
            client: aws_sdk_sts::Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl IdentityVerifier for StsIdentityVerifier {
    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| {
                let message = err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{err:?}"));
                ProviderError::identity_check_failed(message)
            })?;

        Ok(CallerIdentity {
            account: output.account().map(str::to_string),
            arn: output.arn().map(str::to_string),
            user_id: output.user_id().map(str::to_string),
        })
    }
}

/// Build AWS clients from `config` and configure the provider over them
pub async fn configure_aws(config: ProviderConfig) -> Result<ProviderHandle, ProviderError> {
    config.validate()?;
    let sdk_config = load_sdk_config(&config).await;
    if sdk_config.region().is_none() {
        return Err(ProviderError::client_setup(
            "no region configured; set `region` or AWS_REGION",
        ));
    }

    let store = Arc::new(AwsParameterStore::new(&sdk_config, &config));
    let verifier = StsIdentityVerifier::new(&sdk_config, &config);
    info!(
        region = ?sdk_config.region(),
        endpoint = config.endpoints.ssm.as_deref().unwrap_or("<default>"),
        "☁️ AWS clients initialized"
    );
    FastSsmProvider::configure(config, &verifier, store).await
}
