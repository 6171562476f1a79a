//! # Provider Configuration and Identity Check
//!
//! [`FastSsmProvider::configure`] turns a [`ProviderConfig`] and a store client
//! into a [`ProviderHandle`] shared by the resource, data source and ephemeral
//! surfaces. Before any parameter call it performs exactly one identity check;
//! a failing check, or one that returns no user id, fails configuration. The
//! check is not retried.

use crate::config::{ConfigurationError, ProviderConfig};
use crate::gateway::{ParameterGateway, ParameterStore};
use crate::lifecycle::{ParameterDataSource, ParameterEphemeral, ParameterResource};
use crate::resilience::{
    CancellationFlag, RateLimitedStore, RetryClock, RetryExecutor, TokenBucket, TokioClock,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider configuration failed: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("provider configuration failed at STS GetCallerIdentity phase: {message}")]
    IdentityCheckFailed { message: String },

    #[error("couldn't get through STS authentication: Validation of credentials against STS failed. The response from AWS contained no userID.")]
    MissingUserId,

    #[error("provider configuration failed: {message}")]
    ClientSetup { message: String },
}

impl ProviderError {
    pub fn identity_check_failed(message: impl Into<String>) -> Self {
        Self::IdentityCheckFailed {
            message: message.into(),
        }
    }

    pub fn client_setup(message: impl Into<String>) -> Self {
        Self::ClientSetup {
            message: message.into(),
        }
    }

    /// Short diagnostic title
    pub fn summary(&self) -> &'static str {
        match self {
            ProviderError::Configuration(_) | ProviderError::ClientSetup { .. } => {
                "provider configuration failed"
            }
            ProviderError::IdentityCheckFailed { .. } => {
                "provider configuration failed at STS GetCallerIdentity phase"
            }
            ProviderError::MissingUserId => "couldn't get through STS authentication",
        }
    }
}

/// Result of the identity check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub account: Option<String>,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

/// The identity verification service
#[async_trait]
pub trait IdentityVerifier: Send + Sync + Debug {
    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError>;
}

/// Verifier with a fixed answer, for tests and offline use
#[derive(Debug)]
pub struct StaticIdentityVerifier {
    outcome: Result<CallerIdentity, String>,
    calls: AtomicU64,
}

impl StaticIdentityVerifier {
    pub fn succeeding(identity: CallerIdentity) -> Self {
        Self {
            outcome: Ok(identity),
            calls: AtomicU64::new(0),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn caller_identity(&self) -> Result<CallerIdentity, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .clone()
            .map_err(ProviderError::identity_check_failed)
    }
}

/// Configured provider; cheap to clone and safe to share across concurrent calls
#[derive(Debug, Clone)]
pub struct ProviderHandle {
    gateway: ParameterGateway,
    config: Arc<ProviderConfig>,
    identity: Option<CallerIdentity>,
}

impl ProviderHandle {
    pub fn gateway(&self) -> &ParameterGateway {
        &self.gateway
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// `None` when credential validation was skipped
    pub fn identity(&self) -> Option<&CallerIdentity> {
        self.identity.as_ref()
    }

    pub fn resource(&self) -> ParameterResource {
        ParameterResource::new(self.gateway.clone())
    }

    pub fn data_source(&self) -> ParameterDataSource {
        ParameterDataSource::new(self.gateway.clone())
    }

    pub fn ephemeral(&self) -> ParameterEphemeral {
        ParameterEphemeral::new(self.gateway.clone())
    }
}

#[derive(Debug, Clone)]
pub struct FastSsmProvider {
    config: ProviderConfig,
    clock: Arc<dyn RetryClock>,
    cancellation: Option<CancellationFlag>,
}

impl FastSsmProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            clock: Arc::new(TokioClock),
            cancellation: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn RetryClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    /// Validate configuration, verify identity, and wire the gateway over `store`
    pub async fn configure(
        config: ProviderConfig,
        verifier: &dyn IdentityVerifier,
        store: Arc<dyn ParameterStore>,
    ) -> Result<ProviderHandle, ProviderError> {
        Self::new(config).build(verifier, store).await
    }

    pub async fn build(
        self,
        verifier: &dyn IdentityVerifier,
        store: Arc<dyn ParameterStore>,
    ) -> Result<ProviderHandle, ProviderError> {
        self.config.validate()?;

        let identity = if self.config.skip_credentials_validation {
            warn!("⚠️ Skipping credential validation");
            None
        } else {
            let identity = verifier.caller_identity().await?;
            if identity.user_id.is_none() {
                return Err(ProviderError::MissingUserId);
            }
            info!(
                account = identity.account.as_deref().unwrap_or("<unknown>"),
                arn = identity.arn.as_deref().unwrap_or("<unknown>"),
                "🔐 Credentials verified"
            );
            Some(identity)
        };

        let store: Arc<dyn ParameterStore> = match self.config.token_bucket_rate_limiter_capacity {
            Some(capacity) => {
                info!(capacity, "🪣 Local rate limiter enabled");
                Arc::new(RateLimitedStore::new(store, TokenBucket::new(capacity)))
            }
            None => store,
        };

        let mut executor = RetryExecutor::new(self.config.retry.to_backoff(), self.clock.clone());
        if let Some(flag) = self.cancellation.clone() {
            executor = executor.with_cancellation(flag);
        }
        let gateway = ParameterGateway::new(
            store,
            executor,
            self.config.retry.to_classifier(),
            self.config.operation_timeouts(),
        );

        info!(
            region = self.config.region.as_deref().unwrap_or("<default>"),
            "🚀 Provider configured"
        );
        Ok(ProviderHandle {
            gateway,
            config: Arc::new(self.config),
            identity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryParameterStore;

    fn identity() -> CallerIdentity {
        CallerIdentity {
            account: Some("123456789012".to_string()),
            arn: Some("arn:aws:iam::123456789012:user/ci".to_string()),
            user_id: Some("AIDAEXAMPLE".to_string()),
        }
    }

    #[tokio::test]
    async fn test_identity_checked_exactly_once() {
        let verifier = StaticIdentityVerifier::succeeding(identity());
        let handle = FastSsmProvider::configure(
            ProviderConfig::default(),
            &verifier,
            Arc::new(InMemoryParameterStore::new()),
        )
        .await
        .unwrap();

        assert_eq!(verifier.call_count(), 1);
        assert_eq!(handle.identity(), Some(&identity()));
    }

    #[tokio::test]
    async fn test_identity_without_user_id_fails() {
        let verifier = StaticIdentityVerifier::succeeding(CallerIdentity {
            user_id: None,
            ..identity()
        });
        let err = FastSsmProvider::configure(
            ProviderConfig::default(),
            &verifier,
            Arc::new(InMemoryParameterStore::new()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::MissingUserId));
        assert_eq!(err.summary(), "couldn't get through STS authentication");
    }

    #[tokio::test]
    async fn test_identity_error_is_not_retried() {
        let verifier = StaticIdentityVerifier::failing("ExpiredToken");
        let err = FastSsmProvider::configure(
            ProviderConfig::default(),
            &verifier,
            Arc::new(InMemoryParameterStore::new()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::IdentityCheckFailed { .. }));
        assert_eq!(verifier.call_count(), 1);
    }

    #[tokio::test]
    async fn test_skip_credentials_validation() {
        let verifier = StaticIdentityVerifier::failing("unreachable");
        let config = ProviderConfig {
            skip_credentials_validation: true,
            ..ProviderConfig::default()
        };
        let handle = FastSsmProvider::configure(
            config,
            &verifier,
            Arc::new(InMemoryParameterStore::new()),
        )
        .await
        .unwrap();

        assert_eq!(verifier.call_count(), 0);
        assert!(handle.identity().is_none());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_before_identity_check() {
        let verifier = StaticIdentityVerifier::succeeding(identity());
        let config = ProviderConfig {
            access_key: Some("AKIA".to_string()),
            ..ProviderConfig::default()
        };
        let err = FastSsmProvider::configure(
            config,
            &verifier,
            Arc::new(InMemoryParameterStore::new()),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Configuration(_)));
        assert_eq!(verifier.call_count(), 0);
    }
}
