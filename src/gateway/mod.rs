//! # Remote Parameter Gateway
//!
//! Uniform contract over the four remote calls. Every call runs through the
//! [`RetryExecutor`] with the [`ThrottleAwareClassifier`] as retry policy, and
//! failures are normalized into [`GatewayError`]:
//!
//! - a store-reported missing parameter becomes [`GatewayError::NotFound`]
//! - a fetch that succeeds without a payload becomes [`GatewayError::EmptyResult`],
//!   which [`GatewayError::is_not_found`] treats the same as `NotFound`
//! - an enumeration that does not match exactly one parameter becomes
//!   [`GatewayError::IncorrectMetadataResponse`]

pub mod in_memory;
pub mod store;

#[cfg(feature = "aws")]
pub mod aws;

pub use in_memory::{InMemoryParameterStore, InjectedFault};
pub use store::{
    ErrorFault, ParameterFilter, ParameterStore, PutParameterInput, StoreError, StoreOperation,
};

use crate::constants::timeouts;
use crate::models::{ParameterMetadata, ParameterRecord, RemoteParameter};
use crate::reconcile::value_routing;
use crate::resilience::{RetryError, RetryExecutor, ThrottleAwareClassifier};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Normalized failure of a gateway operation
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Parameter not found: {name}")]
    NotFound { name: String },

    #[error("{operation} returned no result for parameter {name}")]
    EmptyResult { name: String, operation: String },

    #[error("Incorrect response for parameter metadata: None or too many results found ({count} results for {name})")]
    IncorrectMetadataResponse { name: String, count: usize },

    #[error("No value supplied for parameter {name}")]
    MissingValue { name: String },

    #[error(transparent)]
    Retry(#[from] RetryError<StoreError>),
}

impl GatewayError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn empty_result(name: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::EmptyResult {
            name: name.into(),
            operation: operation.into(),
        }
    }

    /// True for both `NotFound` and `EmptyResult`
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GatewayError::NotFound { .. } | GatewayError::EmptyResult { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, GatewayError::Retry(err) if err.is_timeout())
    }

    /// The raw store failure, when there was one
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            GatewayError::Retry(err) => err.cause(),
            _ => None,
        }
    }

    fn from_retry(name: &str, error: RetryError<StoreError>) -> Self {
        match &error {
            RetryError::Permanent { cause, .. } if cause.is_parameter_not_found() => {
                Self::not_found(name)
            }
            _ => Self::Retry(error),
        }
    }
}

/// Per-operation deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimeouts {
    pub read: Duration,
    pub write: Duration,
    pub describe: Duration,
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self {
            read: timeouts::READ,
            write: timeouts::WRITE,
            describe: timeouts::DESCRIBE,
        }
    }
}

/// Retry-governed access to the remote parameter store
#[derive(Debug, Clone)]
pub struct ParameterGateway {
    store: Arc<dyn ParameterStore>,
    executor: RetryExecutor,
    classifier: ThrottleAwareClassifier,
    timeouts: OperationTimeouts,
}

impl ParameterGateway {
    pub fn new(
        store: Arc<dyn ParameterStore>,
        executor: RetryExecutor,
        classifier: ThrottleAwareClassifier,
        timeouts: OperationTimeouts,
    ) -> Self {
        Self {
            store,
            executor,
            classifier,
            timeouts,
        }
    }

    pub fn store(&self) -> &Arc<dyn ParameterStore> {
        &self.store
    }

    pub fn timeouts(&self) -> OperationTimeouts {
        self.timeouts
    }

    /// Fetch the current remote fields of `name`
    pub async fn fetch_by_name(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<RemoteParameter, GatewayError> {
        let operation = StoreOperation::GetParameter;
        let started = Instant::now();
        let result = self
            .executor
            .run(operation.as_str(), self.timeouts.read, &self.classifier, || {
                self.store.get_parameter(name, with_decryption)
            })
            .await;
        crate::logging::log_remote_call(operation.as_str(), name, started.elapsed(), result.is_ok());

        match result {
            Ok(Some(parameter)) => Ok(parameter),
            Ok(None) => Err(GatewayError::empty_result(name, operation.as_str())),
            Err(error) => Err(GatewayError::from_retry(name, error)),
        }
    }

    /// Write `record`'s operative value; returns the version the store assigned
    pub async fn upsert(
        &self,
        record: &ParameterRecord,
        overwrite: bool,
    ) -> Result<i64, GatewayError> {
        let value = value_routing::operative_value(record).ok_or_else(|| {
            GatewayError::MissingValue {
                name: record.name.clone(),
            }
        })?;
        let input = PutParameterInput {
            name: record.name.clone(),
            value: value.to_string(),
            value_kind: record.value_kind,
            data_type: record.data_type,
            allowed_pattern: record.allowed_pattern.clone(),
            description: record.description.clone(),
            overwrite,
        };

        let operation = StoreOperation::PutParameter;
        let started = Instant::now();
        let result = self
            .executor
            .run(operation.as_str(), self.timeouts.write, &self.classifier, || {
                self.store.put_parameter(&input)
            })
            .await;
        crate::logging::log_remote_call(
            operation.as_str(),
            &record.name,
            started.elapsed(),
            result.is_ok(),
        );

        let version = result.map_err(|error| GatewayError::from_retry(&record.name, error))?;
        debug!(parameter = %record.name, version, overwrite, "📝 Parameter written");
        Ok(version)
    }

    /// Expensive filtered listing; succeeds only when exactly one parameter matches
    pub async fn enumerate_by_name_filter(
        &self,
        name: &str,
    ) -> Result<ParameterMetadata, GatewayError> {
        warn!(
            parameter = %name,
            "💸 Running DescribeParameters call: this is an expensive operation"
        );
        let filter = ParameterFilter::NameEquals(name.to_string());
        let operation = StoreOperation::DescribeParameters;
        let started = Instant::now();
        let result = self
            .executor
            .run(
                operation.as_str(),
                self.timeouts.describe,
                &self.classifier,
                || self.store.describe_parameters(&filter),
            )
            .await;
        crate::logging::log_remote_call(operation.as_str(), name, started.elapsed(), result.is_ok());

        let mut matches = result.map_err(|error| GatewayError::from_retry(name, error))?;
        if matches.len() != 1 {
            return Err(GatewayError::IncorrectMetadataResponse {
                name: name.to_string(),
                count: matches.len(),
            });
        }
        matches
            .pop()
            .ok_or_else(|| GatewayError::empty_result(name, operation.as_str()))
    }

    /// Delete `name`; a parameter that is already gone counts as deleted
    pub async fn delete(&self, name: &str) -> Result<(), GatewayError> {
        let operation = StoreOperation::DeleteParameter;
        let started = Instant::now();
        let result = self
            .executor
            .run(operation.as_str(), self.timeouts.write, &self.classifier, || {
                self.store.delete_parameter(name)
            })
            .await;
        crate::logging::log_remote_call(operation.as_str(), name, started.elapsed(), result.is_ok());

        match result.map_err(|error| GatewayError::from_retry(name, error)) {
            Ok(()) => Ok(()),
            Err(error) if error.is_not_found() => {
                debug!(parameter = %name, "Parameter already absent, treating delete as done");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}
