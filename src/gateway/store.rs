//! # Parameter Store Client Contract
//!
//! The four raw remote calls the gateway is built on, and the error type they
//! fail with. Implementations: [`InMemoryParameterStore`](super::InMemoryParameterStore),
//! [`RateLimitedStore`](crate::resilience::RateLimitedStore) and, with the `aws`
//! feature, `AwsParameterStore`.

use crate::constants::{PARAMETER_ALREADY_EXISTS_ERROR_CODE, PARAMETER_NOT_FOUND_ERROR_CODE};
use crate::models::{DataType, ParameterMetadata, RemoteParameter, ValueKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Which side of the wire a remote API error is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFault {
    Client,
    Server,
    Unknown,
}

impl fmt::Display for ErrorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorFault::Client => write!(f, "client"),
            ErrorFault::Server => write!(f, "server"),
            ErrorFault::Unknown => write!(f, "unknown"),
        }
    }
}

/// Raw failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("API error {code} ({fault} fault): {message}")]
    Api {
        code: String,
        message: String,
        fault: ErrorFault,
    },

    #[error("Parameter not found: {name}")]
    ParameterNotFound { name: String },

    #[error("Rate limit quota exceeded: {message}")]
    QuotaExceeded { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl StoreError {
    pub fn api(code: impl Into<String>, message: impl Into<String>, fault: ErrorFault) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
            fault,
        }
    }

    pub fn parameter_not_found(name: impl Into<String>) -> Self {
        Self::ParameterNotFound { name: name.into() }
    }

    pub fn already_exists(name: &str) -> Self {
        Self::api(
            PARAMETER_ALREADY_EXISTS_ERROR_CODE,
            format!("The parameter already exists. To overwrite this value, set the overwrite option in the request to true. ({name})"),
            ErrorFault::Client,
        )
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Remote error code, when the failure came from the API
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True for the typed not-found variant and the raw `ParameterNotFound` code
    pub fn is_parameter_not_found(&self) -> bool {
        match self {
            StoreError::ParameterNotFound { .. } => true,
            StoreError::Api { code, .. } => code == PARAMETER_NOT_FOUND_ERROR_CODE,
            _ => false,
        }
    }
}

/// Write request for a single parameter
#[derive(Clone, PartialEq, Eq)]
pub struct PutParameterInput {
    pub name: String,
    pub value: String,
    pub value_kind: ValueKind,
    pub data_type: DataType,
    pub allowed_pattern: Option<String>,
    pub description: Option<String>,
    pub overwrite: bool,
}

impl fmt::Debug for PutParameterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutParameterInput")
            .field("name", &self.name)
            .field("value", &"[SENSITIVE]")
            .field("value_kind", &self.value_kind)
            .field("data_type", &self.data_type)
            .field("allowed_pattern", &self.allowed_pattern)
            .field("description", &self.description)
            .field("overwrite", &self.overwrite)
            .finish()
    }
}

/// Enumeration filter; only name equality is ever issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterFilter {
    NameEquals(String),
}

impl ParameterFilter {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            ParameterFilter::NameEquals(expected) => expected == name,
        }
    }
}

/// Remote operations, used for call accounting and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    GetParameter,
    PutParameter,
    DescribeParameters,
    DeleteParameter,
}

impl StoreOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            StoreOperation::GetParameter => "GetParameter",
            StoreOperation::PutParameter => "PutParameter",
            StoreOperation::DescribeParameters => "DescribeParameters",
            StoreOperation::DeleteParameter => "DeleteParameter",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client for the remote parameter store
///
/// Implementations must be safe to share across concurrent lifecycle calls.
#[async_trait]
pub trait ParameterStore: Send + Sync + fmt::Debug {
    /// Fetch a parameter; `Ok(None)` means the call succeeded without a payload
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<RemoteParameter>, StoreError>;

    /// Create or overwrite a parameter, returning the version the store assigned
    async fn put_parameter(&self, input: &PutParameterInput) -> Result<i64, StoreError>;

    async fn describe_parameters(
        &self,
        filter: &ParameterFilter,
    ) -> Result<Vec<ParameterMetadata>, StoreError>;

    async fn delete_parameter(&self, name: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: ParameterStore + ?Sized> ParameterStore for Arc<T> {
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<RemoteParameter>, StoreError> {
        (**self).get_parameter(name, with_decryption).await
    }

    async fn put_parameter(&self, input: &PutParameterInput) -> Result<i64, StoreError> {
        (**self).put_parameter(input).await
    }

    async fn describe_parameters(
        &self,
        filter: &ParameterFilter,
    ) -> Result<Vec<ParameterMetadata>, StoreError> {
        (**self).describe_parameters(filter).await
    }

    async fn delete_parameter(&self, name: &str) -> Result<(), StoreError> {
        (**self).delete_parameter(name).await
    }
}
