//! Crate-level error type.
//!
//! Each layer owns a structured `thiserror` enum ([`StoreError`], [`GatewayError`],
//! [`MigrationError`], [`ValidationError`], [`ConfigurationError`], [`ProviderError`]);
//! [`FastSsmError`] unifies them for callers that only need one type.

use crate::config::ConfigurationError;
use crate::gateway::{GatewayError, StoreError};
use crate::migration::MigrationError;
use crate::provider::ProviderError;
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FastSsmError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl FastSsmError {
    /// True when the underlying failure means the parameter does not exist remotely
    pub fn is_not_found(&self) -> bool {
        match self {
            FastSsmError::Gateway(err) => err.is_not_found(),
            FastSsmError::Store(err) => err.is_parameter_not_found(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FastSsmError>;
