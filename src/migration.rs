//! # Legacy State Migration
//!
//! One-shot adoption of state written by the legacy `aws_ssm_parameter`
//! resource. Three preconditions are checked in order, each with its own
//! error, before any field is read:
//!
//! 1. the source type name is `aws_ssm_parameter`
//! 2. the source schema version is 0
//! 3. the source provider address ends in `hashicorp/aws` (any hostname, so
//!    network mirrors are accepted)
//!
//! Only a fixed subset of fields is copied. `insecure_value`, `id`, `key_id`,
//! `tier` and `tags_all` are dropped.

use crate::constants::legacy::{SOURCE_PROVIDER_SUFFIX, SOURCE_SCHEMA_VERSION, SOURCE_TYPE_NAME};
use crate::models::{LegacyRecord, ParameterRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// A request to adopt state from another resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveStateRequest {
    pub source_type_name: String,
    pub source_schema_version: i64,
    pub source_provider_address: String,
    /// Raw prior state in the source schema
    pub source_state: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MigrationError {
    #[error("Source schema name type mismatch: Expected source schema to be {expected}, but was {actual:?}")]
    SourceTypeMismatch { expected: String, actual: String },

    #[error("Source schema version mismatch: Expected source schema version to be {expected}, but was {actual}")]
    SchemaVersionMismatch { expected: i64, actual: i64 },

    #[error("Source provider unsupported: Expected source provider was {expected}, but we got {actual:?}")]
    UnsupportedProvider { expected: String, actual: String },

    #[error("Invalid source state: {reason}")]
    InvalidSourceState { reason: String },
}

impl MigrationError {
    pub fn invalid_source_state(reason: impl Into<String>) -> Self {
        Self::InvalidSourceState {
            reason: reason.into(),
        }
    }

    /// Short diagnostic title
    pub fn summary(&self) -> &'static str {
        match self {
            MigrationError::SourceTypeMismatch { .. } => "Source schema name type mismatch",
            MigrationError::SchemaVersionMismatch { .. } => "Source schema version mismatch",
            MigrationError::UnsupportedProvider { .. } => "Source provider unsupported",
            MigrationError::InvalidSourceState { .. } => "Invalid source state",
        }
    }

    /// Diagnostic body
    pub fn detail(&self) -> String {
        match self {
            MigrationError::SourceTypeMismatch { expected, actual } => {
                format!("Expected source schema to be {expected}, but was {actual:?}")
            }
            MigrationError::SchemaVersionMismatch { expected, actual } => {
                format!("Expected source schema version to be {expected}, but was {actual}")
            }
            MigrationError::UnsupportedProvider { expected, actual } => {
                format!("Expected source provider was {expected}, but we got {actual:?}")
            }
            MigrationError::InvalidSourceState { reason } => reason.clone(),
        }
    }
}

/// Transforms legacy state into a [`ParameterRecord`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyStateMigrator;

impl LegacyStateMigrator {
    pub fn new() -> Self {
        Self
    }

    /// Check provenance without touching the state payload
    pub fn check_preconditions(&self, request: &MoveStateRequest) -> Result<(), MigrationError> {
        if request.source_type_name != SOURCE_TYPE_NAME {
            return Err(MigrationError::SourceTypeMismatch {
                expected: SOURCE_TYPE_NAME.to_string(),
                actual: request.source_type_name.clone(),
            });
        }

        if request.source_schema_version != SOURCE_SCHEMA_VERSION {
            return Err(MigrationError::SchemaVersionMismatch {
                expected: SOURCE_SCHEMA_VERSION,
                actual: request.source_schema_version,
            });
        }

        if !request
            .source_provider_address
            .ends_with(SOURCE_PROVIDER_SUFFIX)
        {
            return Err(MigrationError::UnsupportedProvider {
                expected: SOURCE_PROVIDER_SUFFIX.to_string(),
                actual: request.source_provider_address.clone(),
            });
        }

        Ok(())
    }

    pub fn migrate(&self, request: &MoveStateRequest) -> Result<ParameterRecord, MigrationError> {
        self.check_preconditions(request)?;

        let legacy: LegacyRecord = serde_json::from_value(request.source_state.clone())
            .map_err(|err| MigrationError::invalid_source_state(err.to_string()))?;
        let record = Self::transform(legacy);

        info!(
            parameter = %record.name,
            source_provider = %request.source_provider_address,
            "🚚 Adopted legacy parameter state"
        );
        Ok(record)
    }

    /// Copy the migrated field subset
    pub fn transform(legacy: LegacyRecord) -> ParameterRecord {
        let mut record = ParameterRecord::new(legacy.name, legacy.value_kind);
        record.allowed_pattern = legacy.allowed_pattern;
        record.arn = legacy.arn;
        record.data_type = legacy.data_type.unwrap_or_default();
        record.description = legacy.description;
        record.value = legacy.value;
        record.overwrite = legacy.overwrite;
        record.tags = legacy.tags.unwrap_or_default();
        record.version = legacy.version;
        record
    }
}
