//! Input validation for parameter plans
//!
//! Each check returns its own [`ValidationError`] so callers can report every
//! violation as a separate diagnostic.

use crate::constants::{Attribute, METADATA_MAX_LENGTH, NAME_MAX_LENGTH, NAME_MIN_LENGTH};
use crate::models::{ParameterRecord, ValueKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Attribute name length must be between {min} and {max}, got: {length}")]
    NameLength { length: usize, min: usize, max: usize },

    #[error("Hierarchical parameter name {name:?} must begin with a forward slash")]
    NameNotRooted { name: String },

    #[error("Attribute {attribute} length must be at most {max}, got: {length}")]
    TooLong {
        attribute: Attribute,
        length: usize,
        max: usize,
    },

    #[error("Attributes value and insecure_value cannot both be set for {name}")]
    ConflictingValues { name: String },

    #[error("At least one attribute out of value and insecure_value must be specified for {name}")]
    MissingValue { name: String },

    #[error("insecure_value is only allowed with type String or StringList, got {value_kind}")]
    InsecureValueNotAllowed { value_kind: ValueKind },
}

impl ValidationError {
    /// Short diagnostic title
    pub fn summary(&self) -> &'static str {
        match self {
            ValidationError::NameLength { .. } | ValidationError::TooLong { .. } => {
                "Invalid Attribute Value Length"
            }
            ValidationError::NameNotRooted { .. } => "Invalid Parameter Name",
            ValidationError::ConflictingValues { .. } => "Invalid Attribute Combination",
            ValidationError::MissingValue { .. } => "Missing Attribute Configuration",
            ValidationError::InsecureValueNotAllowed { .. } => "Invalid Attribute Value",
        }
    }

    /// Attribute the diagnostic should point at
    pub fn attribute(&self) -> Attribute {
        match self {
            ValidationError::NameLength { .. } | ValidationError::NameNotRooted { .. } => {
                Attribute::Name
            }
            ValidationError::TooLong { attribute, .. } => *attribute,
            ValidationError::ConflictingValues { .. } | ValidationError::MissingValue { .. } => {
                Attribute::Value
            }
            ValidationError::InsecureValueNotAllowed { .. } => Attribute::InsecureValue,
        }
    }
}

/// Names are 1 to 2048 characters; hierarchical names start with `/`
pub fn validate_parameter_name(name: &str) -> Result<(), ValidationError> {
    let length = name.chars().count();
    if !(NAME_MIN_LENGTH..=NAME_MAX_LENGTH).contains(&length) {
        return Err(ValidationError::NameLength {
            length,
            min: NAME_MIN_LENGTH,
            max: NAME_MAX_LENGTH,
        });
    }
    if name.contains('/') && !name.starts_with('/') {
        return Err(ValidationError::NameNotRooted {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Description and allowed pattern are at most 1024 characters
pub fn validate_metadata_length(
    attribute: Attribute,
    value: Option<&str>,
) -> Result<(), ValidationError> {
    let length = value.map(|v| v.chars().count()).unwrap_or(0);
    if length > METADATA_MAX_LENGTH {
        return Err(ValidationError::TooLong {
            attribute,
            length,
            max: METADATA_MAX_LENGTH,
        });
    }
    Ok(())
}

/// `value` and `insecure_value` are mutually exclusive, one is required, and
/// `insecure_value` is only valid for plaintext kinds
pub fn validate_value_fields(record: &ParameterRecord) -> Result<(), ValidationError> {
    match (&record.value, &record.insecure_value) {
        (Some(_), Some(_)) => {
            return Err(ValidationError::ConflictingValues {
                name: record.name.clone(),
            })
        }
        (None, None) => {
            return Err(ValidationError::MissingValue {
                name: record.name.clone(),
            })
        }
        _ => {}
    }

    if record.insecure_value.is_some() && record.value_kind.is_encrypted() {
        return Err(ValidationError::InsecureValueNotAllowed {
            value_kind: record.value_kind,
        });
    }
    Ok(())
}
