//! Configuration Error Types
//!
//! Specific, actionable errors for provider configuration loading and validation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Configuration file given explicitly but missing
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Sources could not be merged or deserialized
    #[error("Failed to load configuration: {error}")]
    LoadError { error: String },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },

    /// A field that only makes sense together with another
    #[error("Field '{field}' requires '{requires}' to be set")]
    MissingDependency { field: String, requires: String },

    /// Configuration validation errors
    #[error("Configuration validation failed: {error}")]
    ValidationError { error: String },
}

impl ConfigurationError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn load_error<E: std::fmt::Display>(error: E) -> Self {
        Self::LoadError {
            error: error.to_string(),
        }
    }

    /// Create an invalid value error; `value` should already be safe to display
    pub fn invalid_value(
        field: impl Into<String>,
        value: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
            context: context.into(),
        }
    }

    pub fn missing_dependency(field: impl Into<String>, requires: impl Into<String>) -> Self {
        Self::MissingDependency {
            field: field.into(),
            requires: requires.into(),
        }
    }

    pub fn validation_error(error: impl Into<String>) -> Self {
        Self::ValidationError {
            error: error.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
