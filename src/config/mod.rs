//! # Provider Configuration
//!
//! Everything the provider needs to reach the remote store: region, credential
//! material, endpoint overrides, retry settings, and per-operation deadlines.
//!
//! ## Sources
//!
//! Layered through the `config` crate, later sources win:
//!
//! 1. built-in defaults
//! 2. an optional TOML/YAML/JSON file
//! 3. `FASTSSM_*` environment variables, `__` separating nested keys
//!    (e.g. `FASTSSM_TIMEOUTS__WRITE=900`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fastssm::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load()?;
//! config.validate()?;
//! println!("{}", serde_json::to_string_pretty(&config.sanitized())?);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

use crate::constants::{timeouts, RETRY_MODE_MAX_ATTEMPTS};
use crate::gateway::OperationTimeouts;
use crate::resilience::{BackoffConfig, ThrottleAwareClassifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// SDK retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryMode {
    Standard,
    Adaptive,
}

impl FromStr for RetryMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(RetryMode::Standard),
            "adaptive" => Ok(RetryMode::Adaptive),
            other => Err(ConfigurationError::invalid_value(
                "retry_mode",
                other,
                "expected one of standard, adaptive",
            )),
        }
    }
}

impl fmt::Display for RetryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryMode::Standard => write!(f, "standard"),
            RetryMode::Adaptive => write!(f, "adaptive"),
        }
    }
}

/// Custom service endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub ssm: Option<String>,
    pub sts: Option<String>,
}

/// Per-operation deadlines in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub read: u64,
    pub write: u64,
    pub describe: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            read: timeouts::READ.as_secs(),
            write: timeouts::WRITE.as_secs(),
            describe: timeouts::DESCRIBE.as_secs(),
        }
    }
}

impl TimeoutsConfig {
    pub fn to_operation_timeouts(&self) -> OperationTimeouts {
        OperationTimeouts {
            read: Duration::from_secs(self.read),
            write: Duration::from_secs(self.write),
            describe: Duration::from_secs(self.describe),
        }
    }
}

/// Local retry loop tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub throttle_cooldown_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_base_ms: timeouts::BACKOFF_BASE.as_millis() as u64,
            backoff_max_ms: timeouts::BACKOFF_MAX.as_millis() as u64,
            throttle_cooldown_seconds: timeouts::THROTTLE_COOLDOWN.as_secs(),
        }
    }
}

impl RetryConfig {
    pub fn to_backoff(&self) -> BackoffConfig {
        BackoffConfig {
            base: Duration::from_millis(self.backoff_base_ms),
            max: Duration::from_millis(self.backoff_max_ms),
        }
    }

    pub fn to_classifier(&self) -> ThrottleAwareClassifier {
        ThrottleAwareClassifier::new(Duration::from_secs(self.throttle_cooldown_seconds))
    }
}

/// Where credentials come from, in precedence order
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Static {
        access_key: String,
        secret_key: String,
        token: Option<String>,
    },
    Profile(String),
    DefaultChain,
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Static {
                access_key, token, ..
            } => f
                .debug_struct("Static")
                .field("access_key", access_key)
                .field("secret_key", &"[MASKED]")
                .field("token", &token.as_ref().map(|_| "[MASKED]"))
                .finish(),
            CredentialSource::Profile(profile) => f.debug_tuple("Profile").field(profile).finish(),
            CredentialSource::DefaultChain => write!(f, "DefaultChain"),
        }
    }
}

/// Provider configuration
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub token: Option<String>,
    pub endpoints: EndpointsConfig,
    pub retry_mode: Option<RetryMode>,
    pub max_retries: Option<u32>,
    pub skip_credentials_validation: bool,
    pub token_bucket_rate_limiter_capacity: Option<u32>,
    pub sts_region: Option<String>,
    pub timeouts: TimeoutsConfig,
    pub retry: RetryConfig,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("region", &self.region)
            .field("profile", &self.profile)
            .field("credentials", &self.credential_source())
            .field("endpoints", &self.endpoints)
            .field("retry_mode", &self.retry_mode)
            .field("max_retries", &self.max_retries)
            .field("skip_credentials_validation", &self.skip_credentials_validation)
            .field(
                "token_bucket_rate_limiter_capacity",
                &self.token_bucket_rate_limiter_capacity,
            )
            .field("sts_region", &self.sts_region)
            .field("timeouts", &self.timeouts)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ProviderConfig {
    /// Static keys beat a named profile, which beats the default chain
    pub fn credential_source(&self) -> CredentialSource {
        match (&self.access_key, &self.secret_key) {
            (Some(access_key), Some(secret_key)) => CredentialSource::Static {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
                token: self.token.clone(),
            },
            _ => match &self.profile {
                Some(profile) => CredentialSource::Profile(profile.clone()),
                None => CredentialSource::DefaultChain,
            },
        }
    }

    /// SDK max attempts; any explicit retry mode pins it to 25
    pub fn effective_max_attempts(&self) -> Option<u32> {
        if self.retry_mode.is_some() {
            Some(RETRY_MODE_MAX_ATTEMPTS)
        } else {
            self.max_retries.map(|retries| retries.saturating_add(1))
        }
    }

    /// Region for the identity service, defaulting to the main region
    pub fn identity_region(&self) -> Option<&str> {
        self.sts_region.as_deref().or(self.region.as_deref())
    }

    pub fn operation_timeouts(&self) -> OperationTimeouts {
        self.timeouts.to_operation_timeouts()
    }

    /// Fail fast on inconsistent or malformed settings
    pub fn validate(&self) -> ConfigResult<()> {
        match (&self.access_key, &self.secret_key) {
            (Some(_), None) => {
                return Err(ConfigurationError::missing_dependency("access_key", "secret_key"))
            }
            (None, Some(_)) => {
                return Err(ConfigurationError::missing_dependency("secret_key", "access_key"))
            }
            _ => {}
        }
        if self.token.is_some() && self.access_key.is_none() {
            return Err(ConfigurationError::missing_dependency("token", "access_key"));
        }

        for (field, endpoint) in [
            ("endpoints.ssm", &self.endpoints.ssm),
            ("endpoints.sts", &self.endpoints.sts),
        ] {
            if let Some(url) = endpoint {
                validate_endpoint(field, url)?;
            }
        }

        for (field, region) in [("region", &self.region), ("sts_region", &self.sts_region)] {
            if matches!(region, Some(r) if r.trim().is_empty()) {
                return Err(ConfigurationError::invalid_value(field, "", "must not be empty"));
            }
        }

        if self.token_bucket_rate_limiter_capacity == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "token_bucket_rate_limiter_capacity",
                "0",
                "must be greater than zero",
            ));
        }

        // Cooldown may be zero, backoff may not
        if self.retry.backoff_base_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry.backoff_base_ms",
                "0",
                "backoff must be at least one millisecond",
            ));
        }

        if self.retry.backoff_base_ms > self.retry.backoff_max_ms {
            return Err(ConfigurationError::validation_error(format!(
                "retry.backoff_base_ms ({}) exceeds retry.backoff_max_ms ({})",
                self.retry.backoff_base_ms, self.retry.backoff_max_ms
            )));
        }

        for (field, seconds) in [
            ("timeouts.read", self.timeouts.read),
            ("timeouts.write", self.timeouts.write),
            ("timeouts.describe", self.timeouts.describe),
        ] {
            if seconds == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "deadline must be at least one second",
                ));
            }
        }

        Ok(())
    }

    /// JSON view with secret material masked, safe for logs
    pub fn sanitized(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        sanitize_json_recursive(&mut value);
        value
    }
}

fn validate_endpoint(field: &str, url: &str) -> ConfigResult<()> {
    let host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match host {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => Ok(()),
        _ => Err(ConfigurationError::invalid_value(
            field,
            url,
            "endpoint must be an http:// or https:// URL",
        )),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    const SENSITIVE_PATTERNS: [&str; 4] = ["secret", "access_key", "password", "credential"];
    let key = key.to_lowercase();
    key == "token" || SENSITIVE_PATTERNS.iter().any(|pattern| key.contains(pattern))
}

/// Mask sensitive fields in place
fn sanitize_json_recursive(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *val = match val {
                        serde_json::Value::Null => serde_json::Value::Null,
                        serde_json::Value::String(s) if s.is_empty() => {
                            serde_json::Value::String("[EMPTY]".to_string())
                        }
                        _ => serde_json::Value::String("[MASKED]".to_string()),
                    };
                } else {
                    sanitize_json_recursive(val);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(sanitize_json_recursive),
        _ => {}
    }
}
