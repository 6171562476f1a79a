//! # Provider Constants
//!
//! Attribute names, remote type identifiers and operational defaults shared by
//! every layer of the provider core. Attribute names form one immutable mapping
//! ([`Attribute`]) instead of string literals scattered through the code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Provider type name as registered with the orchestration engine
pub const PROVIDER_TYPE_NAME: &str = "fastssm";

/// Suffix appended to the provider type name for the parameter resource
pub const PARAMETER_TYPE_SUFFIX: &str = "_parameter";

/// Remote error code signalling server-side throttling
pub const THROTTLING_ERROR_CODE: &str = "ThrottlingException";

/// Remote error code for a missing parameter
pub const PARAMETER_NOT_FOUND_ERROR_CODE: &str = "ParameterNotFound";

/// Remote error code returned when a put without overwrite hits an existing name
pub const PARAMETER_ALREADY_EXISTS_ERROR_CODE: &str = "ParameterAlreadyExists";

/// Legacy migration source constraints
pub mod legacy {
    /// Resource type name of the schema we migrate from
    pub const SOURCE_TYPE_NAME: &str = "aws_ssm_parameter";

    /// The only legacy schema revision we accept
    pub const SOURCE_SCHEMA_VERSION: i64 = 0;

    /// Provider address namespace/type; hostname is ignored so mirrors work
    pub const SOURCE_PROVIDER_SUFFIX: &str = "hashicorp/aws";
}

/// Deadlines and delays for remote calls
pub mod timeouts {
    use std::time::Duration;

    /// Fetch and describe deadline
    pub const READ: Duration = Duration::from_secs(2 * 60);

    /// Put and delete deadline
    pub const WRITE: Duration = Duration::from_secs(10 * 60);

    /// Enumeration deadline
    pub const DESCRIBE: Duration = Duration::from_secs(2 * 60);

    /// Extra cooldown applied whenever throttling is detected
    pub const THROTTLE_COOLDOWN: Duration = Duration::from_secs(5);

    /// First backoff interval of the retry loop
    pub const BACKOFF_BASE: Duration = Duration::from_millis(500);

    /// Backoff ceiling of the retry loop
    pub const BACKOFF_MAX: Duration = Duration::from_secs(10);
}

/// Parameter name length limits (inclusive)
pub const NAME_MIN_LENGTH: usize = 1;
pub const NAME_MAX_LENGTH: usize = 2048;

/// Max length of description and allowed_pattern
pub const METADATA_MAX_LENGTH: usize = 1024;

/// Max attempts forced onto the SDK whenever a retry mode is configured
pub const RETRY_MODE_MAX_ATTEMPTS: u32 = 25;

/// Default local token bucket refill interval
pub const TOKEN_BUCKET_REFILL_INTERVAL: Duration = Duration::from_millis(100);

/// Every attribute name used in resource, data source, ephemeral and provider schemas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    AccessKey,
    AllowedPattern,
    Arn,
    DataType,
    Description,
    Endpoints,
    Id,
    InsecureValue,
    KeyId,
    MaxRetries,
    Name,
    Overwrite,
    Profile,
    Region,
    RetryMode,
    SecretKey,
    SkipCredentialsValidation,
    StsRegion,
    Tags,
    TagsAll,
    Tier,
    Token,
    TokenBucketRateLimiterCapacity,
    Type,
    Value,
    Version,
    WithDecryption,
}

impl Attribute {
    pub const ALL: [Attribute; 27] = [
        Attribute::AccessKey,
        Attribute::AllowedPattern,
        Attribute::Arn,
        Attribute::DataType,
        Attribute::Description,
        Attribute::Endpoints,
        Attribute::Id,
        Attribute::InsecureValue,
        Attribute::KeyId,
        Attribute::MaxRetries,
        Attribute::Name,
        Attribute::Overwrite,
        Attribute::Profile,
        Attribute::Region,
        Attribute::RetryMode,
        Attribute::SecretKey,
        Attribute::SkipCredentialsValidation,
        Attribute::StsRegion,
        Attribute::Tags,
        Attribute::TagsAll,
        Attribute::Tier,
        Attribute::Token,
        Attribute::TokenBucketRateLimiterCapacity,
        Attribute::Type,
        Attribute::Value,
        Attribute::Version,
        Attribute::WithDecryption,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Attribute::AccessKey => "access_key",
            Attribute::AllowedPattern => "allowed_pattern",
            Attribute::Arn => "arn",
            Attribute::DataType => "data_type",
            Attribute::Description => "description",
            Attribute::Endpoints => "endpoints",
            Attribute::Id => "id",
            Attribute::InsecureValue => "insecure_value",
            Attribute::KeyId => "key_id",
            Attribute::MaxRetries => "max_retries",
            Attribute::Name => "name",
            Attribute::Overwrite => "overwrite",
            Attribute::Profile => "profile",
            Attribute::Region => "region",
            Attribute::RetryMode => "retry_mode",
            Attribute::SecretKey => "secret_key",
            Attribute::SkipCredentialsValidation => "skip_credentials_validation",
            Attribute::StsRegion => "sts_region",
            Attribute::Tags => "tags",
            Attribute::TagsAll => "tags_all",
            Attribute::Tier => "tier",
            Attribute::Token => "token",
            Attribute::TokenBucketRateLimiterCapacity => "token_bucket_rate_limiter_capacity",
            Attribute::Type => "type",
            Attribute::Value => "value",
            Attribute::Version => "version",
            Attribute::WithDecryption => "with_decryption",
        }
    }

    /// Attributes whose content must never reach logs or plan output in clear text
    pub const fn is_sensitive(self) -> bool {
        matches!(
            self,
            Attribute::AccessKey | Attribute::SecretKey | Attribute::Token | Attribute::Value
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .iter()
            .copied()
            .find(|attr| attr.as_str() == s)
            .ok_or_else(|| format!("unknown attribute name: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_attribute_names_are_unique_and_round_trip() {
        let names: HashSet<&str> = Attribute::ALL.iter().map(|a| a.as_str()).collect();
        assert_eq!(names.len(), Attribute::ALL.len());

        for attr in Attribute::ALL {
            assert_eq!(attr.as_str().parse::<Attribute>().unwrap(), attr);
        }
    }

    #[test]
    fn test_serde_names_match_mapping() {
        for attr in Attribute::ALL {
            let json = serde_json::to_string(&attr).unwrap();
            assert_eq!(json, format!("\"{}\"", attr.as_str()));
        }
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        assert!("tier_level".parse::<Attribute>().is_err());
    }

    #[test]
    fn test_sensitive_attributes() {
        assert!(Attribute::SecretKey.is_sensitive());
        assert!(Attribute::Value.is_sensitive());
        assert!(!Attribute::InsecureValue.is_sensitive());
        assert!(!Attribute::Name.is_sensitive());
    }
}
