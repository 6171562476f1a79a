//! # Failure Classification
//!
//! Decides whether a failed remote call is worth retrying.
//!
//! Two failure shapes are retryable:
//!
//! - a remote API error whose code is the throttling code
//! - local token bucket exhaustion ([`StoreError::QuotaExceeded`])
//!
//! Both carry a fixed cooldown that the [`RetryExecutor`](super::RetryExecutor)
//! sleeps in addition to its own backoff. Everything else is permanent.

use crate::constants::{timeouts, PARAMETER_NOT_FOUND_ERROR_CODE, THROTTLING_ERROR_CODE};
use crate::gateway::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Broad category of a remote call failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Remote throttling error code
    Throttled,
    /// Local rate limiter exhausted
    QuotaExceeded,
    /// Parameter absent remotely
    NotFound,
    /// Anything else
    Permanent,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureCategory::Throttled => "throttled",
            FailureCategory::QuotaExceeded => "quota_exceeded",
            FailureCategory::NotFound => "not_found",
            FailureCategory::Permanent => "permanent",
        };
        f.write_str(label)
    }
}

/// Result of classifying one failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: FailureCategory,
    pub retryable: bool,
    /// Extra sleep before the regular backoff
    pub cooldown: Option<Duration>,
}

impl Classification {
    pub fn permanent(category: FailureCategory) -> Self {
        Self {
            category,
            retryable: false,
            cooldown: None,
        }
    }

    pub fn retry_after(category: FailureCategory, cooldown: Duration) -> Self {
        Self {
            category,
            retryable: true,
            cooldown: Some(cooldown),
        }
    }
}

/// Retry policy plugged into the retry executor
pub trait RetryClassifier<E>: Send + Sync {
    fn classify(&self, error: &E) -> Classification;

    /// A missing error is never retryable
    fn is_retryable(&self, error: Option<&E>) -> bool {
        error
            .map(|error| self.classify(error).retryable)
            .unwrap_or(false)
    }
}

/// Default policy for parameter store calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleAwareClassifier {
    throttle_cooldown: Duration,
}

impl Default for ThrottleAwareClassifier {
    fn default() -> Self {
        Self::new(timeouts::THROTTLE_COOLDOWN)
    }
}

impl ThrottleAwareClassifier {
    pub fn new(throttle_cooldown: Duration) -> Self {
        Self { throttle_cooldown }
    }

    pub fn throttle_cooldown(&self) -> Duration {
        self.throttle_cooldown
    }
}

impl RetryClassifier<StoreError> for ThrottleAwareClassifier {
    fn classify(&self, error: &StoreError) -> Classification {
        match error {
            StoreError::Api {
                code,
                message,
                fault,
            } => {
                info!(
                    error_code = %code,
                    error_message = %message,
                    error_fault = %fault,
                    "Remote API error"
                );
                if code == THROTTLING_ERROR_CODE {
                    Classification::retry_after(FailureCategory::Throttled, self.throttle_cooldown)
                } else if code == PARAMETER_NOT_FOUND_ERROR_CODE {
                    Classification::permanent(FailureCategory::NotFound)
                } else {
                    Classification::permanent(FailureCategory::Permanent)
                }
            }
            StoreError::QuotaExceeded { message } => {
                info!(error_message = %message, "Local rate limit quota exceeded");
                Classification::retry_after(FailureCategory::QuotaExceeded, self.throttle_cooldown)
            }
            StoreError::ParameterNotFound { .. } => {
                Classification::permanent(FailureCategory::NotFound)
            }
            StoreError::Transport { .. } => Classification::permanent(FailureCategory::Permanent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ErrorFault;

    #[test]
    fn test_throttling_is_retryable_with_cooldown() {
        let classifier = ThrottleAwareClassifier::default();
        let error = StoreError::api(THROTTLING_ERROR_CODE, "Rate exceeded", ErrorFault::Client);

        let classification = classifier.classify(&error);
        assert_eq!(classification.category, FailureCategory::Throttled);
        assert!(classification.retryable);
        assert_eq!(classification.cooldown, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_local_quota_exhaustion_is_retryable() {
        let classifier = ThrottleAwareClassifier::new(Duration::from_secs(1));
        let error = StoreError::quota_exceeded("token bucket empty");

        let classification = classifier.classify(&error);
        assert_eq!(classification.category, FailureCategory::QuotaExceeded);
        assert_eq!(classification.cooldown, Some(Duration::from_secs(1)));
        assert!(classifier.is_retryable(Some(&error)));
    }

    #[test]
    fn test_other_errors_are_permanent() {
        let classifier = ThrottleAwareClassifier::default();
        let errors = [
            StoreError::api("AccessDeniedException", "denied", ErrorFault::Client),
            StoreError::api("InternalServerError", "boom", ErrorFault::Server),
            StoreError::parameter_not_found("/missing"),
            StoreError::transport("connection reset"),
        ];

        for error in &errors {
            assert!(!classifier.is_retryable(Some(error)), "{error}");
        }
    }

    #[test]
    fn test_not_found_category() {
        let classifier = ThrottleAwareClassifier::default();
        let remote = StoreError::api(PARAMETER_NOT_FOUND_ERROR_CODE, "", ErrorFault::Client);
        assert_eq!(classifier.classify(&remote).category, FailureCategory::NotFound);
    }

    #[test]
    fn test_missing_error_is_never_retryable() {
        let classifier = ThrottleAwareClassifier::default();
        assert!(!classifier.is_retryable(None));
    }
}
