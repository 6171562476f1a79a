//! # Resilience Module
//!
//! Bounded retries for remote parameter store calls.
//!
//! ## Architecture
//!
//! - **Retry Executor**: re-runs an operation with exponential backoff until it
//!   succeeds, fails permanently, or its deadline elapses
//! - **Failure Classifier**: decides retryability and the extra throttling cooldown
//! - **Clock**: real tokio timers in production, virtual time in tests
//! - **Rate Limiter**: local token bucket whose exhaustion is itself retryable
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fastssm::gateway::{InMemoryParameterStore, ParameterStore};
//! use fastssm::resilience::{BackoffConfig, RetryExecutor, ThrottleAwareClassifier};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let store = InMemoryParameterStore::new();
//! let executor = RetryExecutor::with_tokio_clock(BackoffConfig::default());
//! let classifier = ThrottleAwareClassifier::default();
//!
//! let result = executor
//!     .run("GetParameter", Duration::from_secs(120), &classifier, || {
//!         store.get_parameter("/app/db/host", true)
//!     })
//!     .await;
//! # let _ = result;
//! # }
//! ```

pub mod classifier;
pub mod clock;
pub mod rate_limiter;
pub mod retry;

pub use classifier::{Classification, FailureCategory, RetryClassifier, ThrottleAwareClassifier};
pub use clock::{ManualClock, RetryClock, TokioClock};
pub use rate_limiter::{RateLimitedStore, TokenBucket};
pub use retry::{AttemptError, BackoffConfig, CancellationFlag, RetryError, RetryExecutor};
