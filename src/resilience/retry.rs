//! # Retry Executor
//!
//! Bounded-duration retry driver. Each attempt re-runs the operation in full;
//! a retryable failure is followed by an optional cooldown and an exponential
//! backoff sleep, unless the deadline has already elapsed. Permanent failures
//! return immediately.
//!
//! ```rust,no_run
//! use fastssm::resilience::{AttemptError, BackoffConfig, RetryExecutor};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let executor = RetryExecutor::with_tokio_clock(BackoffConfig::default());
//! let result: Result<u32, _> = executor
//!     .run_with_retry("fetch", Duration::from_secs(120), || async {
//!         Err::<u32, _>(AttemptError::retryable("throttled".to_string()))
//!     })
//!     .await;
//! assert!(result.is_err());
//! # }
//! ```

use crate::resilience::classifier::RetryClassifier;
use crate::resilience::clock::{RetryClock, TokioClock};
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Exponential backoff between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Delay after the first failed attempt
    pub base: Duration,
    /// Upper bound for any single backoff sleep
    pub max: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: crate::constants::timeouts::BACKOFF_BASE,
            max: crate::constants::timeouts::BACKOFF_MAX,
        }
    }
}

impl BackoffConfig {
    /// Backoff after the given failed attempt (1-based): base * 2^(attempt-1), capped
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        self.base
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max)
    }
}

/// Outcome of a single failed attempt
#[derive(Debug)]
pub enum AttemptError<E> {
    /// Try again after `cooldown` (if any) plus the regular backoff
    Retryable { error: E, cooldown: Option<Duration> },
    /// Stop now
    Permanent(E),
}

impl<E> AttemptError<E> {
    pub fn retryable(error: E) -> Self {
        Self::Retryable {
            error,
            cooldown: None,
        }
    }

    pub fn retryable_after(error: E, cooldown: Duration) -> Self {
        Self::Retryable {
            error,
            cooldown: Some(cooldown),
        }
    }

    pub fn permanent(error: E) -> Self {
        Self::Permanent(error)
    }
}

/// Terminal failure of a retry loop
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("permanent failure in {operation} (attempt {attempts}, final attempt was a retry: {retried}): {cause}")]
    Permanent {
        operation: String,
        attempts: u32,
        retried: bool,
        cause: E,
    },

    #[error("timeout while waiting for {operation} after {attempts} attempts ({elapsed:?}): {last_error}")]
    DeadlineExceeded {
        operation: String,
        attempts: u32,
        elapsed: Duration,
        last_error: E,
    },

    #[error("{operation} cancelled after {attempts} attempts")]
    Cancelled {
        operation: String,
        attempts: u32,
        last_error: Option<E>,
    },
}

impl<E> RetryError<E> {
    /// The remote failure behind this error, if one was observed
    pub fn cause(&self) -> Option<&E> {
        match self {
            RetryError::Permanent { cause, .. } => Some(cause),
            RetryError::DeadlineExceeded { last_error, .. } => Some(last_error),
            RetryError::Cancelled { last_error, .. } => last_error.as_ref(),
        }
    }

    pub fn into_cause(self) -> Option<E> {
        match self {
            RetryError::Permanent { cause, .. } => Some(cause),
            RetryError::DeadlineExceeded { last_error, .. } => Some(last_error),
            RetryError::Cancelled { last_error, .. } => last_error,
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            RetryError::Permanent { operation, .. }
            | RetryError::DeadlineExceeded { operation, .. }
            | RetryError::Cancelled { operation, .. } => operation,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Permanent { attempts, .. }
            | RetryError::DeadlineExceeded { attempts, .. }
            | RetryError::Cancelled { attempts, .. } => *attempts,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RetryError::DeadlineExceeded { .. })
    }
}

/// Cooperative cancellation checked between attempts
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// State of one retry loop; lives only as long as the loop
#[derive(Debug)]
struct RetrySession {
    operation: String,
    started_at: Instant,
    deadline: Duration,
    attempts: u32,
}

impl RetrySession {
    fn start(operation: &str, deadline: Duration, now: Instant) -> Self {
        Self {
            operation: operation.to_string(),
            started_at: now,
            deadline,
            attempts: 0,
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.deadline
    }

    fn remaining(&self, now: Instant) -> Duration {
        self.deadline.saturating_sub(self.elapsed(now))
    }
}

/// Runs remote calls under a deadline with backoff
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    backoff: BackoffConfig,
    clock: Arc<dyn RetryClock>,
    cancellation: Option<CancellationFlag>,
}

impl RetryExecutor {
    pub fn new(backoff: BackoffConfig, clock: Arc<dyn RetryClock>) -> Self {
        Self {
            backoff,
            clock,
            cancellation: None,
        }
    }

    pub fn with_tokio_clock(backoff: BackoffConfig) -> Self {
        Self::new(backoff, Arc::new(TokioClock))
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn backoff(&self) -> BackoffConfig {
        self.backoff
    }

    pub fn clock(&self) -> &Arc<dyn RetryClock> {
        &self.clock
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(CancellationFlag::is_cancelled)
            .unwrap_or(false)
    }

    /// Repeatedly invoke `attempt` until it succeeds, fails permanently, or `deadline` elapses
    pub async fn run_with_retry<T, E, F, Fut>(
        &self,
        operation: &str,
        deadline: Duration,
        mut attempt: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError<E>>>,
        E: Display,
    {
        let mut session = RetrySession::start(operation, deadline, self.clock.now());
        let mut last_error: Option<E> = None;

        loop {
            if session.attempts > 0 && self.is_cancelled() {
                warn!(operation = %session.operation, attempts = session.attempts, "🛑 Retry loop cancelled");
                return Err(RetryError::Cancelled {
                    operation: session.operation,
                    attempts: session.attempts,
                    last_error,
                });
            }

            session.attempts += 1;
            let error = match attempt().await {
                Ok(value) => {
                    debug!(
                        operation = %session.operation,
                        attempts = session.attempts,
                        elapsed_ms = session.elapsed(self.clock.now()).as_millis() as u64,
                        "🟢 Remote call succeeded"
                    );
                    return Ok(value);
                }
                Err(AttemptError::Permanent(error)) => {
                    debug!(
                        operation = %session.operation,
                        attempts = session.attempts,
                        error = %error,
                        "🔴 Permanent failure, not retrying"
                    );
                    return Err(RetryError::Permanent {
                        retried: session.attempts > 1,
                        operation: session.operation,
                        attempts: session.attempts,
                        cause: error,
                    });
                }
                Err(AttemptError::Retryable { error, cooldown }) => {
                    if session.is_expired(self.clock.now()) {
                        return Err(self.deadline_exceeded(session, error));
                    }

                    warn!(
                        operation = %session.operation,
                        attempts = session.attempts,
                        error = %error,
                        "🟡 Temporary failure, retrying"
                    );

                    if let Some(cooldown) = cooldown {
                        info!(
                            operation = %session.operation,
                            cooldown_ms = cooldown.as_millis() as u64,
                            "Rate limit exceeded, cooling down before retry"
                        );
                        self.clock.sleep(cooldown).await;
                    }

                    let delay = self
                        .backoff
                        .delay_for_attempt(session.attempts)
                        .min(session.remaining(self.clock.now()));
                    self.clock.sleep(delay).await;
                    error
                }
            };

            if session.is_expired(self.clock.now()) {
                return Err(self.deadline_exceeded(session, error));
            }
            last_error = Some(error);
        }
    }

    /// Like [`run_with_retry`](Self::run_with_retry), with `classifier` deciding retryability
    pub async fn run<T, E, F, Fut, C>(
        &self,
        operation: &str,
        deadline: Duration,
        classifier: &C,
        mut call: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        C: RetryClassifier<E> + ?Sized,
    {
        self.run_with_retry(operation, deadline, || {
            let pending = call();
            async move {
                pending.await.map_err(|error| {
                    let classification = classifier.classify(&error);
                    if classification.retryable {
                        AttemptError::Retryable {
                            error,
                            cooldown: classification.cooldown,
                        }
                    } else {
                        AttemptError::Permanent(error)
                    }
                })
            }
        })
        .await
    }

    fn deadline_exceeded<E: Display>(&self, session: RetrySession, error: E) -> RetryError<E> {
        let elapsed = session.elapsed(self.clock.now());
        warn!(
            operation = %session.operation,
            attempts = session.attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error,
            "⏰ Retry deadline exceeded"
        );
        RetryError::DeadlineExceeded {
            operation: session.operation,
            attempts: session.attempts,
            elapsed,
            last_error: error,
        }
    }
}
