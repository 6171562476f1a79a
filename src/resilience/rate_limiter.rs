//! Local token bucket in front of the parameter store.
//!
//! An empty bucket fails the call with [`StoreError::QuotaExceeded`], which the
//! classifier treats as retryable, so callers back off instead of hammering the API.

use crate::constants::TOKEN_BUCKET_REFILL_INTERVAL;
use crate::gateway::{ParameterFilter, ParameterStore, PutParameterInput, StoreError};
use crate::models::{ParameterMetadata, RemoteParameter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

/// Fixed-capacity bucket refilled one token per interval
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    refill_interval: Duration,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(capacity: u32) -> Self {
        Self::with_refill_interval(capacity, TOKEN_BUCKET_REFILL_INTERVAL)
    }

    pub fn with_refill_interval(capacity: u32, refill_interval: Duration) -> Self {
        Self {
            capacity,
            refill_interval,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available(&self) -> u32 {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens
    }

    /// Take one token or fail with a quota error
    pub fn try_acquire(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        self.refill(&mut state);
        if state.tokens == 0 {
            debug!(capacity = self.capacity, "🪣 Token bucket empty");
            return Err(StoreError::quota_exceeded(format!(
                "retry quota exceeded, {} tokens available",
                self.capacity
            )));
        }
        state.tokens -= 1;
        Ok(())
    }

    fn refill(&self, state: &mut BucketState) {
        if self.refill_interval.is_zero() {
            state.tokens = self.capacity;
            return;
        }
        let elapsed = state.last_refill.elapsed();
        let earned = (elapsed.as_nanos() / self.refill_interval.as_nanos()) as u64;
        if earned == 0 {
            return;
        }
        state.tokens = (u64::from(state.tokens) + earned).min(u64::from(self.capacity)) as u32;
        state.last_refill += self.refill_interval.saturating_mul(earned.min(u64::from(u32::MAX)) as u32);
    }
}

/// Store wrapper that spends one token per remote call
#[derive(Debug)]
pub struct RateLimitedStore<S> {
    inner: S,
    bucket: TokenBucket,
}

impl<S: ParameterStore> RateLimitedStore<S> {
    pub fn new(inner: S, bucket: TokenBucket) -> Self {
        Self { inner, bucket }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn bucket(&self) -> &TokenBucket {
        &self.bucket
    }
}

#[async_trait]
impl<S: ParameterStore> ParameterStore for RateLimitedStore<S> {
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<RemoteParameter>, StoreError> {
        self.bucket.try_acquire()?;
        self.inner.get_parameter(name, with_decryption).await
    }

    async fn put_parameter(&self, input: &PutParameterInput) -> Result<i64, StoreError> {
        self.bucket.try_acquire()?;
        self.inner.put_parameter(input).await
    }

    async fn describe_parameters(
        &self,
        filter: &ParameterFilter,
    ) -> Result<Vec<ParameterMetadata>, StoreError> {
        self.bucket.try_acquire()?;
        self.inner.describe_parameters(filter).await
    }

    async fn delete_parameter(&self, name: &str) -> Result<(), StoreError> {
        self.bucket.try_acquire()?;
        self.inner.delete_parameter(name).await
    }
}
