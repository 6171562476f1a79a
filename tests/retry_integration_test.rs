//! Retry, deadline and rate limiting behaviour through the gateway.

mod common;

use common::TestHarness;
use fastssm::gateway::{
    ErrorFault, GatewayError, InMemoryParameterStore, InjectedFault, OperationTimeouts,
    ParameterGateway, StoreError, StoreOperation,
};
use fastssm::models::{ParameterRecord, ValueKind};
use fastssm::resilience::{
    BackoffConfig, CancellationFlag, ManualClock, RateLimitedStore, RetryError, RetryExecutor,
    ThrottleAwareClassifier, TokenBucket,
};
use std::sync::Arc;
use std::time::Duration;

fn timeouts(read: Duration) -> OperationTimeouts {
    OperationTimeouts {
        read,
        ..OperationTimeouts::default()
    }
}

#[tokio::test]
async fn test_throttle_cooldown_applied_once_per_retry() {
    let harness = TestHarness::new();
    harness.store.seed(ParameterRecord::new("/r/a", ValueKind::PlainText).with_value("v"));
    harness
        .store
        .inject_faults(StoreOperation::GetParameter, InjectedFault::Throttle, 3);

    let remote = harness.gateway.fetch_by_name("/r/a", true).await.unwrap();

    assert_eq!(remote.value, "v");
    assert_eq!(harness.store.call_count(StoreOperation::GetParameter), 4);
    assert_eq!(
        harness.clock.sleeps(),
        vec![
            Duration::from_secs(5),
            Duration::from_millis(500),
            Duration::from_secs(5),
            Duration::from_secs(1),
            Duration::from_secs(5),
            Duration::from_secs(2),
        ]
    );
}

#[tokio::test]
async fn test_zero_deadline_makes_exactly_one_attempt() {
    let harness = TestHarness::with_timeouts(timeouts(Duration::ZERO));
    harness
        .store
        .inject_faults(StoreOperation::GetParameter, InjectedFault::Throttle, 10);

    let err = harness.gateway.fetch_by_name("/r/a", true).await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(harness.store.call_count(StoreOperation::GetParameter), 1);
    assert_eq!(harness.clock.sleep_count(), 0);
}

#[tokio::test]
async fn test_persistent_throttling_stops_at_deadline() {
    let harness = TestHarness::with_timeouts(timeouts(Duration::from_secs(12)));
    harness
        .store
        .inject_faults(StoreOperation::GetParameter, InjectedFault::Throttle, 100);

    let err = harness.gateway.fetch_by_name("/r/a", true).await.unwrap_err();

    match err {
        GatewayError::Retry(RetryError::DeadlineExceeded {
            attempts,
            last_error,
            ..
        }) => {
            assert_eq!(attempts, 3);
            assert_eq!(last_error.code(), Some("ThrottlingException"));
        }
        other => panic!("expected deadline exceeded, got {other:?}"),
    }
    assert_eq!(harness.store.call_count(StoreOperation::GetParameter), 3);
}

#[tokio::test]
async fn test_permanent_errors_are_not_retried() {
    let harness = TestHarness::new();
    harness.store.inject_fault(
        StoreOperation::PutParameter,
        InjectedFault::Fail(StoreError::api(
            "ParameterPatternMismatchException",
            "value does not match allowed pattern",
            ErrorFault::Client,
        )),
    );
    let record = ParameterRecord::new("/r/pattern", ValueKind::PlainText)
        .with_insecure_value("abc")
        .with_allowed_pattern("^[0-9]+$");

    let err = harness.gateway.upsert(&record, false).await.unwrap_err();

    assert!(!err.is_timeout());
    assert_eq!(
        err.store_error().and_then(StoreError::code),
        Some("ParameterPatternMismatchException")
    );
    assert_eq!(harness.store.call_count(StoreOperation::PutParameter), 1);
    assert_eq!(harness.clock.sleep_count(), 0);
}

#[tokio::test]
async fn test_delete_of_absent_parameter_succeeds_without_retry() {
    let harness = TestHarness::new();

    harness.gateway.delete("/r/never-existed").await.unwrap();

    assert_eq!(harness.store.call_count(StoreOperation::DeleteParameter), 1);
    assert_eq!(harness.clock.sleep_count(), 0);
}

#[tokio::test]
async fn test_local_quota_exhaustion_is_retried_until_deadline() {
    let store = InMemoryParameterStore::new();
    store.seed(ParameterRecord::new("/r/limited", ValueKind::PlainText).with_value("v"));
    let clock = ManualClock::new();
    let limited = RateLimitedStore::new(
        store.clone(),
        TokenBucket::with_refill_interval(1, Duration::from_secs(3600)),
    );
    let gateway = ParameterGateway::new(
        Arc::new(limited),
        RetryExecutor::new(BackoffConfig::default(), Arc::new(clock.clone())),
        ThrottleAwareClassifier::default(),
        timeouts(Duration::from_secs(30)),
    );

    gateway.fetch_by_name("/r/limited", true).await.unwrap();
    let err = gateway.fetch_by_name("/r/limited", true).await.unwrap_err();

    match err {
        GatewayError::Retry(RetryError::DeadlineExceeded {
            attempts,
            last_error,
            ..
        }) => {
            assert!(attempts > 1);
            assert!(matches!(last_error, StoreError::QuotaExceeded { .. }));
        }
        other => panic!("expected deadline exceeded, got {other:?}"),
    }
    // the bucket rejects before the inner store is reached
    assert_eq!(store.call_count(StoreOperation::GetParameter), 1);
    assert!(clock.sleeps_of(Duration::from_secs(5)) > 1);
}

#[tokio::test]
async fn test_cancellation_ends_retry_loop() {
    let store = InMemoryParameterStore::new();
    store.inject_faults(StoreOperation::GetParameter, InjectedFault::Throttle, 10);
    let clock = ManualClock::new();
    let flag = CancellationFlag::new();
    let gateway = ParameterGateway::new(
        Arc::new(store.clone()),
        RetryExecutor::new(BackoffConfig::default(), Arc::new(clock.clone()))
            .with_cancellation(flag.clone()),
        ThrottleAwareClassifier::default(),
        OperationTimeouts::default(),
    );
    flag.cancel();

    let err = gateway.fetch_by_name("/r/a", true).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Retry(RetryError::Cancelled { attempts: 1, .. })
    ));
    assert_eq!(store.call_count(StoreOperation::GetParameter), 1);
}
