//! End-to-end lifecycle scenarios against the in-memory store.

mod common;

use common::TestHarness;
use fastssm::gateway::{InMemoryParameterStore, InjectedFault, StoreError, StoreOperation};
use fastssm::lifecycle::resource::{DESCRIBE_WARNING_DETAIL, DESCRIBE_WARNING_SUMMARY};
use fastssm::lifecycle::Severity;
use fastssm::models::{DataType, ParameterRecord, ValueKind};
use std::time::Duration;

const THROTTLE_COOLDOWN: Duration = Duration::from_secs(5);

async fn create(harness: &TestHarness, plan: ParameterRecord) -> ParameterRecord {
    let response = harness.resource().create(plan).await;
    assert!(!response.has_error(), "create failed: {:?}", response.diagnostics);
    response.state.expect("created state")
}

#[tokio::test]
async fn test_create_plaintext_parameter() {
    let harness = TestHarness::new();
    let plan = ParameterRecord::new("/e2e/test/string", ValueKind::PlainText)
        .with_value("hello")
        .with_description("created by test");

    let state = create(&harness, plan).await;

    let puts = harness.store.put_requests();
    assert_eq!(puts.len(), 1);
    assert!(!puts[0].overwrite);
    assert_eq!(puts[0].value, "hello");

    assert_eq!(state.version, Some(1));
    assert_eq!(
        state.arn.as_deref(),
        Some(harness.store.arn_for("/e2e/test/string").as_str())
    );
    assert_eq!(state.insecure_value.as_deref(), Some("hello"));
    assert_eq!(state.value, None);
    assert_eq!(harness.store.call_count(StoreOperation::GetParameter), 1);
    assert_eq!(harness.store.call_count(StoreOperation::DescribeParameters), 0);
}

#[tokio::test]
async fn test_create_never_overwrites_existing_parameter() {
    let harness = TestHarness::new();
    harness.store.seed(
        ParameterRecord::new("/e2e/taken", ValueKind::PlainText).with_insecure_value("theirs"),
    );

    let response = harness
        .resource()
        .create(ParameterRecord::new("/e2e/taken", ValueKind::PlainText).with_insecure_value("ours"))
        .await;

    assert!(response.state.is_none());
    assert!(response.diagnostics.find("SSM parameter create error").is_some());
    assert_eq!(
        harness.store.snapshot("/e2e/taken").map(|remote| remote.value),
        Some("theirs".to_string())
    );
}

#[tokio::test]
async fn test_create_keeps_state_when_follow_up_fetch_fails() {
    let harness = TestHarness::new();
    harness.store.inject_fault(
        StoreOperation::GetParameter,
        InjectedFault::Fail(StoreError::transport("connection reset")),
    );

    let response = harness
        .resource()
        .create(ParameterRecord::new("/e2e/orphan", ValueKind::PlainText).with_value("v"))
        .await;

    let state = response.state.as_ref().expect("partial state");
    assert_eq!(state.version, Some(1));
    assert!(state.arn.is_none());
    assert!(response.diagnostics.find("parameter get failed").is_some());
    assert!(harness.store.contains("/e2e/orphan"));
}

#[tokio::test]
async fn test_read_unchanged_parameter_skips_enumeration() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/steady", ValueKind::PlainText).with_insecure_value("v"),
    )
    .await;
    harness.store.reset_call_counts();

    let response = harness.resource().read(&state).await;

    assert_eq!(response.state, Some(state));
    assert!(response.diagnostics.is_empty());
    assert_eq!(harness.store.call_count(StoreOperation::GetParameter), 1);
    assert_eq!(harness.store.call_count(StoreOperation::DescribeParameters), 0);
}

#[tokio::test]
async fn test_unexplained_version_bump_enumerates_once() {
    let harness = TestHarness::new();
    let mut state = create(
        &harness,
        ParameterRecord::new("/e2e/described", ValueKind::PlainText).with_insecure_value("same"),
    )
    .await;
    harness.store.simulate_description_change("/e2e/described", "first");
    harness.store.simulate_description_change("/e2e/described", "second");
    state = harness.resource().read(&state).await.state.unwrap();
    assert_eq!(state.version, Some(3));
    harness.store.reset_call_counts();

    // version 3 -> 4 with an identical value: only enumeration can explain it
    harness
        .store
        .simulate_description_change("/e2e/described", "changed in console");
    let response = harness.resource().read(&state).await;

    let refreshed = response.state.clone().unwrap();
    assert_eq!(refreshed.version, Some(4));
    assert_eq!(refreshed.description.as_deref(), Some("changed in console"));
    assert_eq!(harness.store.call_count(StoreOperation::DescribeParameters), 1);

    let warning = response.diagnostics.find(DESCRIBE_WARNING_SUMMARY).unwrap();
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.detail, DESCRIBE_WARNING_DETAIL);

    // nothing changed since, so no further enumeration
    let again = harness.resource().read(&refreshed).await;
    assert!(again.diagnostics.is_empty());
    assert_eq!(harness.store.call_count(StoreOperation::DescribeParameters), 1);
}

#[tokio::test]
async fn test_value_change_is_explained_without_enumeration() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/drift", ValueKind::PlainText).with_value("old"),
    )
    .await;
    harness.store.simulate_value_change("/e2e/drift", "new");
    harness.store.reset_call_counts();

    let response = harness.resource().read(&state).await;

    let refreshed = response.state.unwrap();
    assert_eq!(refreshed.version, Some(2));
    assert_eq!(refreshed.insecure_value.as_deref(), Some("new"));
    assert_eq!(refreshed.value, None);
    assert_eq!(harness.store.call_count(StoreOperation::DescribeParameters), 0);
    assert!(response.diagnostics.is_empty());
}

#[tokio::test]
async fn test_plaintext_state_round_trips_into_update_plan() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/roundtrip", ValueKind::PlainText).with_value("a"),
    )
    .await;
    assert!(state.value.is_none());
    assert_eq!(state.insecure_value.as_deref(), Some("a"));

    let read = harness.resource().read(&state).await;
    assert!(!read.has_error(), "{:?}", read.diagnostics);
    let read = read.state.unwrap();
    assert!(read.value.is_some() != read.insecure_value.is_some());

    let mut plan = read.clone();
    plan.insecure_value = Some("b".to_string());
    let updated = harness.resource().update(&read, plan).await;
    assert!(!updated.has_error(), "{:?}", updated.diagnostics);
    let updated = updated.state.unwrap();
    assert_eq!(updated.insecure_value.as_deref(), Some("b"));
    assert_eq!(updated.value, None);
    assert_eq!(updated.version, Some(2));

    let mut plan = updated.clone();
    plan.value = plan.insecure_value.take().map(|_| "c".to_string());
    let rewritten = harness.resource().update(&updated, plan).await;
    assert!(!rewritten.has_error(), "{:?}", rewritten.diagnostics);
    let rewritten = rewritten.state.unwrap();
    assert_eq!(rewritten.insecure_value.as_deref(), Some("c"));
    assert_eq!(rewritten.value, None);
    assert_eq!(harness.store.put_requests()[2].value, "c");
}

#[tokio::test]
async fn test_tags_and_overwrite_stay_local() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/tagged", ValueKind::PlainText)
            .with_insecure_value("v")
            .with_tag("owner", "payments")
            .with_overwrite(true),
    )
    .await;

    assert_eq!(state.tags.get("owner").map(String::as_str), Some("payments"));
    assert_eq!(state.overwrite, Some(true));
    assert!(!harness.store.put_requests()[0].overwrite);

    let read = harness.resource().read(&state).await.state.unwrap();
    assert_eq!(read.tags, state.tags);
    assert_eq!(read.overwrite, Some(true));
}

#[tokio::test]
async fn test_encrypted_parameter_never_populates_insecure_value() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/secret", ValueKind::Encrypted).with_value("s3cr3t"),
    )
    .await;
    assert!(state.insecure_value.is_none());
    assert_eq!(state.value.as_deref(), Some("s3cr3t"));

    let updated = harness
        .resource()
        .update(
            &state,
            ParameterRecord::new("/e2e/secret", ValueKind::Encrypted).with_value("rotated"),
        )
        .await;
    let updated = updated.state.unwrap();
    assert!(updated.insecure_value.is_none());
    assert_eq!(updated.version, Some(2));

    let read = harness.resource().read(&updated).await.state.unwrap();
    assert!(read.insecure_value.is_none());
    assert_eq!(read.value.as_deref(), Some("rotated"));
    assert!(!format!("{read:?}").contains("rotated"));
}

#[tokio::test]
async fn test_update_overwrites_and_refreshes_arn() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/updated", ValueKind::TextList).with_insecure_value("a,b"),
    )
    .await;

    let response = harness
        .resource()
        .update(
            &state,
            ParameterRecord::new("/e2e/updated", ValueKind::TextList)
                .with_insecure_value("a,b,c")
                .with_description("three items"),
        )
        .await;

    let updated = response.state.unwrap();
    assert_eq!(updated.version, Some(2));
    assert_eq!(updated.insecure_value.as_deref(), Some("a,b,c"));
    assert_eq!(updated.arn, state.arn);
    assert!(harness.store.put_requests()[1].overwrite);
    assert_eq!(
        harness.store.description_of("/e2e/updated").as_deref(),
        Some("three items")
    );
}

#[tokio::test]
async fn test_update_rejects_data_type_change() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/ami", ValueKind::PlainText).with_insecure_value("ami-123"),
    )
    .await;

    let response = harness
        .resource()
        .update(
            &state,
            ParameterRecord::new("/e2e/ami", ValueKind::PlainText)
                .with_insecure_value("ami-456")
                .with_data_type(DataType::AmiId),
        )
        .await;

    assert!(response.diagnostics.find("Resource replacement required").is_some());
    assert_eq!(response.state, Some(state));
    assert_eq!(harness.store.call_count(StoreOperation::PutParameter), 1);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/gone", ValueKind::PlainText).with_value("v"),
    )
    .await;

    let first = harness.resource().delete(&state).await;
    let second = harness.resource().delete(&state).await;

    assert!(first.is_empty());
    assert!(second.is_empty());
    assert!(!harness.store.contains("/e2e/gone"));
    assert_eq!(harness.store.call_count(StoreOperation::DeleteParameter), 2);
}

#[tokio::test]
async fn test_read_after_external_delete_drops_state() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/vanished", ValueKind::PlainText).with_value("v"),
    )
    .await;
    harness.store.simulate_external_delete("/e2e/vanished");

    let response = harness.resource().read(&state).await;

    assert!(response.state.is_none());
    assert!(!response.has_error());
    let warning = response.diagnostics.find("parameter not found").unwrap();
    assert_eq!(warning.severity, Severity::Warning);
}

#[tokio::test]
async fn test_read_enumeration_mismatch_keeps_prior_state() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/ambiguous", ValueKind::PlainText).with_insecure_value("v"),
    )
    .await;
    harness.store.simulate_description_change("/e2e/ambiguous", "edited");
    harness
        .store
        .inject_fault(StoreOperation::DescribeParameters, InjectedFault::EmptyResult);

    let response = harness.resource().read(&state).await;

    assert_eq!(response.state, Some(state));
    let error = response
        .diagnostics
        .find("Incorrect response for parameter metadata")
        .unwrap();
    assert_eq!(error.detail, "None or too many results found.");
}

#[tokio::test]
async fn test_read_enumeration_failure_keeps_prior_state() {
    let harness = TestHarness::new();
    let state = create(
        &harness,
        ParameterRecord::new("/e2e/describe-fails", ValueKind::PlainText).with_insecure_value("v"),
    )
    .await;
    harness
        .store
        .simulate_description_change("/e2e/describe-fails", "edited");
    harness.store.inject_fault(
        StoreOperation::DescribeParameters,
        InjectedFault::Fail(StoreError::api(
            "AccessDeniedException",
            "not authorized to perform ssm:DescribeParameters",
            fastssm::gateway::ErrorFault::Client,
        )),
    );

    let response = harness.resource().read(&state).await;

    assert_eq!(response.state, Some(state));
    assert!(response
        .diagnostics
        .find("Something went wrong while getting parameter metadata")
        .is_some());
}

#[tokio::test]
async fn test_import_then_read_fills_description() {
    let harness = TestHarness::new();
    harness.store.seed(
        ParameterRecord::new("/e2e/imported", ValueKind::PlainText)
            .with_insecure_value("existing")
            .with_description("made elsewhere"),
    );

    let imported = harness.resource().import("/e2e/imported").await.state.unwrap();
    assert!(imported.version.is_none());
    assert!(imported.description.is_none());
    assert_eq!(imported.insecure_value.as_deref(), Some("existing"));
    assert!(imported.value.is_none());

    let read = harness.resource().read(&imported).await;
    let state = read.state.unwrap();
    assert_eq!(state.version, Some(1));
    assert_eq!(state.description.as_deref(), Some("made elsewhere"));
    assert_eq!(harness.store.call_count(StoreOperation::DescribeParameters), 1);
}

#[tokio::test]
async fn test_import_of_missing_parameter_fails() {
    let harness = TestHarness::new();
    let response = harness.resource().import("/e2e/nowhere").await;

    assert!(response.state.is_none());
    assert!(response.diagnostics.find("parameter not found").is_some());
}

#[tokio::test]
async fn test_data_source_and_ephemeral_lookups() {
    let harness = TestHarness::new();
    let version = harness.store.seed(
        ParameterRecord::new("/e2e/lookup", ValueKind::Encrypted).with_value("plaintext-secret"),
    );

    let data = harness.data_source().read("/e2e/lookup", None).await;
    let record = data.state.unwrap();
    assert_eq!(record.value.as_deref(), Some("plaintext-secret"));
    assert!(record.insecure_value.is_none());
    assert_eq!(record.version, Some(version));

    let ephemeral = harness.ephemeral().open("/e2e/lookup", Some(false)).await;
    assert_eq!(
        ephemeral.state.unwrap().value,
        Some(InMemoryParameterStore::ciphertext_for("/e2e/lookup", version))
    );

    let missing = harness.data_source().read("/e2e/absent", None).await;
    assert!(missing.state.is_none());
    let error = missing.diagnostics.find("parameter not found").unwrap();
    assert_eq!(error.severity, Severity::Error);
}

#[tokio::test]
async fn test_throttled_create_cools_down_and_succeeds() {
    let harness = TestHarness::new();
    harness
        .store
        .inject_faults(StoreOperation::PutParameter, InjectedFault::Throttle, 2);
    harness
        .store
        .inject_fault(StoreOperation::GetParameter, InjectedFault::QuotaExceeded);

    let state = create(
        &harness,
        ParameterRecord::new("/e2e/busy", ValueKind::PlainText).with_value("v"),
    )
    .await;

    assert_eq!(state.version, Some(1));
    assert_eq!(harness.store.call_count(StoreOperation::PutParameter), 3);
    assert_eq!(harness.store.call_count(StoreOperation::GetParameter), 2);
    assert_eq!(harness.clock.sleeps_of(THROTTLE_COOLDOWN), 3);
}

#[tokio::test]
async fn test_concurrent_lifecycles_share_one_gateway() {
    let harness = TestHarness::new();
    let resource = harness.resource();

    let plans = (0..16).map(|i| {
        ParameterRecord::new(format!("/e2e/concurrent/{i}"), ValueKind::PlainText)
            .with_insecure_value(format!("value-{i}"))
    });
    let responses = futures::future::join_all(plans.map(|plan| resource.create(plan))).await;

    assert!(responses.iter().all(|response| !response.has_error()));
    assert_eq!(harness.store.len(), 16);
    assert_eq!(harness.store.call_count(StoreOperation::PutParameter), 16);
    assert_eq!(harness.store.call_count(StoreOperation::DescribeParameters), 0);
}
