//! # In-Memory Parameter Store
//!
//! Thread-safe in-memory [`ParameterStore`] for tests and local development.
//!
//! ## Features
//!
//! - **Remote-like semantics**: ARNs, versions starting at 1, `ParameterAlreadyExists`
//!   on a put without overwrite, `ParameterNotFound` on fetch or delete of an absent name
//! - **Encryption marker**: `SecureString` values come back as an opaque ciphertext
//!   unless decryption is requested
//! - **Fault injection**: queue failures per operation; each fault is consumed by one call
//! - **Call accounting**: per-operation counters and a log of every put request
//! - **External changes**: simulate edits made outside the provider (e.g. a console
//!   description change that bumps the version)

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use super::store::{
    ParameterFilter, ParameterStore, PutParameterInput, StoreError, StoreOperation,
};
use crate::constants::THROTTLING_ERROR_CODE;
use crate::gateway::ErrorFault;
use crate::models::{DataType, ParameterMetadata, ParameterRecord, RemoteParameter, ValueKind};
use crate::reconcile::value_routing;

/// Region used in ARNs when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Account id used in ARNs when none is configured
pub const DEFAULT_ACCOUNT_ID: &str = "123456789012";

/// A failure the next call of an operation will return instead of running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFault {
    /// Remote throttling error
    Throttle,
    /// Local quota exhaustion
    QuotaExceeded,
    /// Succeed without a payload: fetch returns nothing, enumeration matches nothing;
    /// writes ignore it
    EmptyResult,
    /// Return this error
    Fail(StoreError),
}

impl InjectedFault {
    fn into_error(self) -> Option<StoreError> {
        match self {
            InjectedFault::Throttle => Some(StoreError::api(
                THROTTLING_ERROR_CODE,
                "Rate exceeded",
                ErrorFault::Client,
            )),
            InjectedFault::QuotaExceeded => {
                Some(StoreError::quota_exceeded("injected quota exhaustion"))
            }
            InjectedFault::EmptyResult => None,
            InjectedFault::Fail(error) => Some(error),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredParameter {
    value: String,
    value_kind: ValueKind,
    data_type: DataType,
    allowed_pattern: Option<String>,
    description: Option<String>,
    version: i64,
    last_modified: DateTime<Utc>,
}

#[derive(Debug)]
struct StoreState {
    region: String,
    account_id: String,
    parameters: DashMap<String, StoredParameter>,
    faults: Mutex<HashMap<StoreOperation, VecDeque<InjectedFault>>>,
    calls: DashMap<StoreOperation, AtomicU64>,
    put_requests: Mutex<Vec<PutParameterInput>>,
}

/// In-memory parameter store; clones share the same data
#[derive(Debug, Clone)]
pub struct InMemoryParameterStore {
    state: Arc<StoreState>,
}

impl Default for InMemoryParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::with_identity(DEFAULT_REGION, DEFAULT_ACCOUNT_ID)
    }

    /// Store whose ARNs use the given region and account
    pub fn with_identity(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            state: Arc::new(StoreState {
                region: region.into(),
                account_id: account_id.into(),
                parameters: DashMap::new(),
                faults: Mutex::new(HashMap::new()),
                calls: DashMap::new(),
                put_requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// `arn:aws:ssm:<region>:<account>:parameter/<name without leading slash>`
    pub fn arn_for(&self, name: &str) -> String {
        format!(
            "arn:aws:ssm:{}:{}:parameter/{}",
            self.state.region,
            self.state.account_id,
            name.trim_start_matches('/')
        )
    }

    /// Opaque stand-in for KMS ciphertext
    pub fn ciphertext_for(name: &str, version: i64) -> String {
        format!("AQICAH-ciphertext:{}:v{}", name.trim_start_matches('/'), version)
    }

    /// Queue a fault for the next call of `operation`
    pub fn inject_fault(&self, operation: StoreOperation, fault: InjectedFault) {
        self.state
            .faults
            .lock()
            .entry(operation)
            .or_default()
            .push_back(fault);
    }

    /// Queue the same fault for the next `times` calls of `operation`
    pub fn inject_faults(&self, operation: StoreOperation, fault: InjectedFault, times: usize) {
        for _ in 0..times {
            self.inject_fault(operation, fault.clone());
        }
    }

    pub fn call_count(&self, operation: StoreOperation) -> u64 {
        self.state
            .calls
            .get(&operation)
            .map(|count| count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn reset_call_counts(&self) {
        self.state.calls.clear();
        self.state.put_requests.lock().clear();
    }

    /// Every put request received, in order
    pub fn put_requests(&self) -> Vec<PutParameterInput> {
        self.state.put_requests.lock().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.parameters.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.state.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.parameters.is_empty()
    }

    /// Current decrypted state of `name`, bypassing faults and counters
    pub fn snapshot(&self, name: &str) -> Option<RemoteParameter> {
        self.state
            .parameters
            .get(name)
            .map(|stored| self.to_remote(name, &stored, true))
    }

    pub fn description_of(&self, name: &str) -> Option<String> {
        self.state
            .parameters
            .get(name)
            .and_then(|stored| stored.description.clone())
    }

    /// Create a parameter directly, as if made outside the provider; returns its version
    pub fn seed(&self, record: ParameterRecord) -> i64 {
        let value = value_routing::operative_value(&record)
            .unwrap_or_default()
            .to_string();
        let mut entry = self
            .state
            .parameters
            .entry(record.name.clone())
            .or_insert_with(|| StoredParameter {
                value: value.clone(),
                value_kind: record.value_kind,
                data_type: record.data_type,
                allowed_pattern: None,
                description: None,
                version: 0,
                last_modified: Utc::now(),
            });
        entry.value = value;
        entry.value_kind = record.value_kind;
        entry.data_type = record.data_type;
        entry.allowed_pattern = record.allowed_pattern;
        entry.description = record.description;
        entry.version += 1;
        entry.last_modified = Utc::now();
        entry.version
    }

    /// Change only the description remotely; bumps the version
    pub fn simulate_description_change(&self, name: &str, description: &str) -> Option<i64> {
        self.simulate_change(name, |stored| {
            stored.description = Some(description.to_string());
        })
    }

    /// Change only the value remotely; bumps the version
    pub fn simulate_value_change(&self, name: &str, value: &str) -> Option<i64> {
        self.simulate_change(name, |stored| stored.value = value.to_string())
    }

    /// Delete remotely without going through the provider
    pub fn simulate_external_delete(&self, name: &str) -> bool {
        self.state.parameters.remove(name).is_some()
    }

    fn simulate_change(&self, name: &str, change: impl FnOnce(&mut StoredParameter)) -> Option<i64> {
        self.state.parameters.get_mut(name).map(|mut stored| {
            change(&mut stored);
            stored.version += 1;
            stored.last_modified = Utc::now();
            stored.version
        })
    }

    fn record_call(&self, operation: StoreOperation) {
        self.state
            .calls
            .entry(operation)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::SeqCst);
    }

    fn next_fault(&self, operation: StoreOperation) -> Option<InjectedFault> {
        self.state
            .faults
            .lock()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
    }

    fn to_remote(&self, name: &str, stored: &StoredParameter, with_decryption: bool) -> RemoteParameter {
        let value = if stored.value_kind.is_encrypted() && !with_decryption {
            Self::ciphertext_for(name, stored.version)
        } else {
            stored.value.clone()
        };
        RemoteParameter {
            name: name.to_string(),
            arn: self.arn_for(name),
            value_kind: stored.value_kind,
            version: stored.version,
            value,
            data_type: stored.data_type,
            last_modified: Some(stored.last_modified),
        }
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<RemoteParameter>, StoreError> {
        self.record_call(StoreOperation::GetParameter);
        if let Some(fault) = self.next_fault(StoreOperation::GetParameter) {
            return match fault.into_error() {
                Some(error) => Err(error),
                None => Ok(None),
            };
        }

        self.state
            .parameters
            .get(name)
            .map(|stored| Some(self.to_remote(name, &stored, with_decryption)))
            .ok_or_else(|| StoreError::parameter_not_found(name))
    }

    async fn put_parameter(&self, input: &PutParameterInput) -> Result<i64, StoreError> {
        self.record_call(StoreOperation::PutParameter);
        self.state.put_requests.lock().push(input.clone());
        if let Some(error) = self
            .next_fault(StoreOperation::PutParameter)
            .and_then(InjectedFault::into_error)
        {
            return Err(error);
        }

        let now = Utc::now();
        match self.state.parameters.entry(input.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if !input.overwrite {
                    return Err(StoreError::already_exists(&input.name));
                }
                let stored = occupied.get_mut();
                stored.value = input.value.clone();
                stored.value_kind = input.value_kind;
                stored.data_type = input.data_type;
                stored.allowed_pattern = input.allowed_pattern.clone();
                stored.description = input.description.clone();
                stored.version += 1;
                stored.last_modified = now;
                Ok(stored.version)
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(StoredParameter {
                    value: input.value.clone(),
                    value_kind: input.value_kind,
                    data_type: input.data_type,
                    allowed_pattern: input.allowed_pattern.clone(),
                    description: input.description.clone(),
                    version: 1,
                    last_modified: now,
                });
                Ok(1)
            }
        }
    }

    async fn describe_parameters(
        &self,
        filter: &ParameterFilter,
    ) -> Result<Vec<ParameterMetadata>, StoreError> {
        self.record_call(StoreOperation::DescribeParameters);
        match self.next_fault(StoreOperation::DescribeParameters) {
            Some(InjectedFault::EmptyResult) => return Ok(Vec::new()),
            Some(fault) => {
                if let Some(error) = fault.into_error() {
                    return Err(error);
                }
            }
            None => {}
        }

        let mut matches: Vec<ParameterMetadata> = self
            .state
            .parameters
            .iter()
            .filter(|entry| filter.matches(entry.key()))
            .map(|entry| ParameterMetadata {
                name: entry.key().clone(),
                value_kind: entry.value_kind,
                data_type: entry.data_type,
                version: entry.version,
                description: entry.description.clone(),
                allowed_pattern: entry.allowed_pattern.clone(),
                key_id: entry
                    .value_kind
                    .is_encrypted()
                    .then(|| "alias/aws/ssm".to_string()),
                tier: Some("Standard".to_string()),
                last_modified_user: Some(format!(
                    "arn:aws:iam::{}:user/in-memory",
                    self.state.account_id
                )),
                last_modified: Some(entry.last_modified),
            })
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    async fn delete_parameter(&self, name: &str) -> Result<(), StoreError> {
        self.record_call(StoreOperation::DeleteParameter);
        if let Some(error) = self
            .next_fault(StoreOperation::DeleteParameter)
            .and_then(InjectedFault::into_error)
        {
            return Err(error);
        }

        self.state
            .parameters
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::parameter_not_found(name))
    }
}
