//! Shared fixtures for integration tests: an in-memory store and a virtual clock
//! wired into the gateway, so retries and cooldowns complete instantly.

#![allow(dead_code)]

pub mod strategies;

use fastssm::gateway::{InMemoryParameterStore, OperationTimeouts, ParameterGateway};
use fastssm::lifecycle::{ParameterDataSource, ParameterEphemeral, ParameterResource};
use fastssm::resilience::{BackoffConfig, ManualClock, RetryExecutor, ThrottleAwareClassifier};
use std::sync::Arc;

/// Store, clock and gateway sharing state with each other
pub struct TestHarness {
    pub store: InMemoryParameterStore,
    pub clock: ManualClock,
    pub gateway: ParameterGateway,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_timeouts(OperationTimeouts::default())
    }

    pub fn with_timeouts(timeouts: OperationTimeouts) -> Self {
        let store = InMemoryParameterStore::new();
        let clock = ManualClock::new();
        let gateway = ParameterGateway::new(
            Arc::new(store.clone()),
            RetryExecutor::new(BackoffConfig::default(), Arc::new(clock.clone())),
            ThrottleAwareClassifier::default(),
            timeouts,
        );
        Self {
            store,
            clock,
            gateway,
        }
    }

    pub fn resource(&self) -> ParameterResource {
        ParameterResource::new(self.gateway.clone())
    }

    pub fn data_source(&self) -> ParameterDataSource {
        ParameterDataSource::new(self.gateway.clone())
    }

    pub fn ephemeral(&self) -> ParameterEphemeral {
        ParameterEphemeral::new(self.gateway.clone())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
