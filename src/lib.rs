#![allow(clippy::doc_markdown)] // Allow technical terms like DescribeParameters, SecureString in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # FastSSM Core
//!
//! Reconciliation core for a parameter store provider that keeps remote calls,
//! and the throttling they invite, to a minimum.
//!
//! ## Overview
//!
//! An orchestration host drives parameter lifecycles (create, read, update,
//! delete, import, state migration) through this crate. Each call fans out into
//! at most a handful of remote operations, all of which run under a bounded,
//! throttle-aware retry loop.
//!
//! ## Key Features
//!
//! - **Minimal enumeration**: the expensive `DescribeParameters` call is issued
//!   only when a version bump cannot be explained by directly fetchable fields
//! - **Throttle-aware retries**: exponential backoff plus a fixed cooldown whenever
//!   throttling or local quota exhaustion is detected, bounded by per-operation deadlines
//! - **Sensitive value routing**: encrypted values never leak into the plaintext mirror
//! - **Legacy migration**: one-shot adoption of legacy parameter state
//! - **Pluggable store**: in-memory store for tests, AWS SDK store behind the `aws` feature
//!
//! ## Module Organization
//!
//! - [`resilience`] - retry executor, failure classifier, clocks, local rate limiter
//! - [`gateway`] - the four remote calls behind one retry-governed contract
//! - [`reconcile`] - refresh decisions and value routing
//! - [`lifecycle`] - resource, data source and ephemeral entry points
//! - [`migration`] - legacy state adoption
//! - [`provider`] - configuration and the identity check
//! - [`config`] - layered configuration loading
//! - [`validation`] - plan and name validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fastssm::config::ProviderConfig;
//! use fastssm::gateway::InMemoryParameterStore;
//! use fastssm::models::{ParameterRecord, ValueKind};
//! use fastssm::provider::{CallerIdentity, FastSsmProvider, StaticIdentityVerifier};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = StaticIdentityVerifier::succeeding(CallerIdentity {
//!     user_id: Some("AIDAEXAMPLE".to_string()),
//!     ..CallerIdentity::default()
//! });
//! let handle = FastSsmProvider::configure(
//!     ProviderConfig::default(),
//!     &verifier,
//!     Arc::new(InMemoryParameterStore::new()),
//! )
//! .await?;
//!
//! let plan = ParameterRecord::new("/app/db/host", ValueKind::PlainText).with_value("db.internal");
//! let created = handle.resource().create(plan).await;
//! assert!(!created.has_error());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib              # Unit tests
//! cargo test                    # Unit and integration tests
//! cargo test --features aws     # Include the AWS backend
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod logging;
pub mod migration;
pub mod models;
pub mod provider;
pub mod reconcile;
pub mod resilience;
pub mod validation;

pub use config::{ConfigLoader, ConfigurationError, ProviderConfig};
pub use constants::Attribute;
pub use error::{FastSsmError, Result};
pub use gateway::{
    GatewayError, InMemoryParameterStore, ParameterGateway, ParameterStore, StoreError,
};
pub use lifecycle::{
    Diagnostic, Diagnostics, LifecycleResponse, ParameterDataSource, ParameterEphemeral,
    ParameterResource,
};
pub use migration::{LegacyStateMigrator, MigrationError, MoveStateRequest};
pub use models::{DataType, ParameterRecord, ValueKind};
pub use provider::{FastSsmProvider, ProviderError, ProviderHandle};
pub use reconcile::{MetadataDecision, ReconciliationEngine};
pub use resilience::{RetryError, RetryExecutor, ThrottleAwareClassifier};
