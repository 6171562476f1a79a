//! # Reconciliation Engine
//!
//! Refreshes a previously observed [`ParameterRecord`] from the remote store
//! while issuing the expensive enumeration call only when it is the sole way
//! to explain a change.
//!
//! ## Decision
//!
//! ```text
//! remote.version == local.version  ──▶ Unchanged (no enumeration)
//!            │ differs
//!            ▼
//! name/type/data_type/value differ ──▶ ExplainedByVisibleDiff (no enumeration)
//!            │ all equal
//!            ▼
//!   EnumerationRequired (one DescribeParameters call, refresh description)
//! ```
//!
//! The fetch itself is never skipped; only enumeration is conditional.

pub mod value_routing;

use crate::constants::Attribute;
use crate::gateway::{GatewayError, ParameterGateway};
use crate::models::{ParameterMetadata, ParameterRecord, RemoteParameter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of comparing a fetch against the prior record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum MetadataDecision {
    /// Same version as last observed
    Unchanged,
    /// Version moved and a directly-fetched field changed with it
    ExplainedByVisibleDiff { changed_fields: Vec<Attribute> },
    /// Version moved but nothing visible did; metadata must be enumerated
    EnumerationRequired,
}

impl MetadataDecision {
    pub fn requires_enumeration(&self) -> bool {
        matches!(self, MetadataDecision::EnumerationRequired)
    }
}

/// Pure decision whether `remote` warrants an enumeration call
pub fn decide_metadata_refresh(prior: &ParameterRecord, remote: &RemoteParameter) -> MetadataDecision {
    if prior.version == Some(remote.version) {
        return MetadataDecision::Unchanged;
    }

    let changed_fields = remote.changed_fields(prior);
    if changed_fields.is_empty() {
        MetadataDecision::EnumerationRequired
    } else {
        MetadataDecision::ExplainedByVisibleDiff { changed_fields }
    }
}

/// Fold fetched fields (and enumerated metadata, when present) into a new record
pub fn merge_remote(
    prior: &ParameterRecord,
    remote: &RemoteParameter,
    metadata: Option<&ParameterMetadata>,
) -> ParameterRecord {
    let mut record = prior.clone();
    record.name = remote.name.clone();
    record.arn = Some(remote.arn.clone());
    record.value_kind = remote.value_kind;
    record.data_type = remote.data_type;
    record.version = Some(remote.version);
    value_routing::route_fetched(remote).apply_to(&mut record);

    if let Some(metadata) = metadata {
        record.description = Some(metadata.description.clone().unwrap_or_default());
    }
    record
}

/// A refreshed record and how it was obtained
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub record: ParameterRecord,
    pub decision: MetadataDecision,
    /// True when the enumeration call was issued
    pub enumerated: bool,
}

/// Drives fetch, decision, optional enumeration and merge for one read
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    gateway: ParameterGateway,
}

impl ReconciliationEngine {
    pub fn new(gateway: ParameterGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ParameterGateway {
        &self.gateway
    }

    /// Fetch `prior.name` (decrypted) and reconcile it against `prior`
    pub async fn refresh(&self, prior: &ParameterRecord) -> Result<Reconciled, GatewayError> {
        let remote = self.gateway.fetch_by_name(&prior.name, true).await?;
        let decision = decide_metadata_refresh(prior, &remote);

        let metadata = match &decision {
            MetadataDecision::Unchanged => {
                debug!(parameter = %prior.name, version = remote.version, "🔍 No remote change");
                None
            }
            MetadataDecision::ExplainedByVisibleDiff { changed_fields } => {
                debug!(
                    parameter = %prior.name,
                    previous_version = ?prior.version,
                    version = remote.version,
                    changed = ?changed_fields,
                    "🔍 Version change explained by fetched fields"
                );
                None
            }
            MetadataDecision::EnumerationRequired => {
                info!(
                    parameter = %prior.name,
                    previous_version = ?prior.version,
                    version = remote.version,
                    "🔍 Unexplained version change, enumerating metadata"
                );
                Some(self.gateway.enumerate_by_name_filter(&prior.name).await?)
            }
        };

        Ok(Reconciled {
            record: merge_remote(prior, &remote, metadata.as_ref()),
            enumerated: metadata.is_some(),
            decision,
        })
    }
}
