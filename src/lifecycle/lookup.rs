//! Read-only surfaces over one generic lookup.
//!
//! The data source and the ephemeral resource are thin adapters around
//! [`read_parameter`]; neither keeps prior state, so no reconciliation runs.

use crate::gateway::{GatewayError, ParameterGateway};
use crate::lifecycle::diagnostics::{Diagnostic, LifecycleResponse};
use crate::models::ParameterRecord;
use crate::reconcile::value_routing;
use tracing::debug;

/// Decrypt unless told otherwise
pub const DEFAULT_WITH_DECRYPTION: bool = true;

/// Fetch `name` and build a fresh record from the remote fields
///
/// Exactly one value field is populated: `value` for encrypted parameters,
/// `insecure_value` otherwise.
pub async fn read_parameter(
    gateway: &ParameterGateway,
    name: &str,
    with_decryption: bool,
) -> Result<ParameterRecord, GatewayError> {
    let remote = gateway.fetch_by_name(name, with_decryption).await?;

    let mut record = ParameterRecord::new(remote.name.clone(), remote.value_kind)
        .with_data_type(remote.data_type);
    record.arn = Some(remote.arn.clone());
    record.version = Some(remote.version);
    value_routing::route_fetched(&remote).apply_to(&mut record);
    Ok(record)
}

pub(crate) fn lookup_failure(name: &str, error: &GatewayError) -> Diagnostic {
    if error.is_not_found() {
        Diagnostic::error(
            "parameter not found",
            format!("SSM Parameter {name:?} not found, removing from state"),
        )
    } else {
        Diagnostic::error(
            "Client Error",
            format!("Unable to read parameter, got error: {error}"),
        )
    }
}

async fn lookup(
    gateway: &ParameterGateway,
    surface: &str,
    name: &str,
    with_decryption: Option<bool>,
) -> LifecycleResponse {
    let with_decryption = with_decryption.unwrap_or(DEFAULT_WITH_DECRYPTION);
    debug!(parameter = %name, surface, with_decryption, "🔎 Looking up parameter");

    match read_parameter(gateway, name, with_decryption).await {
        Ok(record) => LifecycleResponse::with_state(record),
        Err(error) => {
            crate::logging::log_error(surface, &error.to_string(), Some(name));
            LifecycleResponse::failed(None, lookup_failure(name, &error))
        }
    }
}

/// Read-only data source
#[derive(Debug, Clone)]
pub struct ParameterDataSource {
    gateway: ParameterGateway,
}

impl ParameterDataSource {
    pub fn new(gateway: ParameterGateway) -> Self {
        Self { gateway }
    }

    pub async fn read(&self, name: &str, with_decryption: Option<bool>) -> LifecycleResponse {
        lookup(&self.gateway, "data_source", name, with_decryption).await
    }
}

/// Ephemeral resource; the result is never persisted by the host
#[derive(Debug, Clone)]
pub struct ParameterEphemeral {
    gateway: ParameterGateway,
}

impl ParameterEphemeral {
    pub fn new(gateway: ParameterGateway) -> Self {
        Self { gateway }
    }

    pub async fn open(&self, name: &str, with_decryption: Option<bool>) -> LifecycleResponse {
        lookup(&self.gateway, "ephemeral", name, with_decryption).await
    }
}
