//! # Parameter Resource
//!
//! Lifecycle entry points for a managed parameter. Every call returns the new
//! state plus diagnostics; a `None` state tells the host the resource no longer
//! exists.
//!
//! | Call        | Remote calls                                              |
//! |-------------|-----------------------------------------------------------|
//! | create      | put (overwrite=false), then fetch for the ARN             |
//! | read        | fetch, plus one enumeration for unexplained version bumps |
//! | update      | put (overwrite=true), then fetch for the ARN              |
//! | delete      | delete (already-absent counts as success)                 |
//! | import      | fetch                                                     |
//! | move_state  | none                                                      |

use crate::gateway::{GatewayError, ParameterGateway, StoreOperation};
use crate::lifecycle::diagnostics::{Diagnostic, Diagnostics, LifecycleResponse};
use crate::lifecycle::lookup::{lookup_failure, read_parameter};
use crate::lifecycle::plan::{normalize_plan, replacement_fields, validate_plan};
use crate::logging::{log_error, log_parameter_operation};
use crate::migration::{LegacyStateMigrator, MoveStateRequest};
use crate::models::ParameterRecord;
use crate::reconcile::{value_routing, ReconciliationEngine};
use crate::validation::validate_parameter_name;
use tracing::{info, warn};

pub const DESCRIBE_WARNING_SUMMARY: &str = "Running DescribeParameter call";
pub const DESCRIBE_WARNING_DETAIL: &str = "We will now do a describe call because we don't know what changed (most likely metadata). This is an expensive operation!";

/// Managed parameter resource
#[derive(Debug, Clone)]
pub struct ParameterResource {
    engine: ReconciliationEngine,
    migrator: LegacyStateMigrator,
}

impl ParameterResource {
    pub fn new(gateway: ParameterGateway) -> Self {
        Self {
            engine: ReconciliationEngine::new(gateway),
            migrator: LegacyStateMigrator::new(),
        }
    }

    fn gateway(&self) -> &ParameterGateway {
        self.engine.gateway()
    }

    pub async fn create(&self, plan: ParameterRecord) -> LifecycleResponse {
        let mut record = normalize_plan(plan);
        let diagnostics = validate_plan(&record);
        if diagnostics.has_error() {
            return LifecycleResponse {
                state: None,
                diagnostics,
            };
        }

        let version = match self.gateway().upsert(&record, false).await {
            Ok(version) => version,
            Err(error) => {
                log_error("create", &error.to_string(), Some(&record.name));
                return LifecycleResponse::failed(
                    None,
                    Diagnostic::error(
                        "SSM parameter create error",
                        format!("creating SSM Parameter ({:?}): {error}", record.name),
                    ),
                );
            }
        };
        record.version = Some(version);
        value_routing::route_written(&mut record);

        match self.gateway().fetch_by_name(&record.name, true).await {
            Ok(remote) => record.arn = Some(remote.arn),
            Err(error) => {
                // The parameter exists remotely; keep it in state so it is not orphaned
                log_error("create", &error.to_string(), Some(&record.name));
                return LifecycleResponse::failed(
                    Some(record),
                    Diagnostic::error(
                        "parameter get failed",
                        "Couldn't get the SSM parameter data after creation",
                    ),
                );
            }
        }

        log_parameter_operation("create", &record.name, "created", record.version, None);
        LifecycleResponse::with_state(record)
    }

    pub async fn read(&self, state: &ParameterRecord) -> LifecycleResponse {
        match self.engine.refresh(state).await {
            Ok(reconciled) => {
                let mut diagnostics = Diagnostics::new();
                if reconciled.enumerated {
                    diagnostics.add_warning(DESCRIBE_WARNING_SUMMARY, DESCRIBE_WARNING_DETAIL);
                }
                log_parameter_operation(
                    "read",
                    &reconciled.record.name,
                    "refreshed",
                    reconciled.record.version,
                    reconciled.enumerated.then_some("metadata enumerated"),
                );
                LifecycleResponse {
                    state: Some(reconciled.record),
                    diagnostics,
                }
            }
            Err(error) if error.is_not_found() => {
                warn!(parameter = %state.name, "🗑️ Parameter not found remotely, removing from state");
                LifecycleResponse::failed(
                    None,
                    Diagnostic::warning(
                        "parameter not found",
                        format!("SSM Parameter {:?} not found, removing from state", state.name),
                    ),
                )
            }
            Err(error) => {
                log_error("read", &error.to_string(), Some(&state.name));
                LifecycleResponse::failed(Some(state.clone()), read_failure(&error))
            }
        }
    }

    /// Apply `plan` over `prior`; immutable attribute changes must go through replacement
    pub async fn update(&self, prior: &ParameterRecord, plan: ParameterRecord) -> LifecycleResponse {
        let mut record = normalize_plan(plan);
        let mut diagnostics = validate_plan(&record);
        let immutable = replacement_fields(prior, &record);
        if !immutable.is_empty() {
            diagnostics.add_error(
                "Resource replacement required",
                format!("attributes {immutable:?} cannot be changed in place"),
            );
        }
        if diagnostics.has_error() {
            return LifecycleResponse {
                state: Some(prior.clone()),
                diagnostics,
            };
        }

        let version = match self.gateway().upsert(&record, true).await {
            Ok(version) => version,
            Err(error) => {
                log_error("update", &error.to_string(), Some(&record.name));
                return LifecycleResponse::failed(
                    Some(prior.clone()),
                    Diagnostic::error(
                        "SSM parameter update error",
                        format!("updating SSM Parameter ({:?}): {error}", record.name),
                    ),
                );
            }
        };
        record.version = Some(version);
        record.arn = prior.arn.clone();
        value_routing::route_written(&mut record);

        match self.gateway().fetch_by_name(&record.name, true).await {
            Ok(remote) => record.arn = Some(remote.arn),
            Err(error) => {
                log_error("update", &error.to_string(), Some(&record.name));
                return LifecycleResponse::failed(
                    Some(record),
                    Diagnostic::error(
                        "parameter get failed",
                        "Couldn't get the SSM parameter data after update",
                    ),
                );
            }
        }

        log_parameter_operation("update", &record.name, "updated", record.version, None);
        LifecycleResponse::with_state(record)
    }

    pub async fn delete(&self, state: &ParameterRecord) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        match self.gateway().delete(&state.name).await {
            Ok(()) => log_parameter_operation("delete", &state.name, "deleted", state.version, None),
            Err(error) => {
                log_error("delete", &error.to_string(), Some(&state.name));
                diagnostics.add_error(
                    "Client Error",
                    format!("Unable to delete ssm parameter, got error: {error}"),
                );
            }
        }
        diagnostics
    }

    /// Adopt an existing remote parameter by name
    ///
    /// The version is left unset so the first read reconciles metadata such as
    /// the description.
    pub async fn import(&self, id: &str) -> LifecycleResponse {
        if let Err(violation) = validate_parameter_name(id) {
            return LifecycleResponse::failed(
                None,
                Diagnostic::error(violation.summary(), violation.to_string())
                    .at(violation.attribute()),
            );
        }

        match read_parameter(self.gateway(), id, true).await {
            Ok(mut record) => {
                record.version = None;
                info!(parameter = %id, "📥 Imported parameter");
                LifecycleResponse::with_state(record)
            }
            Err(error) => {
                log_error("import", &error.to_string(), Some(id));
                LifecycleResponse::failed(None, lookup_failure(id, &error))
            }
        }
    }

    /// One-shot adoption of legacy state; no remote calls
    pub fn move_state(&self, request: &MoveStateRequest) -> LifecycleResponse {
        match self.migrator.migrate(request) {
            Ok(record) => LifecycleResponse::with_state(record),
            Err(error) => {
                log_error("move_state", &error.to_string(), None);
                LifecycleResponse::failed(None, Diagnostic::error(error.summary(), error.detail()))
            }
        }
    }
}

fn read_failure(error: &GatewayError) -> Diagnostic {
    match error {
        GatewayError::IncorrectMetadataResponse { .. } => Diagnostic::error(
            "Incorrect response for parameter metadata",
            "None or too many results found.",
        ),
        GatewayError::Retry(retry)
            if retry.operation() == StoreOperation::DescribeParameters.as_str() =>
        {
            Diagnostic::error(
                "Something went wrong while getting parameter metadata",
                error.to_string(),
            )
        }
        _ => Diagnostic::error(
            "Client Error",
            format!("Unable to read parameter, got error: {error}"),
        ),
    }
}
