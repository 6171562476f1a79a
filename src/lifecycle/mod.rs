//! # Lifecycle Surfaces
//!
//! Entry points the orchestration host drives:
//!
//! - [`ParameterResource`] - create, read, update, delete, import, move_state
//! - [`ParameterDataSource`] / [`ParameterEphemeral`] - read-only lookups sharing
//!   [`read_parameter`]
//! - [`plan`] - pure plan normalization, validation and replacement checks

pub mod diagnostics;
pub mod lookup;
pub mod plan;
pub mod resource;

pub use diagnostics::{Diagnostic, Diagnostics, LifecycleResponse, Severity};
pub use lookup::{read_parameter, ParameterDataSource, ParameterEphemeral, DEFAULT_WITH_DECRYPTION};
pub use plan::{normalize_plan, requires_replacement, validate_plan};
pub use resource::ParameterResource;
