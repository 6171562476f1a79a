//! # Data Models
//!
//! - [`ParameterRecord`] - local state of a managed parameter
//! - [`RemoteParameter`] / [`ParameterMetadata`] - what the remote store returns
//! - [`LegacyRecord`] - the wider legacy schema, accepted only as migration input

pub mod legacy;
pub mod parameter;

pub use legacy::LegacyRecord;
pub use parameter::{DataType, ParameterMetadata, ParameterRecord, RemoteParameter, ValueKind};
