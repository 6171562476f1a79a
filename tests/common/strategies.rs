//! Proptest strategies for parameter records.

use fastssm::models::{ParameterRecord, ValueKind};
use proptest::prelude::*;

pub fn value_kind_strategy() -> impl Strategy<Value = ValueKind> {
    prop_oneof![
        Just(ValueKind::PlainText),
        Just(ValueKind::TextList),
        Just(ValueKind::Encrypted),
    ]
}

/// Rooted, path-style parameter names
pub fn parameter_name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9_.-]{1,12}", 1..5)
        .prop_map(|segments| format!("/{}", segments.join("/")))
}

pub fn parameter_value_strategy() -> impl Strategy<Value = String> {
    "[ -~]{1,64}"
}

/// A user plan with exactly one value field set, valid for its kind
pub fn plan_strategy() -> impl Strategy<Value = ParameterRecord> {
    (
        parameter_name_strategy(),
        value_kind_strategy(),
        parameter_value_strategy(),
        any::<bool>(),
    )
        .prop_map(|(name, kind, value, use_insecure)| {
            let record = ParameterRecord::new(name, kind);
            if use_insecure && !kind.is_encrypted() {
                record.with_insecure_value(value)
            } else {
                record.with_value(value)
            }
        })
}
