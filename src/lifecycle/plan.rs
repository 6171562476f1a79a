//! Plan checks run before any remote call.
//!
//! [`normalize_plan`] is a pure `(plan) -> plan` step applied once after user
//! input is merged with prior state; [`validate_plan`] then reports every
//! violation as its own diagnostic.

use crate::constants::Attribute;
use crate::lifecycle::diagnostics::{Diagnostic, Diagnostics};
use crate::models::ParameterRecord;
use crate::validation::{
    validate_metadata_length, validate_parameter_name, validate_value_fields, ValidationError,
};

/// Strip fields only the remote store may assign
pub fn normalize_plan(mut plan: ParameterRecord) -> ParameterRecord {
    plan.arn = None;
    plan.version = None;
    plan
}

/// Every validation failure of `plan`
pub fn plan_violations(plan: &ParameterRecord) -> Vec<ValidationError> {
    [
        validate_parameter_name(&plan.name),
        validate_metadata_length(Attribute::Description, plan.description.as_deref()),
        validate_metadata_length(Attribute::AllowedPattern, plan.allowed_pattern.as_deref()),
        validate_value_fields(plan),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect()
}

/// Violations as error diagnostics
pub fn validate_plan(plan: &ParameterRecord) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(plan_violations(plan).into_iter().map(|violation| {
        Diagnostic::error(violation.summary(), violation.to_string()).at(violation.attribute())
    }));
    diagnostics
}

/// Immutable attributes that differ between `prior` and `planned`
pub fn replacement_fields(prior: &ParameterRecord, planned: &ParameterRecord) -> Vec<Attribute> {
    let mut fields = Vec::new();
    if prior.name != planned.name {
        fields.push(Attribute::Name);
    }
    if prior.value_kind != planned.value_kind {
        fields.push(Attribute::Type);
    }
    if prior.data_type != planned.data_type {
        fields.push(Attribute::DataType);
    }
    fields
}

/// True when the change cannot be applied in place
pub fn requires_replacement(prior: &ParameterRecord, planned: &ParameterRecord) -> bool {
    !replacement_fields(prior, planned).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DataType, ValueKind};

    #[test]
    fn test_normalize_clears_remote_fields() {
        let mut plan = ParameterRecord::new("/a", ValueKind::PlainText).with_value("x");
        plan.arn = Some("arn:aws:ssm:us-east-1:123456789012:parameter/a".to_string());
        plan.version = Some(9);

        let normalized = normalize_plan(plan.clone());
        assert_eq!(normalized.arn, None);
        assert_eq!(normalized.version, None);
        assert_eq!(normalized.value, plan.value);
    }

    #[test]
    fn test_each_violation_is_reported() {
        let plan = ParameterRecord::new("", ValueKind::Encrypted)
            .with_description("d".repeat(1025))
            .with_insecure_value("x");

        let diagnostics = validate_plan(&plan);
        assert_eq!(diagnostics.len(), 3);
        assert!(diagnostics.has_error());
    }

    #[test]
    fn test_valid_plan_has_no_diagnostics() {
        let plan = ParameterRecord::new("/e2e/test/string", ValueKind::PlainText)
            .with_value("test-value-123");
        assert!(validate_plan(&plan).is_empty());
    }

    #[test]
    fn test_immutable_fields_force_replacement() {
        let prior = ParameterRecord::new("/a", ValueKind::PlainText).with_value("x");
        let same = prior.clone().with_description("changed");
        assert!(!requires_replacement(&prior, &same));

        let mut retyped = prior.clone().with_data_type(DataType::AmiId);
        retyped.value_kind = ValueKind::Encrypted;
        assert_eq!(
            replacement_fields(&prior, &retyped),
            vec![Attribute::Type, Attribute::DataType]
        );
    }
}
